//! OpenWeatherMap client: one fetch cycle is a current-conditions GET and a
//! forecast GET issued together, settled together and classified into the
//! `WeatherError` taxonomy.

use crate::types::{
    parse_payload, CurrentConditions, ForecastResponse, Location, WeatherBundle, WeatherError,
};
use chrono::Utc;
use meteo_core::{ReqwestErrorExt, WeatherConfig};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const USER_AGENT: &str = concat!("meteo/", env!("CARGO_PKG_VERSION"));

/// The dashboard always renders °C, km/h and French descriptions.
const UNITS: &str = "metric";
const LANGUAGE: &str = "fr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

/// A response that made it back, with its body already read.
#[derive(Debug)]
struct Reply {
    status: StatusCode,
    body: String,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

impl WeatherProvider {
    /// Build a provider from config. A missing key is allowed; the provider
    /// will then answer 401 and the cycle ends as `InvalidCredential`.
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| e.into_weather_error())?;

        Ok(Self {
            client: Arc::new(client),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.resolved_api_key().unwrap_or_default(),
        })
    }

    /// Run one fetch cycle for `location`.
    #[instrument(skip(self, location), fields(location = location.name), level = "info")]
    pub async fn fetch(&self, location: &Location) -> Result<WeatherBundle, WeatherError> {
        let (current, forecast) = tokio::join!(
            self.get(Endpoint::Current, location),
            self.get(Endpoint::Forecast, location),
        );

        let (current, forecast) = settle(current, forecast)?;

        let current: CurrentConditions = parse_payload(&current.body)?;
        let forecast: ForecastResponse = parse_payload(&forecast.body)?;

        tracing::info!(
            forecast_entries = forecast.entries().len(),
            "Weather data fetched"
        );

        Ok(WeatherBundle {
            location: *location,
            current,
            forecast,
            fetched_at: Utc::now(),
        })
    }

    async fn get(&self, endpoint: Endpoint, location: &Location) -> Result<Reply, reqwest::Error> {
        let url = format!("{}/{}", self.base_url, endpoint.path());

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("units", UNITS.to_string()),
                ("appid", self.api_key.clone()),
                ("lang", LANGUAGE.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(?endpoint, status = status.as_u16(), body = %body, "Provider returned an error");
        }

        Ok(Reply { status, body })
    }
}

/// Apply the failure precedence to two settled requests.
///
/// Status rules are checked over whichever responses arrived; transport
/// failures only win once no status rule matched.
fn settle(
    current: Result<Reply, reqwest::Error>,
    forecast: Result<Reply, reqwest::Error>,
) -> Result<(Reply, Reply), WeatherError> {
    let status_of = |r: &Result<Reply, reqwest::Error>| r.as_ref().ok().map(|reply| reply.status);
    classify_statuses(status_of(&current), status_of(&forecast))?;

    match (current, forecast) {
        (Ok(current), Ok(forecast)) => Ok((current, forecast)),
        (Err(e), _) | (_, Err(e)) => {
            // The request URL carries the API key.
            let e = e.without_url();
            tracing::error!("Weather request failed: {}", e);
            Err(e.into_weather_error())
        }
    }
}

/// Map the statuses of a cycle's responses (`None` = no response) to the
/// first matching failure kind.
pub fn classify_statuses(
    current: Option<StatusCode>,
    forecast: Option<StatusCode>,
) -> Result<(), WeatherError> {
    let statuses = [current, forecast];
    let any = |pred: &dyn Fn(StatusCode) -> bool| statuses.iter().flatten().any(|s| pred(*s));

    if any(&|s| s == StatusCode::UNAUTHORIZED) {
        return Err(WeatherError::InvalidCredential);
    }
    if any(&|s| s == StatusCode::NOT_FOUND) {
        return Err(WeatherError::LocationNotFound);
    }
    if let Some(status) = statuses.iter().flatten().find(|s| !s.is_success()) {
        return Err(WeatherError::ProviderError {
            status: status.as_u16(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK: Option<StatusCode> = Some(StatusCode::OK);
    const UNAUTHORIZED: Option<StatusCode> = Some(StatusCode::UNAUTHORIZED);
    const NOT_FOUND: Option<StatusCode> = Some(StatusCode::NOT_FOUND);
    const SERVER_ERROR: Option<StatusCode> = Some(StatusCode::INTERNAL_SERVER_ERROR);

    #[test]
    fn test_both_ok() {
        assert_eq!(classify_statuses(OK, OK), Ok(()));
    }

    #[test]
    fn test_unauthorized_wins_regardless_of_other_status() {
        for other in [OK, NOT_FOUND, SERVER_ERROR, None] {
            assert_eq!(
                classify_statuses(UNAUTHORIZED, other),
                Err(WeatherError::InvalidCredential)
            );
            assert_eq!(
                classify_statuses(other, UNAUTHORIZED),
                Err(WeatherError::InvalidCredential)
            );
        }
    }

    #[test]
    fn test_not_found_beats_other_failures() {
        assert_eq!(
            classify_statuses(SERVER_ERROR, NOT_FOUND),
            Err(WeatherError::LocationNotFound)
        );
        assert_eq!(
            classify_statuses(NOT_FOUND, OK),
            Err(WeatherError::LocationNotFound)
        );
    }

    #[test]
    fn test_other_non_success_is_provider_error() {
        assert_eq!(
            classify_statuses(OK, Some(StatusCode::TOO_MANY_REQUESTS)),
            Err(WeatherError::ProviderError { status: 429 })
        );
        assert_eq!(
            classify_statuses(SERVER_ERROR, OK),
            Err(WeatherError::ProviderError { status: 500 })
        );
    }

    #[test]
    fn test_missing_responses_pass_status_rules() {
        assert_eq!(classify_statuses(None, None), Ok(()));
        assert_eq!(classify_statuses(OK, None), Ok(()));
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Current.path(), "weather");
        assert_eq!(Endpoint::Forecast.path(), "forecast");
    }
}
