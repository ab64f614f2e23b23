use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

pub use meteo_core::WeatherError;

/// Named point queried for weather data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// Treat a field of the wrong JSON type as absent instead of failing the
/// whole payload.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like `lenient`, but per element: entries that are not objects become
/// empty entries so the list keeps its order and length.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Option<Vec<ForecastEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(None);
    };

    Ok(Some(
        items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
    ))
}

/// `main` block shared by current and forecast payloads
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MainReadings {
    #[serde(default, deserialize_with = "lenient")]
    pub temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub humidity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Wind {
    /// m/s with metric units
    #[serde(default, deserialize_with = "lenient")]
    pub speed: Option<f64>,
}

/// One entry of the provider's `weather` array
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Condition {
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
}

fn first_description(conditions: Option<&Vec<Condition>>) -> Option<&str> {
    conditions?.first()?.description.as_deref()
}

/// Current-conditions payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CurrentConditions {
    #[serde(default, deserialize_with = "lenient")]
    pub main: Option<MainReadings>,
    #[serde(default, deserialize_with = "lenient")]
    pub wind: Option<Wind>,
    #[serde(default, deserialize_with = "lenient")]
    pub weather: Option<Vec<Condition>>,
}

impl CurrentConditions {
    /// °C
    pub fn temperature(&self) -> Option<f64> {
        self.main.as_ref()?.temp
    }

    /// Percent
    pub fn humidity(&self) -> Option<f64> {
        self.main.as_ref()?.humidity
    }

    /// m/s
    pub fn wind_speed(&self) -> Option<f64> {
        self.wind.as_ref()?.speed
    }

    pub fn description(&self) -> Option<&str> {
        first_description(self.weather.as_ref())
    }
}

/// One 3-hour forecast slot
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastEntry {
    /// Seconds since the Unix epoch
    #[serde(default, deserialize_with = "lenient")]
    pub dt: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub main: Option<MainReadings>,
    #[serde(default, deserialize_with = "lenient")]
    pub weather: Option<Vec<Condition>>,
}

impl ForecastEntry {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.dt?, 0)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.main.as_ref()?.temp
    }

    pub fn description(&self) -> Option<&str> {
        first_description(self.weather.as_ref())
    }
}

/// Forecast payload: ordered 3-hour slots
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ForecastResponse {
    #[serde(default, deserialize_with = "lenient_entries")]
    pub list: Option<Vec<ForecastEntry>>,
}

impl ForecastResponse {
    pub fn entries(&self) -> &[ForecastEntry] {
        self.list.as_deref().unwrap_or_default()
    }
}

/// Result of one successful fetch cycle
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherBundle {
    pub location: Location,
    pub current: CurrentConditions,
    pub forecast: ForecastResponse,
    pub fetched_at: DateTime<Utc>,
}

/// Parse a response body, rejecting anything but a non-empty JSON object.
pub fn parse_payload<T: DeserializeOwned>(body: &str) -> Result<T, WeatherError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| WeatherError::InvalidPayload(format!("not JSON: {}", e)))?;

    match value {
        serde_json::Value::Object(map) if !map.is_empty() => {
            serde_json::from_value(serde_json::Value::Object(map))
                .map_err(|e| WeatherError::InvalidPayload(e.to_string()))
        }
        serde_json::Value::Object(_) => {
            Err(WeatherError::InvalidPayload("empty object".to_string()))
        }
        other => Err(WeatherError::InvalidPayload(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
