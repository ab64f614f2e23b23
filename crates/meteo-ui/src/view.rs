//! Pure view builder: turns a `UiState` into the tree the renderer draws.
//!
//! All "missing value -> placeholder" substitution happens here.

use chrono::TimeZone;
use meteo_weather::{location, CurrentConditions, ForecastEntry};

use crate::models::weather_model::UiState;

/// Forecast slots shown (3-hour steps, about 24 hours).
pub const FORECAST_SLOTS: usize = 8;

pub const PLACEHOLDER: &str = "N/A";
pub const DESCRIPTION_PLACEHOLDER: &str = "Information non disponible";

pub const TITLE: &str = "Météo Béni Mellal-Khénifra";

pub const ABOUT_TITLE: &str = "À propos";
pub const ABOUT_TEXT: &str = "Notre mission est de fournir des informations météorologiques précises et à jour pour la région de Béni Mellal-Khénifra. Nous nous engageons à aider les habitants et les visiteurs à planifier leurs activités en fonction des conditions météorologiques locales.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub label: &'static str,
    pub url: &'static str,
}

pub const FOOTER_LINKS: [Link; 2] = [
    Link {
        label: "Météo Maroc",
        url: "https://www.marocmeteo.ma",
    },
    Link {
        label: "Protection Civile",
        url: "http://www.protection-civile.gov.ma",
    },
];
pub const CONTACT_LINES: [&str; 2] = [
    "Email: contact@meteo-benimellal.ma",
    "Tél: +212 5XX XX XX XX",
];
pub const DISCLAIMER: &str = "Les données météorologiques sont fournies à titre indicatif. Consultez les autorités locales pour les alertes officielles.";
pub const COPYRIGHT: &str = "© 2024 Météo Béni Mellal-Khénifra. Tous droits réservés.";

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Spinner only
    Loading { frame: usize },
    /// Navigation stays usable above the error panel
    Error { nav: NavBar, message: &'static str },
    Dashboard(Dashboard),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavBar {
    pub title: &'static str,
    pub locations: Vec<&'static str>,
    pub selected: usize,
    pub dark_mode: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPanel {
    pub temperature: String,
    pub description: String,
    pub wind: String,
    pub humidity: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastCard {
    pub time: String,
    pub temperature: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub nav: NavBar,
    pub current: CurrentPanel,
    pub forecast: Vec<ForecastCard>,
}

pub fn build<Tz: TimeZone>(state: &UiState, tz: &Tz) -> View
where
    Tz::Offset: std::fmt::Display,
{
    if state.is_loading {
        return View::Loading {
            frame: state.spinner_frame,
        };
    }

    let nav = nav_bar(state);

    if let Some(message) = state.error_message {
        return View::Error { nav, message };
    }

    View::Dashboard(Dashboard {
        nav,
        current: current_panel(state.snapshot.as_ref()),
        forecast: state
            .forecast
            .as_deref()
            .unwrap_or_default()
            .iter()
            .take(FORECAST_SLOTS)
            .map(|entry| forecast_card(entry, tz))
            .collect(),
    })
}

fn nav_bar(state: &UiState) -> NavBar {
    NavBar {
        title: TITLE,
        locations: location::all().iter().map(|l| l.name).collect(),
        selected: location::index_of(&state.selected).unwrap_or(0),
        dark_mode: state.dark_mode,
    }
}

fn current_panel(snapshot: Option<&CurrentConditions>) -> CurrentPanel {
    CurrentPanel {
        temperature: format_temperature(snapshot.and_then(CurrentConditions::temperature)),
        description: snapshot
            .and_then(CurrentConditions::description)
            .unwrap_or(DESCRIPTION_PLACEHOLDER)
            .to_string(),
        wind: format!(
            "Vent: {}",
            format_wind(snapshot.and_then(CurrentConditions::wind_speed))
        ),
        humidity: format!(
            "Humidité: {}",
            format_humidity(snapshot.and_then(CurrentConditions::humidity))
        ),
    }
}

fn forecast_card<Tz: TimeZone>(entry: &ForecastEntry, tz: &Tz) -> ForecastCard
where
    Tz::Offset: std::fmt::Display,
{
    ForecastCard {
        time: entry
            .timestamp()
            .map(|t| t.with_timezone(tz).format("%H:%M").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        temperature: format_temperature(entry.temperature()),
        description: entry.description().unwrap_or(PLACEHOLDER).to_string(),
    }
}

/// Whole degrees, halves rounded up: `21.6` -> `22°C`, `-2.5` -> `-2°C`.
pub fn format_temperature(celsius: Option<f64>) -> String {
    match celsius.filter(|c| c.is_finite()) {
        Some(c) => format!("{}°C", round_half_up(c)),
        None => PLACEHOLDER.to_string(),
    }
}

/// Provider reports m/s; shown as km/h with one decimal.
pub fn format_wind(meters_per_second: Option<f64>) -> String {
    match meters_per_second.filter(|s| s.is_finite()) {
        Some(s) => format!("{:.1} km/h", s * 3.6),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_humidity(percent: Option<f64>) -> String {
    match percent.filter(|p| p.is_finite()) {
        Some(p) => format!("{}%", round_half_up(p)),
        None => PLACEHOLDER.to_string(),
    }
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
