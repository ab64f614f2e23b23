//! Centralized error types for the Meteo application.
//!
//! Every error carries a fixed, localized `user_message()` for the UI, while
//! the `Display` impl keeps the technical detail for the logs.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Preference store error: {0}")]
    Preference(#[from] PreferenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Weather(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Preference(e) => e.user_message(),
            AppError::Io(_) => "Une opération sur un fichier a échoué. Veuillez réessayer.",
            AppError::Other(_) => {
                "Une erreur inattendue est survenue. Veuillez réessayer plus tard."
            }
        }
    }
}

/// Outcome of a failed fetch cycle.
///
/// Variants are listed in classification precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("Invalid API key (HTTP 401)")]
    InvalidCredential,

    #[error("Location not found (HTTP 404)")]
    LocationNotFound,

    #[error("Provider returned HTTP {status}")]
    ProviderError { status: u16 },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Request failed: {0}")]
    Unknown(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::InvalidCredential => {
                "Clé API invalide. Veuillez vérifier votre clé API OpenWeatherMap."
            }
            WeatherError::LocationNotFound => {
                "Localisation non trouvée. Veuillez vérifier les coordonnées."
            }
            WeatherError::ProviderError { .. } => {
                "Erreur du service météo. Veuillez réessayer plus tard."
            }
            WeatherError::InvalidPayload(_) => {
                "Les données reçues sont invalides. Veuillez réessayer plus tard."
            }
            WeatherError::Unknown(_) => {
                "Impossible de charger les données météo. Veuillez vérifier votre connexion Internet et réessayer plus tard."
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory unavailable")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Unknown time zone: {0}")]
    UnknownTimezone(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NoConfigDir => "Dossier de configuration introuvable.",
            ConfigError::Invalid(_) => "Configuration invalide. Vérifiez vos paramètres.",
            ConfigError::ParseError(_) => {
                "Le fichier de configuration est mal formé. Vérifiez vos paramètres."
            }
            ConfigError::UnknownTimezone(_) => {
                "Fuseau horaire inconnu. Vérifiez vos paramètres."
            }
        }
    }
}

/// Errors raised while writing the preference store.
///
/// Reads never fail: an unreadable store falls back to defaults.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Failed to write preferences to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PreferenceError {
    pub fn user_message(&self) -> &'static str {
        "Impossible d'enregistrer vos préférences."
    }
}

/// Extension trait for converting transport-level reqwest errors.
pub trait ReqwestErrorExt {
    fn into_weather_error(self) -> WeatherError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_weather_error(self) -> WeatherError {
        // Query strings hold the API key; keep it out of messages and logs.
        let detail = self.without_url();

        if detail.is_timeout() {
            WeatherError::Unknown(format!("request timed out: {}", detail))
        } else if detail.is_connect() {
            WeatherError::Unknown(format!("connection failed: {}", detail))
        } else if detail.is_decode() || detail.is_body() {
            WeatherError::Unknown(format!("failed to read response body: {}", detail))
        } else {
            WeatherError::Unknown(detail.to_string())
        }
    }
}
