//! Weather data for the Meteo dashboard
//!
//! Fixed location registry, OpenWeatherMap wire types and the provider
//! that runs a fetch cycle.

pub mod location;
pub mod provider;
pub mod types;

pub use provider::{Endpoint, WeatherProvider};
pub use types::*;
