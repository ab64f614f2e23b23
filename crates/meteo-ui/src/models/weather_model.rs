//! Dashboard state and its update function.
//!
//! `UiState` is only ever replaced wholesale by `update`, which returns the
//! next state plus the effects the event loop must run. Fetch results carry
//! the generation of the cycle that produced them; anything but the latest
//! generation is dropped.

use meteo_weather::{location, CurrentConditions, ForecastEntry, Location, WeatherBundle, WeatherError};

use crate::theme::ThemeClass;

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub selected: Location,
    pub snapshot: Option<CurrentConditions>,
    pub forecast: Option<Vec<ForecastEntry>>,
    pub is_loading: bool,
    pub error_message: Option<&'static str>,
    pub dark_mode: bool,
    /// Generation of the most recently started fetch cycle
    pub generation: u64,
    pub spinner_frame: usize,
}

#[derive(Debug, Clone)]
pub enum Message {
    SelectLocation(String),
    NextLocation,
    PreviousLocation,
    ToggleTheme,
    FetchDone {
        generation: u64,
        result: Result<WeatherBundle, WeatherError>,
    },
    Tick,
}

/// Side effects requested by `update`, executed by the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch { generation: u64, location: Location },
    ApplyTheme(ThemeClass),
    PersistTheme(bool),
}

impl UiState {
    /// State at startup: the first fetch cycle is already started for the
    /// initial location and the stored theme is applied.
    pub fn init(dark_mode: bool) -> (Self, Vec<Effect>) {
        let idle = Self {
            selected: location::initial(),
            snapshot: None,
            forecast: None,
            is_loading: false,
            error_message: None,
            dark_mode,
            generation: 0,
            spinner_frame: 0,
        };

        let (state, mut effects) = idle.begin_cycle(location::initial());
        effects.insert(0, Effect::ApplyTheme(ThemeClass::from_flag(dark_mode)));
        (state, effects)
    }

    pub fn update(self, message: Message) -> (Self, Vec<Effect>) {
        match message {
            Message::SelectLocation(name) => match location::find_by_name(&name) {
                Some(loc) if loc != self.selected => self.begin_cycle(loc),
                Some(_) => (self, Vec::new()),
                None => {
                    tracing::warn!(name = %name, "Ignoring unknown location");
                    (self, Vec::new())
                }
            },
            Message::NextLocation => {
                let loc = location::next(&self.selected);
                self.begin_cycle(loc)
            }
            Message::PreviousLocation => {
                let loc = location::previous(&self.selected);
                self.begin_cycle(loc)
            }
            Message::ToggleTheme => {
                let dark_mode = !self.dark_mode;
                let effects = vec![
                    Effect::ApplyTheme(ThemeClass::from_flag(dark_mode)),
                    Effect::PersistTheme(dark_mode),
                ];
                (Self { dark_mode, ..self }, effects)
            }
            Message::FetchDone { generation, result } => {
                if generation != self.generation {
                    tracing::debug!(
                        generation,
                        current = self.generation,
                        "Discarding stale fetch result"
                    );
                    return (self, Vec::new());
                }
                (self.finish_cycle(result), Vec::new())
            }
            Message::Tick => {
                let spinner_frame = if self.is_loading {
                    self.spinner_frame.wrapping_add(1)
                } else {
                    self.spinner_frame
                };
                (Self { spinner_frame, ..self }, Vec::new())
            }
        }
    }

    fn begin_cycle(self, location: Location) -> (Self, Vec<Effect>) {
        let generation = self.generation + 1;
        tracing::info!(location = location.name, generation, "Starting fetch cycle");

        let next = Self {
            selected: location,
            is_loading: true,
            error_message: None,
            generation,
            spinner_frame: 0,
            ..self
        };
        (next, vec![Effect::Fetch { generation, location }])
    }

    fn finish_cycle(self, result: Result<WeatherBundle, WeatherError>) -> Self {
        match result {
            Ok(bundle) => Self {
                snapshot: Some(bundle.current),
                forecast: Some(bundle.forecast.list.unwrap_or_default()),
                is_loading: false,
                error_message: None,
                ..self
            },
            Err(e) => {
                tracing::error!(
                    location = self.selected.name,
                    generation = self.generation,
                    "Fetch cycle failed: {}",
                    e
                );
                Self {
                    snapshot: None,
                    forecast: None,
                    is_loading: false,
                    error_message: Some(e.user_message()),
                    ..self
                }
            }
        }
    }
}
