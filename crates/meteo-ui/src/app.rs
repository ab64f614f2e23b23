//! Event loop: feeds key presses, ticks and fetch results through
//! `UiState::update`, runs the returned effects and redraws.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono_tz::Tz;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use meteo_core::PreferenceStore;
use meteo_weather::{location, WeatherProvider};
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::runtime::Handle;

use crate::models::weather_model::{Effect, Message, UiState};
use crate::services::weather_service::{WeatherService, WeatherServiceMessage};
use crate::theme::ThemeRoot;
use crate::{render, view};

/// What a key press asks the loop to do.
#[derive(Debug, Clone)]
pub enum Action {
    Dispatch(Message),
    Quit,
}

pub struct App {
    state: Option<UiState>,
    theme: ThemeRoot,
    preferences: PreferenceStore,
    weather: WeatherService,
    rx: Receiver<WeatherServiceMessage>,
    timezone: Tz,
    tick: Duration,
}

impl App {
    /// Read the stored theme, apply it and start the first fetch cycle.
    pub fn new(
        provider: Arc<WeatherProvider>,
        runtime: Handle,
        preferences: PreferenceStore,
        timezone: Tz,
        tick: Duration,
    ) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let dark_mode = preferences.load_dark_mode();
        let (state, effects) = UiState::init(dark_mode);

        let mut app = Self {
            state: Some(state),
            theme: ThemeRoot::default(),
            preferences,
            weather: WeatherService::new(provider, runtime, tx),
            rx,
            timezone,
            tick,
        };
        app.run_effects(effects);
        app
    }

    pub fn state(&self) -> Option<&UiState> {
        self.state.as_ref()
    }

    pub fn theme(&self) -> &ThemeRoot {
        &self.theme
    }

    pub fn view(&self) -> Option<view::View> {
        self.state
            .as_ref()
            .map(|state| view::build(state, &self.timezone))
    }

    /// Apply one message and run its effects before returning.
    pub fn dispatch(&mut self, message: Message) {
        let Some(state) = self.state.take() else {
            return;
        };
        let (next, effects) = state.update(message);
        self.state = Some(next);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch {
                    generation,
                    location,
                } => self.weather.request_fetch(generation, location),
                Effect::ApplyTheme(class) => self.theme.apply(class),
                Effect::PersistTheme(dark_mode) => {
                    if let Err(e) = self.preferences.save_dark_mode(dark_mode) {
                        tracing::warn!("Failed to persist theme preference: {}", e);
                    }
                }
            }
        }
    }

    /// Dispatch every fetch result already waiting on the channel.
    pub fn drain_service_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_service_message(message);
        }
    }

    /// Block up to `timeout` for one fetch result and dispatch it.
    /// Returns false if nothing arrived.
    pub fn wait_for_service_message(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => {
                self.handle_service_message(message);
                true
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => false,
        }
    }

    fn handle_service_message(&mut self, message: WeatherServiceMessage) {
        match message {
            WeatherServiceMessage::FetchDone { generation, result } => {
                self.dispatch(Message::FetchDone { generation, result });
            }
        }
    }

    /// Run until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut last_tick = Instant::now();

        loop {
            self.drain_service_messages();

            if let Some(view) = self.view() {
                terminal.draw(|frame| render::draw(frame, &view, &self.theme))?;
            }

            let timeout = self.tick.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    match action_for_key(key) {
                        Some(Action::Quit) => break,
                        Some(Action::Dispatch(message)) => self.dispatch(message),
                        None => {}
                    }
                }
            }

            if last_tick.elapsed() >= self.tick {
                self.dispatch(Message::Tick);
                last_tick = Instant::now();
            }
        }

        self.weather.shutdown();
        tracing::info!("Event loop stopped");
        Ok(())
    }
}

/// Key bindings of the dashboard.
pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
            Some(Action::Dispatch(Message::NextLocation))
        }
        KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
            Some(Action::Dispatch(Message::PreviousLocation))
        }
        KeyCode::Char('t') => Some(Action::Dispatch(Message::ToggleTheme)),
        KeyCode::Char(c @ '1'..='9') => {
            let index = c.to_digit(10)? as usize - 1;
            location::all()
                .get(index)
                .map(|loc| Action::Dispatch(Message::SelectLocation(loc.name.to_string())))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeClass;
    use meteo_core::WeatherConfig;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::runtime::Runtime;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn current_body(temp: f64, description: &str) -> serde_json::Value {
        serde_json::json!({
            "main": {"temp": temp, "humidity": 40},
            "wind": {"speed": 3.5},
            "weather": [{"description": description}]
        })
    }

    fn mock_server(runtime: &Runtime) -> MockServer {
        runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/weather"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(current_body(21.6, "ciel dégagé")),
                )
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/forecast"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"list": []})),
                )
                .mount(&server)
                .await;
            server
        })
    }

    fn app_for(runtime: &Runtime, server: &MockServer, dir: &TempDir) -> App {
        let config = WeatherConfig {
            api_key: "test-key".to_string(),
            base_url: server.uri(),
            ..WeatherConfig::default()
        };
        let provider = Arc::new(WeatherProvider::new(&config).unwrap());
        App::new(
            provider,
            runtime.handle().clone(),
            PreferenceStore::open(dir.path()),
            chrono_tz::Africa::Casablanca,
            Duration::from_millis(50),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_bindings() {
        assert!(matches!(action_for_key(key(KeyCode::Char('q'))), Some(Action::Quit)));
        assert!(matches!(action_for_key(key(KeyCode::Esc)), Some(Action::Quit)));
        assert!(matches!(
            action_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        ));
        assert!(matches!(
            action_for_key(key(KeyCode::Right)),
            Some(Action::Dispatch(Message::NextLocation))
        ));
        assert!(matches!(
            action_for_key(key(KeyCode::Char('h'))),
            Some(Action::Dispatch(Message::PreviousLocation))
        ));
        assert!(matches!(
            action_for_key(key(KeyCode::Char('t'))),
            Some(Action::Dispatch(Message::ToggleTheme))
        ));
        match action_for_key(key(KeyCode::Char('3'))) {
            Some(Action::Dispatch(Message::SelectLocation(name))) => assert_eq!(name, "Khouribga"),
            other => panic!("unexpected action {other:?}"),
        }
        assert!(action_for_key(key(KeyCode::Char('9'))).is_none());
        assert!(action_for_key(key(KeyCode::Char('x'))).is_none());
    }

    #[test]
    fn test_startup_applies_stored_theme_and_loads() {
        let runtime = Runtime::new().unwrap();
        let server = mock_server(&runtime);
        let dir = TempDir::new().unwrap();
        PreferenceStore::open(dir.path()).save_dark_mode(true).unwrap();

        let mut app = app_for(&runtime, &server, &dir);
        assert_eq!(app.theme().class(), ThemeClass::Dark);
        assert!(app.state().unwrap().is_loading);

        assert!(app.wait_for_service_message(Duration::from_secs(5)));
        let state = app.state().unwrap();
        assert!(!state.is_loading);
        assert_eq!(state.error_message, None);
        match app.view().unwrap() {
            view::View::Dashboard(dashboard) => {
                assert_eq!(dashboard.current.temperature, "22°C");
                assert_eq!(dashboard.current.description, "ciel dégagé");
            }
            other => panic!("expected dashboard, got {other:?}"),
        }
    }

    #[test]
    fn test_toggle_twice_persists_and_applies_each_time() {
        let runtime = Runtime::new().unwrap();
        let server = mock_server(&runtime);
        let dir = TempDir::new().unwrap();
        let mut app = app_for(&runtime, &server, &dir);
        assert_eq!(app.theme().class(), ThemeClass::Light);

        app.dispatch(Message::ToggleTheme);
        assert_eq!(app.theme().class(), ThemeClass::Dark);
        assert_eq!(
            PreferenceStore::open(dir.path()).get("darkMode").as_deref(),
            Some("true")
        );

        app.dispatch(Message::ToggleTheme);
        assert_eq!(app.theme().class(), ThemeClass::Light);
        assert_eq!(
            PreferenceStore::open(dir.path()).get("darkMode").as_deref(),
            Some("false")
        );
        assert!(!app.state().unwrap().dark_mode);
    }

    #[test]
    fn test_slow_earlier_selection_never_overwrites_later_one() {
        let runtime = Runtime::new().unwrap();
        let dir = TempDir::new().unwrap();
        let slow = location::initial();
        let fast = location::next(&slow);

        let server = runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/weather"))
                .and(query_param("lat", slow.latitude.to_string()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(current_body(30.0, "lent"))
                        .set_delay(Duration::from_millis(400)),
                )
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/weather"))
                .and(query_param("lat", fast.latitude.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(current_body(12.0, "rapide")))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/forecast"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"list": []})),
                )
                .mount(&server)
                .await;
            server
        });

        let mut app = app_for(&runtime, &server, &dir);
        app.dispatch(Message::SelectLocation(fast.name.to_string()));

        assert!(app.wait_for_service_message(Duration::from_secs(5)));
        std::thread::sleep(Duration::from_millis(600));
        app.drain_service_messages();

        let state = app.state().unwrap();
        assert_eq!(state.selected, fast);
        assert!(!state.is_loading);
        let description = state
            .snapshot
            .as_ref()
            .and_then(|s| s.description().map(str::to_string));
        assert_eq!(description.as_deref(), Some("rapide"));
    }
}
