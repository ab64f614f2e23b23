//! Weather backend: async weather fetching.
//! All network work runs off the UI thread; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use meteo_weather::{Location, WeatherBundle, WeatherError, WeatherProvider};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Messages sent from async operations back to the UI thread
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of one fetch cycle, tagged with the cycle's generation
    FetchDone {
        generation: u64,
        result: Result<WeatherBundle, WeatherError>,
    },
}

/// Spawns fetch cycles on the runtime and posts their results back.
///
/// Starting a cycle cancels the one still in flight, if any; its result is
/// never posted.
pub struct WeatherService {
    provider: Arc<WeatherProvider>,
    runtime: Handle,
    tx: Sender<WeatherServiceMessage>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl WeatherService {
    pub fn new(
        provider: Arc<WeatherProvider>,
        runtime: Handle,
        tx: Sender<WeatherServiceMessage>,
    ) -> Self {
        Self {
            provider,
            runtime,
            tx,
            in_flight: Mutex::new(None),
        }
    }

    /// Request a fetch cycle for `location`.
    /// Sends `FetchDone` on the channel when complete.
    pub fn request_fetch(&self, generation: u64, location: Location) {
        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.lock().replace(token.clone()) {
            previous.cancel();
        }

        let tx = self.tx.clone();
        let provider = self.provider.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(generation, location = location.name, "Fetch cycle cancelled");
                }
                result = provider.fetch(&location) => {
                    if tx.send(WeatherServiceMessage::FetchDone { generation, result }).is_err() {
                        tracing::debug!(generation, "UI gone before fetch completed");
                    }
                }
            }
        });
    }

    /// Cancel any cycle still in flight.
    pub fn shutdown(&self) {
        if let Some(token) = self.in_flight.lock().take() {
            token.cancel();
        }
    }
}
