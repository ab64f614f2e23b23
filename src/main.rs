use std::io::{self, Stdout};
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use meteo_core::{AppError, Config, PreferenceStore};
use meteo_ui::App;
use meteo_weather::WeatherProvider;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Meteo stopped with an error: {}", e);
            eprintln!("{}", e.user_message());
            eprintln!("  {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = Config::load()?;
    meteo_core::init(&config.log_path())?;
    config.ensure_valid()?;

    tracing::info!(config_dir = %config.config_dir.display(), "Meteo starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let provider = Arc::new(WeatherProvider::new(&config.weather)?);
    let timezone = config.weather.display_timezone()?;
    let preferences = PreferenceStore::open(&config.config_dir);

    let mut app = App::new(
        provider,
        runtime.handle().clone(),
        preferences,
        timezone,
        Duration::from_millis(config.ui.tick_millis),
    );

    chain_panic_hook(|| {
        let _ = reset_terminal();
    });

    let mut terminal = setup_terminal()?;
    let outcome = app.run(&mut terminal);
    restore_terminal(&mut terminal)?;

    runtime.shutdown_timeout(Duration::from_secs(1));
    tracing::info!("Meteo stopped");
    outcome.map_err(AppError::from)
}

/// Run `on_panic` before the previously installed panic hook.
fn chain_panic_hook<F>(on_panic: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        on_panic();
        previous(info);
    }));
}

fn setup_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;

    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to enter alternate screen");
    }

    match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => Ok(terminal),
        Err(e) => {
            let _ = reset_terminal();
            Err(e).context("Failed to create terminal")
        }
    }
}

/// Leave raw mode and the alternate screen without a `Terminal` handle.
fn reset_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}

fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_panic_hook_runs_cleanup_first() {
        static CLEANED_UP: AtomicBool = AtomicBool::new(false);
        chain_panic_hook(|| CLEANED_UP.store(true, Ordering::SeqCst));

        let result = panic::catch_unwind(|| panic!("draw failed"));

        let _ = panic::take_hook();
        assert!(result.is_err());
        assert!(CLEANED_UP.load(Ordering::SeqCst));
    }
}
