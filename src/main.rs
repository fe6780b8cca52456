use std::io;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use novel_desk::config::AppConfig;
use novel_desk::core::logging;
use novel_desk::tui::app::AppState;
use novel_desk::tui::events::NotificationLevel;
use novel_desk::tui::services::Services;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize logging
    let _log_guard = logging::init(&config.log_dir());
    log::info!("{} v{} starting", novel_desk::NAME, novel_desk::VERSION);
    match config_error {
        Some(ref e) => log::warn!(
            "Failed to load config from {}: {e}; using defaults",
            AppConfig::config_path().display()
        ),
        None => log::info!("Loaded config (file: {})", AppConfig::config_path().display()),
    }

    // Optional project id to open directly
    let initial_project = std::env::args().nth(1).filter(|id| !id.trim().is_empty());

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let services = Services::init(&config, event_tx)?;
    let mut app = AppState::new(event_rx, services);
    if let Some(project_id) = initial_project {
        app.open_project(project_id);
    }
    if config_error.is_some() {
        app.push_notification(
            "Invalid configuration; using defaults".to_string(),
            NotificationLevel::Warning,
        );
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(config.tui.tick_rate_ms.max(1));
    let result = app.run(&mut terminal, tick_rate).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        log::error!("Event loop failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    log::info!("Shutting down");
    Ok(())
}
