//! snowdash - Snow forecasts for Colorado ski resorts
//!
//! A terminal UI application that shows today's temperatures and the coming
//! week's snowfall for six Colorado ski resorts, refreshed in the background.

use std::io;
use std::panic;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use snowdash::app::App;
use snowdash::cli::{Cli, RunMode, Settings};
use snowdash::refresh::{RefreshHandle, Scheduler};
use snowdash::{logging, report, ui};

/// How long to wait for an in-flight refresh when quitting
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Runs a single refresh and prints the report
async fn run_once(scheduler: Scheduler, json: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match scheduler.refresh_all().await {
        Ok(data) => {
            if json {
                println!("{}", report::render_json(&data)?);
            } else {
                print!("{}", report::render_text(&data, Local::now().date_naive()));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Runs the interactive dashboard until the user quits
async fn run_dashboard(
    scheduler: Scheduler,
    settings: &Settings,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let handle = RefreshHandle::spawn(Arc::new(scheduler), settings.refresh_config());
    let mut updates = handle.subscribe();
    let mut app = App::new();
    app.sync(handle.state());

    // Main event loop
    let result: Result<(), Box<dyn std::error::Error>> = loop {
        if updates.has_changed().unwrap_or(false) {
            app.sync(updates.borrow_and_update().clone());
        }

        if let Err(e) = terminal.draw(|f| ui::render(f, &app)) {
            break Err(e.into());
        }

        // Poll for keyboard events with 100ms timeout
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if app.refresh_requested {
            handle.request_refresh();
            app.refresh_requested = false;
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    if tokio::time::timeout(SHUTDOWN_GRACE, handle.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("Refresh still running at exit, abandoning it");
    }

    result.map(|()| ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = match Settings::from_cli(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    logging::init_logger(&settings.log_level, settings.log_target())?;
    tracing::debug!(mode = ?settings.mode, cache = ?settings.cache, "Starting snowdash");

    let scheduler = settings.build_scheduler()?;

    match settings.mode {
        RunMode::Once { json } => run_once(scheduler, json).await,
        RunMode::Dashboard => run_dashboard(scheduler, &settings).await,
    }
}
