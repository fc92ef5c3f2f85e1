//! DDR Finder - find arcades with Dance Dance Revolution machines
//!
//! A terminal viewer that pans a box across the map and lists the arcades in
//! it, backed by a bounds-aware cache so that panning back and forth does not
//! hit the network again. With `--once` it prints a single query as JSON.

mod app;
mod ui;

use std::io;
use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ddrfinder::cache::BoundsCache;
use ddrfinder::cli::{Cli, StartupConfig};
use ddrfinder::config::ApiConfig;
use ddrfinder::data::{ApiClient, Bounds};
use ddrfinder::loader::LocationLoader;
use ddrfinder::prefs::PreferenceStore;

use app::{App, AppState};

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Installs a stderr log subscriber, `warn` unless `RUST_LOG` says otherwise
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match &app.state {
        AppState::Loading => {
            render_loading(frame);
        }
        AppState::LocationList => {
            ui::render_location_list(frame, app);
        }
        AppState::LocationDetail(location_id) => {
            ui::render_location_detail(frame, app, *location_id);
        }
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Renders a loading message while the first request is running
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading arcades...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

/// Queries every source concurrently and prints the results as JSON
///
/// Returns false if any source failed with a hard error.
async fn run_once(
    cache: &BoundsCache<ApiClient>,
    bounds: Bounds,
    sources: &[String],
    force: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let requests = sources
        .iter()
        .map(|source| cache.request_locations(bounds, source, force));
    let results = futures::future::join_all(requests).await;

    let mut all_ok = true;
    let mut output = Vec::with_capacity(sources.len());
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(result) => output.push(json!({
                "source": source,
                "result": result,
            })),
            Err(e) => {
                if !e.is_soft() {
                    all_ok = false;
                }
                output.push(json!({
                    "source": source,
                    "error": { "code": e.code(), "message": e.to_string() },
                }));
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(all_ok)
}

/// Runs the interactive viewer until the user quits
fn run_viewer(
    cache: Arc<BoundsCache<ApiClient>>,
    mut app: App,
) -> Result<App, Box<dyn std::error::Error>> {
    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut loader = LocationLoader::new(cache);

    // Main event loop
    loop {
        if let Some((query, force)) = app.take_request() {
            loader.request(query, force, &mut app);
        }
        loader.poll(&mut app);

        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    loader.cancel_pending(&mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let store = PreferenceStore::new();
    let prefs = store.as_ref().and_then(|s| s.load());

    let mut config = ApiConfig::from_env();
    if let Some(url) = &startup.api_url {
        config = config.with_url(url.clone());
    }
    let data_source = startup.primary_source(prefs.as_ref(), &config.data_source);
    let config = config.with_data_source(data_source);

    let cache = Arc::new(BoundsCache::new(ApiClient::new(&config)?));
    let bounds = startup.initial_bounds(prefs.as_ref());

    if startup.once {
        init_logging();
        let sources = if startup.data_sources.is_empty() {
            vec![config.data_source.clone()]
        } else {
            startup.data_sources.clone()
        };
        info!(url = %config.url, sources = ?sources, "running single query");

        if !run_once(&cache, bounds, &sources, startup.force).await? {
            std::process::exit(1);
        }
        return Ok(());
    }

    let app = run_viewer(
        cache,
        App::new(bounds, config.data_source.clone(), startup.force),
    )?;

    if let Some(store) = store {
        if let Err(e) = store.save(&app.preferences()) {
            warn!(error = %e, "failed to save preferences");
            eprintln!("warning: {}", e);
        }
    }

    Ok(())
}
