//! hlsdeck - video catalog browser with HLS playback
//!
//! Runs the catalog proxy, browses the catalog, and plays videos in a
//! local player through the proxy.
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI (proxy in-process)
//! hlsdeck --embedded
//!
//! # CLI mode (for automation)
//! hlsdeck serve --listen 0.0.0.0:3000
//! hlsdeck list --json
//! hlsdeck play v1
//! ```

use std::io::{stdout, Stdout};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use hlsdeck::api::CatalogClient;
use hlsdeck::app::{App, AppAction, CatalogState};
use hlsdeck::cli::{Cli, Command, ExitCode, Output};
use hlsdeck::commands::{self, Context};
use hlsdeck::playback::{LocalController, PlaybackEvent, PlaybackState};
use hlsdeck::ui;

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

const TICK_RATE: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.is_cli_mode() {
        init_stderr_logging(&cli);
        let exit_code = run_cli(cli).await;
        std::process::exit(exit_code.into());
    } else {
        let _guard = init_file_logging();
        run_tui(cli).await
    }
}

// =============================================================================
// Logging
// =============================================================================

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn init_stderr_logging(cli: &Cli) {
    let default = match cli.command {
        Some(Command::Serve(_)) => "hlsdeck=info,tower_http=info",
        _ if cli.quiet => "hlsdeck=error",
        _ => "hlsdeck=warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .with_writer(std::io::stderr)
        .init();
}

/// Log to a daily file so the alternate screen stays clean
fn init_file_logging() -> Option<WorkerGuard> {
    let dir = dirs::cache_dir()?.join("hlsdeck").join("logs");
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::daily(dir, "hlsdeck.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("hlsdeck=info"))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

// =============================================================================
// CLI Mode
// =============================================================================

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let mut ctx = match Context::from_cli(&cli) {
        Ok(ctx) => ctx,
        Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
    };

    let Some(command) = cli.command else {
        return ExitCode::Success;
    };

    // `serve` is the proxy itself
    if !matches!(command, Command::Serve(_)) {
        if let Err(e) = ctx.ensure_proxy().await {
            return output.error(format!("Failed to start proxy: {}", e), ExitCode::Error);
        }
    }

    match command {
        Command::Serve(cmd) => commands::serve_cmd(cmd, ctx, &output).await,
        Command::List(cmd) => commands::list_cmd(cmd, &ctx, &output).await,
        Command::Info(cmd) => commands::info_cmd(cmd, &ctx, &output).await,
        Command::Play(cmd) => commands::play_cmd(cmd, &ctx, &output).await,
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run interactive TUI
async fn run_tui(cli: Cli) -> Result<()> {
    let mut ctx = Context::from_cli(&cli)?;
    ctx.ensure_proxy().await?;
    tracing::info!("Catalog at {}", ctx.proxy_url);

    let client = ctx.catalog_client();
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = ctx.controller(ctx.player_type(None), false, tx)?;

    let mut terminal = init_terminal()?;
    let mut app = App::new();

    let result = run_event_loop(&mut terminal, &mut app, client, controller, rx).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    result
}

fn spawn_load(client: &CatalogClient) -> JoinHandle<CatalogState> {
    let client = client.clone();
    tokio::spawn(async move { CatalogState::load(&client).await })
}

/// Main event loop: input, catalog loads, playback events, render
async fn run_event_loop(
    terminal: &mut Tui,
    app: &mut App,
    client: CatalogClient,
    mut controller: LocalController,
    mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
) -> Result<()> {
    let mut load = Some(spawn_load(&client));

    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    match app.handle_key(key) {
                        AppAction::Play(video) => {
                            let replay = !controller.select(Some(&video))
                                && matches!(
                                    controller.state(),
                                    PlaybackState::Idle | PlaybackState::Errored(_)
                                );
                            if replay {
                                controller.restart(&video);
                            }
                        }
                        AppAction::Reload => {
                            if let Some(handle) = load.take() {
                                handle.abort();
                            }
                            controller.select(None);
                            load = Some(spawn_load(&client));
                        }
                        AppAction::Quit | AppAction::None => {}
                    }
                }
            }
        }

        if load.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = load.take() {
                let catalog = match handle.await {
                    Ok(catalog) => catalog,
                    Err(e) => CatalogState::loading().failed(e.to_string()),
                };
                app.set_catalog(catalog);
                controller.select(app.catalog.selected());
            }
        }

        while let Ok(event) = events.try_recv() {
            controller.handle_event(event);
        }

        app.playback = controller.state().clone();
        app.now_playing = controller
            .current_url()
            .and(app.catalog.selected())
            .map(|v| v.title.clone());
    }

    if let Some(handle) = load.take() {
        handle.abort();
    }
    controller.shutdown();
    Ok(())
}
