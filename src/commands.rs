//! CLI Command Handlers
//!
//! Each handler takes CLI args, the resolved [`Context`] and Output, and
//! returns ExitCode.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

use crate::api::{CatalogClient, CatalogError};
use crate::app::{CatalogState, EMPTY_MESSAGE};
use crate::cli::{
    Cli, ExitCode, InfoCmd, ListCmd, Output, PlayCmd, PlayResponse, PlayerChoice, ServeCmd,
};
use crate::config::{trim_base, Config};
use crate::playback::tracks::default_track;
use crate::playback::{
    to_proxy_hls_url, LocalController, PlaybackController, PlaybackEvent, PlaybackState,
    PlayerElement, PlayerType, SegmentRelay, Strategy,
};
use crate::proxy::{self, ProxyState};

// =============================================================================
// Context
// =============================================================================

/// Configuration resolved from file, environment and global flags
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub backend_url: String,
    pub proxy_url: String,
    pub embedded: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load(),
        };
        let backend_url = cli
            .backend
            .clone()
            .map(trim_base)
            .unwrap_or_else(|| config.backend_url());
        let proxy_url = cli
            .proxy_url
            .clone()
            .map(trim_base)
            .unwrap_or_else(|| config.proxy_url());

        Ok(Self {
            config,
            backend_url,
            proxy_url,
            embedded: cli.embedded,
        })
    }

    /// Proxy state for this backend, with the local catalog if configured
    pub fn proxy_state(&self) -> ProxyState {
        let state = ProxyState::new(&self.backend_url);
        match &self.config.local_catalog_dir {
            Some(dir) => state.with_local_catalog(dir),
            None => state,
        }
    }

    /// Start the embedded proxy when requested and point clients at it
    pub async fn ensure_proxy(&mut self) -> std::io::Result<()> {
        if self.embedded {
            self.proxy_url = proxy::spawn_embedded(Arc::new(self.proxy_state())).await?;
        }
        Ok(())
    }

    /// CLI choice, then config, then the default player
    pub fn player_type(&self, choice: Option<PlayerChoice>) -> PlayerType {
        choice
            .map(PlayerType::from)
            .or_else(|| {
                self.config
                    .player
                    .as_deref()
                    .and_then(PlayerType::from_name)
            })
            .unwrap_or_default()
    }

    pub fn catalog_client(&self) -> CatalogClient {
        CatalogClient::new(&self.proxy_url)
    }

    /// Controller playing through a local player, events sent to `events`
    pub fn controller(
        &self,
        player: PlayerType,
        relay_only: bool,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Result<LocalController> {
        let origin = Url::parse(&self.proxy_url)?;
        let element = PlayerElement::new(player, origin.clone(), events.clone());
        let element = if relay_only {
            element.without_native_hls()
        } else {
            element
        };
        let engine = SegmentRelay::new(origin, events);
        Ok(PlaybackController::new(element, engine))
    }
}

fn catalog_exit_code(e: &CatalogError) -> ExitCode {
    match e {
        CatalogError::NotFound(_) => ExitCode::NotFound,
        _ => ExitCode::NetworkError,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

pub async fn serve_cmd(cmd: ServeCmd, mut ctx: Context, output: &Output) -> ExitCode {
    if let Some(dir) = cmd.local_catalog {
        ctx.config.local_catalog_dir = Some(dir);
    }
    let listen = cmd.listen.unwrap_or_else(|| ctx.config.listen());

    let addr: SocketAddr = match listen.parse() {
        Ok(addr) => addr,
        Err(e) => {
            return output.error(
                format!("Invalid listen address '{}': {}", listen, e),
                ExitCode::InvalidArgs,
            )
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => return output.error(format!("Failed to bind {}: {}", addr, e), ExitCode::Error),
    };

    tracing::info!("Proxying {} on http://{}", ctx.backend_url, addr);
    if addr.ip().is_unspecified() {
        match local_ip_address::local_ip() {
            Ok(ip) => tracing::info!("Reachable on the LAN at http://{}:{}", ip, addr.port()),
            Err(e) => tracing::debug!("Could not determine LAN address: {}", e),
        }
    }
    if let Some(dir) = &ctx.config.local_catalog_dir {
        tracing::info!("Local catalog from {}", dir.display());
    }

    let app = proxy::router(Arc::new(ctx.proxy_state()));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await;

    match served {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Server error: {}", e), ExitCode::Error),
    }
}

// =============================================================================
// List Command
// =============================================================================

pub async fn list_cmd(cmd: ListCmd, ctx: &Context, output: &Output) -> ExitCode {
    let client = ctx.catalog_client();
    output.info(format!("Fetching catalog from {}", client.base_url()));

    let result = if cmd.local {
        client.local_videos().await
    } else {
        client.videos().await
    };

    match result {
        Ok(mut videos) => {
            if let Some(limit) = cmd.limit {
                videos.truncate(limit);
            }
            if videos.is_empty() {
                output.info(EMPTY_MESSAGE);
            }
            if let Err(e) = output.print(&videos) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), catalog_exit_code(&e)),
    }
}

// =============================================================================
// Info Command
// =============================================================================

pub async fn info_cmd(cmd: InfoCmd, ctx: &Context, output: &Output) -> ExitCode {
    let client = ctx.catalog_client();

    match client.video(&cmd.id).await {
        Ok(video) => {
            if let Err(e) = output.print(&video) {
                return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
            }
            ExitCode::Success
        }
        Err(e) => output.error(e.to_string(), catalog_exit_code(&e)),
    }
}

// =============================================================================
// Play Command
// =============================================================================

pub async fn play_cmd(cmd: PlayCmd, ctx: &Context, output: &Output) -> ExitCode {
    let catalog = CatalogState::load(&ctx.catalog_client()).await;
    if let Some(error) = catalog.error() {
        return output.error(error.to_string(), ExitCode::NetworkError);
    }

    let catalog = match &cmd.id {
        Some(id) if !catalog.videos().iter().any(|v| &v.id == id) => {
            return output.error(format!("Video not found: {}", id), ExitCode::NotFound);
        }
        Some(id) => catalog.select(id),
        None => catalog,
    };

    let Some(video) = catalog.selected().cloned() else {
        return output.error(EMPTY_MESSAGE, ExitCode::NotFound);
    };

    let player = ctx.player_type(cmd.player);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut controller = match ctx.controller(player, cmd.relay, tx) {
        Ok(controller) => controller,
        Err(e) => return output.error(format!("Invalid proxy URL: {}", e), ExitCode::InvalidArgs),
    };

    if !controller.media().is_available().await {
        return output.error(
            format!("{} not found. Install it first.", player.display_name()),
            ExitCode::Error,
        );
    }

    output.info(format!("Playing {} in {}...", video, player.display_name()));
    controller.select(Some(&video));

    match controller.state() {
        PlaybackState::Errored(e) => return output.error(e.to_string(), ExitCode::PlaybackFailed),
        PlaybackState::Attaching => {
            return output.error(
                format!("{} did not start", player.display_name()),
                ExitCode::PlaybackFailed,
            )
        }
        _ => {}
    }

    let tracks = controller.media().tracks().to_vec();
    let response = PlayResponse {
        id: video.id.clone(),
        title: video.title.clone(),
        source: to_proxy_hls_url(&video.hls_url).into_owned(),
        strategy: match controller.strategy() {
            Some(Strategy::Engine) => "relay".to_string(),
            _ => "native".to_string(),
        },
        subtitle: default_track(&tracks).map(|t| t.src.clone()),
    };
    if let Err(e) = output.print(&response) {
        return output.error(format!("Failed to serialize: {}", e), ExitCode::Error);
    }

    let code = loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                controller.handle_event(event);
                match controller.state() {
                    PlaybackState::Errored(e) => {
                        break output.error(e.to_string(), ExitCode::PlaybackFailed);
                    }
                    PlaybackState::Idle => break ExitCode::Success,
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => break ExitCode::Success,
        }
    };

    controller.shutdown();
    code
}
