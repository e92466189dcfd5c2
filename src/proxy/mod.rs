//! Proxy layer forwarding catalog and HLS requests to the video backend.
//!
//! The handlers are stateless per request; the shared [`ProxyState`] only
//! carries the backend base URL, a pooled HTTP client and the optional
//! local catalog directory.
//!
//! # Endpoints
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `GET /api/videos[?id=<id>]` | Backend catalog, or one entry by id |
//! | `GET /api/videos/{id}` | Backend `/videos/{id}`, relayed verbatim |
//! | `GET /api/videos/local` | Catalog scanned from a local HLS directory |
//! | `GET /api/hls/{*path}` | Playlists and segments, uncached, CORS open |
//!
//! # Usage
//!
//! ```rust,ignore
//! use hlsdeck::proxy::{router, ProxyState};
//! use std::sync::Arc;
//!
//! let state = Arc::new(ProxyState::new("http://localhost:5000"));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, router(state)).await?;
//! ```

pub mod error;
pub mod local;
pub mod routes;
mod state;

pub use error::ProxyError;
pub use routes::router;
pub use state::ProxyState;

use std::net::SocketAddr;
use std::sync::Arc;

/// Bind the proxy on an ephemeral local port and serve it in the background.
///
/// Returns the base URL clients should use. The server lives as long as
/// the runtime.
pub async fn spawn_embedded(state: Arc<ProxyState>) -> std::io::Result<String> {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tracing::info!("Embedded proxy listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(state)).await {
            tracing::error!("Embedded proxy stopped: {}", e);
        }
    });

    Ok(format!("http://{}", addr))
}
