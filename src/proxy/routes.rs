use axum::{
    body::Body,
    extract::{Path, Query, RawQuery, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::proxy::error::ProxyError;
use crate::proxy::local;
use crate::proxy::state::ProxyState;

/// Content type used when the backend omits one
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Create the proxy router with all endpoints.
///
/// `/api/videos/local` takes precedence over `/api/videos/{id}`, so a
/// backend video whose id is `local` is only reachable through
/// `/api/videos?id=local`.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/api/videos", get(list_videos_handler))
        .route("/api/videos/local", get(local_videos_handler))
        .route("/api/videos/{id}", get(video_handler))
        .route("/api/hls/{*path}", get(hls_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub id: Option<String>,
}

/// Serve the backend catalog, or a single entry when `?id=` is given.
async fn list_videos_handler(
    Query(query): Query<CatalogQuery>,
    State(state): State<Arc<ProxyState>>,
) -> Result<Json<Value>, ProxyError> {
    let catalog: Value = state
        .client()
        .get(state.videos_url())
        .send()
        .await?
        .json()
        .await?;

    let Value::Array(videos) = catalog else {
        return Err(ProxyError::InvalidCatalog(
            "expected a JSON array".to_string(),
        ));
    };

    match query.id.filter(|id| !id.is_empty()) {
        Some(id) => find_video(videos, &id).map(Json),
        None => Ok(Json(Value::Array(videos))),
    }
}

/// Pick the catalog entry whose `id` equals `id`.
pub fn find_video(videos: Vec<Value>, id: &str) -> Result<Value, ProxyError> {
    videos
        .into_iter()
        .find(|video| video.get("id").and_then(Value::as_str) == Some(id))
        .ok_or_else(|| ProxyError::VideoNotFound(id.to_string()))
}

/// Relay the backend's single-video endpoint.
async fn video_handler(
    Path(id): Path<String>,
    State(state): State<Arc<ProxyState>>,
) -> Result<Response, ProxyError> {
    let upstream = state.client().get(state.video_url(&id)).send().await?;
    relay(upstream).await
}

/// Serve videos found in the local catalog directory.
///
/// Without a configured directory the list is empty.
async fn local_videos_handler(
    State(state): State<Arc<ProxyState>>,
) -> Result<impl IntoResponse, ProxyError> {
    let videos = match state.local_catalog() {
        Some(dir) => local::scan(dir).await?,
        None => Vec::new(),
    };
    Ok(Json(videos))
}

/// Proxy a playlist, segment or subtitle file from the backend.
///
/// Status and content type are mirrored; responses are never cached so
/// live playlists stay fresh.
async fn hls_handler(
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    State(state): State<Arc<ProxyState>>,
) -> Result<Response, ProxyError> {
    check_path(&path)?;

    let upstream = state
        .client()
        .get(state.hls_url(&path, query.as_deref()))
        .send()
        .await?;

    let mut response = relay(upstream).await?;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

/// Reject paths that would climb out of the backend's `/hls/` tree.
pub fn check_path(path: &str) -> Result<(), ProxyError> {
    if path.split('/').any(|segment| segment == "..") {
        return Err(ProxyError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Copy status, content type and body of an upstream response.
async fn relay(upstream: reqwest::Response) -> Result<Response, ProxyError> {
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    let body = upstream.bytes().await?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}
