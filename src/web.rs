use std::fs::Metadata;
use std::io;
use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tokio::fs::File;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::parse_delay_input;
use crate::error::Error;
use crate::snapshot::Snapshot;
use crate::state::SlideshowState;

#[derive(Clone)]
struct AppState {
    slideshow: Arc<SlideshowState>,
}

/// Routes for the viewer page, the JSON control API and image bytes.
pub fn router(slideshow: Arc<SlideshowState>) -> Router {
    Router::new()
        .route("/", get(viewer))
        .route("/viewer", get(viewer))
        .route("/api/state", get(api_state))
        .route("/api/set_delay", post(api_set_delay))
        .route("/api/start", post(api_start))
        .route("/api/stop", post(api_stop))
        .route("/api/reset", post(api_reset))
        .route("/images/{index}/{name}", get(serve_image))
        .with_state(AppState { slideshow })
}

/// Serve until `cancel` fires.
pub async fn serve(
    slideshow: Arc<SlideshowState>,
    bind_addr: SocketAddr,
    cancel: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind slideshow server on {bind_addr}"))?;
    info!(%bind_addr, "slideshow server listening");

    let shutdown = cancel.clone();
    axum::serve(listener, router(slideshow).into_make_service())
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await
        .context("slideshow server exited")?;
    Ok(())
}

async fn viewer() -> Html<String> {
    Html(layout(VIEWER_BODY))
}

async fn api_state(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.slideshow.snapshot())
}

async fn api_set_delay(State(state): State<AppState>, body: Bytes) -> Response {
    // A missing or unparseable body behaves like an empty object.
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let result = parse_delay_input(payload.get("delay_ms"))
        .and_then(|delay_ms| state.slideshow.set_delay(delay_ms));
    command_response("set_delay", result)
}

async fn api_start(State(state): State<AppState>) -> Response {
    command_response("start", state.slideshow.start())
}

async fn api_stop(State(state): State<AppState>) -> Response {
    state.slideshow.stop();
    command_response("stop", Ok(()))
}

async fn api_reset(State(state): State<AppState>) -> Response {
    state.slideshow.reset();
    command_response("reset", Ok(()))
}

async fn serve_image(
    State(state): State<AppState>,
    Path((index, name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let Ok(index) = index.parse::<usize>() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(path) = state.slideshow.image_path(index, &name) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(err) => return read_failure(&path, &err),
    };
    let meta = match file.metadata().await {
        Ok(meta) => meta,
        Err(err) => return read_failure(&path, &err),
    };

    let etag = entity_tag(&meta);
    if matches_if_none_match(&headers, &etag) {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }
    (
        [
            (header::CONTENT_TYPE, content_type(&path).to_owned()),
            (header::CONTENT_LENGTH, meta.len().to_string()),
            (header::ETAG, etag),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

fn read_failure(path: &FsPath, err: &io::Error) -> Response {
    if err.kind() == io::ErrorKind::NotFound {
        debug!(path = %path.display(), "image vanished before it could be served");
        return StatusCode::NOT_FOUND.into_response();
    }
    warn!(path = %path.display(), error = %err, "failed to read image");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

/// Strong validator built from size and modification time.
fn entity_tag(meta: &Metadata) -> String {
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());
    format!("\"{:x}-{:x}\"", meta.len(), mtime)
}

fn matches_if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|tag| tag.trim().trim_start_matches("W/"))
        .any(|tag| tag == "*" || tag == etag)
}

fn command_response(command: &'static str, result: Result<(), Error>) -> Response {
    match result {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(err) => {
            debug!(command, error = %err, "command rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

fn content_type(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "apng" => "image/apng",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "jpeg" | "jpg" => "image/jpeg",
        "png" => "image/png",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"><title>Slideshow</title><style>{}</style></head><body><main>{}</main></body></html>",
        styles(),
        body
    )
}

fn styles() -> &'static str {
    "body { font-family: sans-serif; margin: 0; background: #111; color: #eee; }\nmain { display: flex; flex-direction: column; align-items: center; min-height: 100vh; padding: 16px; box-sizing: border-box; }\n#slide { max-width: 100%; max-height: 80vh; object-fit: contain; }\n.controls { margin-top: 12px; display: flex; gap: 8px; align-items: center; }\n.controls button { padding: 6px 12px; border-radius: 4px; border: 1px solid #1976d2; background: #2196f3; color: #fff; cursor: pointer; }\n.controls input { width: 7em; }\n#status { margin-top: 8px; }\n#error { color: #ef9a9a; }"
}

const VIEWER_BODY: &str = r#"<img id="slide" alt="">
<p id="status">Loading…</p>
<p id="error"></p>
<div class="controls">
<button data-cmd="start">Start</button>
<button data-cmd="stop">Stop</button>
<button data-cmd="reset">Reset</button>
<input id="delay" type="number" min="250" step="50"> ms
<button id="set-delay">Set delay</button>
</div>
<script>
const slide = document.getElementById('slide');
const statusLine = document.getElementById('status');
const errorLine = document.getElementById('error');
async function post(path, body) {
  const res = await fetch(path, { method: 'POST', headers: { 'Content-Type': 'application/json' }, body: JSON.stringify(body || {}) });
  const data = await res.json();
  errorLine.textContent = data.error || '';
  refresh();
}
async function refresh() {
  const res = await fetch('/api/state');
  const state = await res.json();
  statusLine.textContent = state.status;
  if (state.current_image) {
    if (slide.getAttribute('src') !== state.current_image.url) slide.src = state.current_image.url;
    slide.alt = state.current_image.name;
  } else {
    slide.removeAttribute('src');
  }
  const delay = document.getElementById('delay');
  if (document.activeElement !== delay) delay.value = state.delay_ms;
}
document.querySelectorAll('[data-cmd]').forEach(b => b.addEventListener('click', () => post('/api/' + b.dataset.cmd)));
document.getElementById('set-delay').addEventListener('click', () => post('/api/set_delay', { delay_ms: document.getElementById('delay').value }));
refresh();
setInterval(refresh, 500);
</script>"#;
