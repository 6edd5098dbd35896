//! Static file server over the output directory, with live reload in
//! development mode.

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use clap::ValueEnum;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

/// WebSocket endpoint the injected client connects to
pub const RELOAD_ENDPOINT: &str = "/__inkwell/reload";

const RELOAD_SCRIPT: &str = r#"<script>
(() => {
  const proto = location.protocol === "https:" ? "wss:" : "ws:";
  const connect = () => {
    const socket = new WebSocket(`${proto}//${location.host}/__inkwell/reload`);
    socket.onmessage = (event) => {
      const msg = JSON.parse(event.data);
      if (msg.type === "full-reload") location.reload();
    };
    socket.onclose = () => setTimeout(connect, 1000);
  };
  connect();
})();
</script>
"#;

/// Whether the server is part of the dev loop or just serves a finished build
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServeMode {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    path: &'static str,
}

impl ReloadMessage {
    fn full_reload() -> Self {
        Self {
            kind: "full-reload",
            path: "*",
        }
    }
}

/// Fan-out of reload signals to every connected browser
#[derive(Debug, Clone)]
pub struct LiveReload {
    tx: broadcast::Sender<ReloadMessage>,
}

impl LiveReload {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.tx.subscribe()
    }

    /// Tell every client to reload. Returns how many were listening.
    pub fn broadcast(&self) -> usize {
        self.tx.send(ReloadMessage::full_reload()).unwrap_or(0)
    }
}

impl Default for LiveReload {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    output_dir: PathBuf,
    mode: ServeMode,
    reload: LiveReload,
}

impl AppState {
    pub fn new(output_dir: PathBuf, mode: ServeMode, reload: LiveReload) -> Self {
        Self {
            output_dir,
            mode,
            reload,
        }
    }
}

/// Build the router for `state`
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(serve_file))
        .route("/{*path}", get(serve_file));

    if state.mode == ServeMode::Development {
        app = app.route(RELOAD_ENDPOINT, get(reload_socket));
    }

    app.fallback(serve_404)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve until the process is stopped
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, router(state))
        .await
        .context("Server error")
}

/// Ways a request path can map onto a file, tried in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// The path names a file as-is
    Exact,
    /// No extension and nothing on disk: try `<path>.html`
    HtmlSuffix,
    /// The path is a directory: try `<path>/index.html`
    DirectoryIndex,
}

const RESOLUTION_ORDER: [Resolution; 3] = [
    Resolution::Exact,
    Resolution::HtmlSuffix,
    Resolution::DirectoryIndex,
];

/// Map a URL path onto a file inside `root`.
///
/// `/` is the index page. Each segment is percent-decoded before it is
/// checked, and paths that try to leave `root` never resolve.
pub async fn resolve_request(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = relative_request_path(request_path)?;
    let base = root.join(&relative);
    let base_meta = fs::metadata(&base).await.ok();
    let has_extension = relative.extension().is_some();

    for strategy in RESOLUTION_ORDER {
        let candidate = match strategy {
            Resolution::Exact => Some(base.clone()),
            Resolution::HtmlSuffix if !has_extension && base_meta.is_none() => {
                let mut with_suffix = base.clone().into_os_string();
                with_suffix.push(".html");
                Some(PathBuf::from(with_suffix))
            }
            Resolution::DirectoryIndex if base_meta.as_ref().is_some_and(|m| m.is_dir()) => {
                Some(base.join(inkwell_core::INDEX_FILE))
            }
            _ => None,
        };

        if let Some(candidate) = candidate {
            if is_file(&candidate).await {
                tracing::trace!(?strategy, path = %candidate.display(), "resolved request");
                return Some(candidate);
            }
        }
    }

    None
}

fn relative_request_path(request_path: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for segment in request_path.split('/') {
        let segment = percent_decode_str(segment).decode_utf8().ok()?;
        if segment.contains(['/', '\\', '\0']) {
            return None;
        }
        match Path::new(segment.as_ref()).components().next() {
            None | Some(Component::CurDir) => continue,
            Some(Component::Normal(part)) => clean.push(part),
            Some(Component::ParentDir | Component::RootDir | Component::Prefix(_)) => return None,
        }
    }

    if clean.as_os_str().is_empty() {
        Some(PathBuf::from(inkwell_core::INDEX_FILE))
    } else {
        Some(clean)
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

/// Content-Type for a served file, by extension
pub fn content_type_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => "text/plain",
    }
}

/// Insert the reload client before the last `</body>`.
///
/// Documents without a closing body tag, or that are not UTF-8, are returned
/// unchanged.
pub fn inject_reload_script(body: Vec<u8>) -> Vec<u8> {
    let mut html = match String::from_utf8(body) {
        Ok(html) => html,
        Err(err) => return err.into_bytes(),
    };
    if let Some(pos) = html.rfind("</body>") {
        html.insert_str(pos, RELOAD_SCRIPT);
    }
    html.into_bytes()
}

async fn serve_file(State(state): State<AppState>, uri: Uri) -> Response {
    let Some(path) = resolve_request(&state.output_dir, uri.path()).await else {
        return serve_404_inner(&state).await;
    };

    let mut body = match fs::read(&path).await {
        Ok(body) => body,
        Err(err) => {
            tracing::debug!("Failed to read {:?}: {}", path, err);
            return serve_404_inner(&state).await;
        }
    };

    let content_type = content_type_for_path(&path);
    if state.mode == ServeMode::Development && content_type == "text/html" {
        body = inject_reload_script(body);
    }

    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

async fn serve_404(State(state): State<AppState>) -> Response {
    serve_404_inner(&state).await
}

async fn serve_404_inner(state: &AppState) -> Response {
    let not_found_path = state.output_dir.join("404.html");

    match fs::read(&not_found_path).await {
        Ok(content) => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/html")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn reload_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let rx = state.reload.subscribe();
    ws.on_upgrade(move |socket| handle_reload_socket(socket, rx))
}

async fn handle_reload_socket(mut socket: WebSocket, mut rx: broadcast::Receiver<ReloadMessage>) {
    loop {
        tokio::select! {
            recv = rx.recv() => {
                let msg = match recv {
                    Ok(msg) => msg,
                    // Missed signals still mean the page is stale
                    Err(broadcast::error::RecvError::Lagged(_)) => ReloadMessage::full_reload(),
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Ok(text) = serde_json::to_string(&msg) else {
                    continue;
                };
                if socket.send(WsMessage::Text(text.into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }
}
