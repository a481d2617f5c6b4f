//! Development server for the output tree.
//!
//! Serves static files over HTTP with permissive CORS, and holds a
//! server-sent-events channel open to connected browsers so the watcher can
//! push full reloads and in-place stylesheet refreshes. Served HTML gets a
//! small client script injected before `</body>` that subscribes to the
//! channel.

use crate::config::ServerConfig;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Path of the live-update event stream.
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// Error starting or running the dev server.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServeError {
    /// Could not bind the listening socket
    #[error("Failed to bind dev server on port {port}: {message}")]
    Bind {
        /// Requested port
        port: u16,
        /// Listener error
        message: String,
    },
}

/// Event pushed to connected browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Full page reload
    Reload,
    /// Swap stylesheets in place, no reload
    RefreshCss,
}

impl ReloadEvent {
    fn sse_name(&self) -> &'static str {
        match self {
            ReloadEvent::Reload => "reload",
            ReloadEvent::RefreshCss => "refreshcss",
        }
    }
}

/// Broadcast hub connecting the watcher to open browser tabs.
///
/// Subscribers register a channel sender; dead subscribers are pruned when a
/// broadcast fails to reach them.
#[derive(Default)]
pub struct ReloadHub {
    clients: Mutex<Vec<Sender<ReloadEvent>>>,
}

impl ReloadHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> Receiver<ReloadEvent> {
        let (tx, rx) = channel();
        if let Ok(mut clients) = self.clients.lock() {
            clients.push(tx);
        }
        rx
    }

    /// Push an event to every connected subscriber.
    pub fn broadcast(&self, event: ReloadEvent) {
        if let Ok(mut clients) = self.clients.lock() {
            clients.retain(|tx| tx.send(event).is_ok());
        }
    }

    /// Number of currently registered subscribers.
    pub fn client_count(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }
}

/// Client script injected into served HTML documents.
const LIVERELOAD_SCRIPT: &str = concat!(
    "<script>(function(){",
    "var es=new EventSource(\"/__livereload\");",
    "es.addEventListener(\"reload\",function(){location.reload();});",
    "es.addEventListener(\"refreshcss\",function(){",
    "var links=document.querySelectorAll(\"link[rel=stylesheet]\");",
    "for(var i=0;i<links.length;i++){var l=links[i];",
    "l.href=l.href.replace(/[?&]_lr=\\d+|$/,(l.href.indexOf(\"?\")<0?\"?\":\"&\")+\"_lr=\"+Date.now());}",
    "});})();</script>"
);

/// Start the dev server on 127.0.0.1 and serve until the process exits.
///
/// Each request is handled on its own thread because event-stream
/// connections stay open for the lifetime of the browser tab.
pub fn serve(root: PathBuf, config: &ServerConfig, hub: Arc<ReloadHub>) -> Result<(), ServeError> {
    let addr = format!("127.0.0.1:{}", config.port);
    let server = Server::http(&addr)
        .map_err(|e| ServeError::Bind { port: config.port, message: e.to_string() })?;

    println!("Serving {} at http://{}", root.display(), addr);

    let root = Arc::new(root);
    let cors = config.cors;
    for request in server.incoming_requests() {
        let root = Arc::clone(&root);
        let hub = Arc::clone(&hub);
        thread::spawn(move || handle_request(request, &root, cors, &hub));
    }
    Ok(())
}

fn handle_request(request: Request, root: &Path, cors: bool, hub: &ReloadHub) {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");

    if path == LIVERELOAD_PATH {
        respond_event_stream(request, cors, hub);
        return;
    }

    match resolve(root, path) {
        Some(file) => respond_file(request, &file, cors),
        None => {
            let response = Response::from_string("404 Not Found").with_status_code(404);
            let _ = request.respond(with_cors(response, cors));
        }
    }
}

/// Map a URL path onto the output tree, rejecting traversal outside it.
fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let trimmed = url_path.trim_start_matches('/');
    let relative = Path::new(trimmed);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let mut file = root.join(relative);
    if file.is_dir() || trimmed.is_empty() {
        file = file.join("index.html");
    }
    if file.is_file() {
        Some(file)
    } else {
        None
    }
}

fn respond_file(request: Request, file: &Path, cors: bool) {
    let bytes = match std::fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            let response =
                Response::from_string(format!("500 {}", e)).with_status_code(500);
            let _ = request.respond(with_cors(response, cors));
            return;
        }
    };

    let mime = content_type(file);
    let body = if mime == "text/html" { inject_livereload(bytes) } else { bytes };

    let mut response = Response::from_data(body);
    if let Some(header) = header("Content-Type", mime) {
        response = response.with_header(header);
    }
    let _ = request.respond(with_cors(response, cors));
}

/// Hold the connection open and forward hub events as SSE messages. Returns
/// when the client goes away (the blocked write fails).
fn respond_event_stream(request: Request, cors: bool, hub: &ReloadHub) {
    let rx = hub.subscribe();
    let stream = SseStream::new(rx);

    let mut headers = Vec::new();
    for (name, value) in
        [("Content-Type", "text/event-stream"), ("Cache-Control", "no-cache")]
    {
        if let Some(h) = header(name, value) {
            headers.push(h);
        }
    }
    if cors {
        if let Some(h) = header("Access-Control-Allow-Origin", "*") {
            headers.push(h);
        }
    }

    let response = Response::new(StatusCode(200), headers, stream, None, None);
    let _ = request.respond(response);
}

fn header(name: &str, value: &str) -> Option<Header> {
    format!("{}: {}", name, value).parse().ok()
}

fn with_cors<R: Read>(response: Response<R>, cors: bool) -> Response<R> {
    if cors {
        if let Some(h) = header("Access-Control-Allow-Origin", "*") {
            return response.with_header(h);
        }
    }
    response
}

/// Insert the live-reload client before `</body>`, or append it when the
/// document has no closing body tag.
fn inject_livereload(bytes: Vec<u8>) -> Vec<u8> {
    let mut html = match String::from_utf8(bytes) {
        Ok(html) => html,
        // Not actually UTF-8 text; serve it untouched
        Err(e) => return e.into_bytes(),
    };
    let marker = html.to_ascii_lowercase().rfind("</body>");
    match marker {
        Some(pos) => html.insert_str(pos, LIVERELOAD_SCRIPT),
        None => html.push_str(LIVERELOAD_SCRIPT),
    }
    html.into_bytes()
}

/// Interval between keep-alive comments on an idle event stream.
const SSE_KEEPALIVE: Duration = Duration::from_secs(15);

/// Blocking reader that turns hub events into an SSE byte stream.
struct SseStream {
    rx: Receiver<ReloadEvent>,
    pending: Vec<u8>,
    offset: usize,
    keepalive: Duration,
}

impl SseStream {
    fn new(rx: Receiver<ReloadEvent>) -> Self {
        // Ask the browser to retry quickly if the server restarts
        Self { rx, pending: b"retry: 500\n\n".to_vec(), offset: 0, keepalive: SSE_KEEPALIVE }
    }
}

impl Read for SseStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.offset >= self.pending.len() {
            // Wait for the watcher's next event, but wake periodically to
            // emit an SSE comment: the write to a gone client fails, which
            // ends the handler thread instead of parking it forever
            self.pending = match self.rx.recv_timeout(self.keepalive) {
                Ok(event) => format!("event: {}\ndata: {{}}\n\n", event.sse_name()).into_bytes(),
                Err(RecvTimeoutError::Timeout) => b": ping\n\n".to_vec(),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::BrokenPipe,
                        "hub closed",
                    ))
                }
            };
            self.offset = 0;
        }

        let remaining = &self.pending[self.offset..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.offset += n;
        Ok(n)
    }
}

/// Guess a content type from the file extension.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" | "map" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
