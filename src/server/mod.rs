//! Notebook server with live reload

use anyhow::Result;
use axum::{
    extract::{
        self,
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::ContentRegistry;
use crate::templates::STYLESHEET;
use crate::view::{
    ConceptDetailView, ConceptListView, IndexEntry, Page, PageKind, RouteQuery, Shell,
};
use crate::Notebook;

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Query pairs as sent; repeated keys are allowed
type RawQuery = Query<Vec<(String, String)>>;

/// What a request renders from. Replaced as a whole on reload so a
/// request never mixes an old config with new content.
struct Snapshot {
    notebook: Notebook,
    shell: Arc<Shell>,
    registry: Arc<ContentRegistry>,
}

/// What a changed file affects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Config,
    Content,
    Static,
}

/// Server state
pub struct ServerState {
    /// The notebook as started; routes and watched paths come from here
    notebook: Notebook,
    current: RwLock<Arc<Snapshot>>,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
}

impl ServerState {
    pub fn new(notebook: Notebook, registry: ContentRegistry, live_reload: bool) -> Result<Self> {
        let (reload_tx, _) = broadcast::channel::<()>(16);
        let snapshot = Snapshot {
            shell: Arc::new(Shell::new(&notebook.config)?),
            notebook: notebook.clone(),
            registry: Arc::new(registry),
        };
        Ok(Self {
            notebook,
            current: RwLock::new(Arc::new(snapshot)),
            reload_tx,
            live_reload,
        })
    }

    /// Snapshot for one request
    fn snapshot(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(current) => Arc::clone(&current),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn swap(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        match self.current.write() {
            Ok(mut current) => *current = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    /// Rescan the content directory, re-reading `notebook.yml` first when
    /// it changed. On error the previous snapshot stays in place.
    fn reload(&self, config_changed: bool) -> Result<()> {
        let current = self.snapshot();

        let (notebook, shell) = if config_changed {
            let mut notebook = Notebook::new(&self.notebook.base_dir)?;
            // Routes are mounted once at startup
            if notebook.config.root != self.notebook.config.root {
                tracing::warn!(
                    "Changing root requires a restart, still serving under {}",
                    self.notebook.config.root
                );
                notebook.config.root = self.notebook.config.root.clone();
            }
            let shell = Arc::new(Shell::new(&notebook.config)?);
            (notebook, shell)
        } else {
            (current.notebook.clone(), Arc::clone(&current.shell))
        };

        let registry = Arc::new(notebook.registry()?);
        tracing::info!("Reloaded {} concepts", registry.len());

        self.swap(Snapshot {
            notebook,
            shell,
            registry,
        });
        Ok(())
    }
}

/// Build the router for a notebook, mounted under the configured root
pub fn router(state: Arc<ServerState>) -> Router {
    let static_dir = state.notebook.static_dir.clone();
    let prefix = match state.notebook.config.root.trim_matches('/') {
        "" => String::new(),
        root => format!("/{}", root),
    };
    let at = |path: &str| format!("{}{}", prefix, path);

    let mut app = Router::new()
        .route(&at("/"), get(home_handler))
        .route(&at("/concepts/:slug"), get(concept_handler))
        .route(&at("/api/concepts"), get(api_concepts_handler))
        .route(&at("/assets/notebook.css"), get(stylesheet_handler))
        .nest_service(&at("/static"), ServeDir::new(static_dir));
    if !prefix.is_empty() {
        app = app.route(&prefix, get(home_handler));
    }

    app.route("/__livereload", get(livereload_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the notebook server
pub async fn start(notebook: &Notebook, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let registry = notebook.registry()?;
    let state = Arc::new(ServerState::new(notebook.clone(), registry, watch)?);
    let app = router(Arc::clone(&state));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}{}", ip, port, crate::helpers::url_for(&notebook.config.root, ""));
    println!("Server running at {}", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        let watch_state = Arc::clone(&state);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(watch_state) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn classify(notebook: &Notebook, path: &Path) -> Option<Change> {
    let path_str = path.to_string_lossy();
    if path_str.contains(".git") || path_str.contains(".DS_Store") || path_str.ends_with('~') {
        return None;
    }

    if path == notebook.config_path() {
        Some(Change::Config)
    } else if path.starts_with(&notebook.content_dir) {
        Some(Change::Content)
    } else if path.starts_with(&notebook.static_dir) {
        Some(Change::Static)
    } else {
        None
    }
}

/// Reload content or config on change and tell connected browsers
fn watch_and_reload(state: Arc<ServerState>) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rescans
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    // The base directory covers notebook.yml and content or static
    // directories created after startup
    let notebook = &state.notebook;
    debouncer
        .watcher()
        .watch(&notebook.base_dir, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", notebook.base_dir);
    for dir in [&notebook.content_dir, &notebook.static_dir] {
        if dir.exists() && !dir.starts_with(&notebook.base_dir) {
            debouncer.watcher().watch(dir, RecursiveMode::Recursive)?;
            tracing::debug!("Watching: {:?}", dir);
        }
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changes: Vec<Change> = events
                    .iter()
                    .filter_map(|e| {
                        let change = classify(notebook, &e.path)?;
                        tracing::info!("File changed: {}", e.path.display());
                        Some(change)
                    })
                    .collect();

                if changes.is_empty() {
                    continue;
                }

                let config_changed = changes.contains(&Change::Config);
                if config_changed || changes.contains(&Change::Content) {
                    if let Err(e) = state.reload(config_changed) {
                        tracing::error!("Reload failed, keeping previous content: {:#}", e);
                        continue;
                    }
                }

                // No connected clients is not an error
                let _ = state.reload_tx.send(());
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

async fn home_handler(State(state): State<Arc<ServerState>>, Query(pairs): RawQuery) -> Response {
    let site = state.snapshot();
    let query = RouteQuery::from_pairs(pairs);
    let page = site.shell.home(&site.registry, &query);
    respond(&state, page)
}

async fn concept_handler(
    State(state): State<Arc<ServerState>>,
    extract::Path(slug): extract::Path<String>,
    Query(pairs): RawQuery,
) -> Response {
    let site = state.snapshot();
    let query = RouteQuery::from_pairs(pairs);
    let view = ConceptDetailView::open(&site.registry, &slug).await;
    let page = site.shell.concept(&site.registry, &view, &query);
    respond(&state, page)
}

async fn api_concepts_handler(
    State(state): State<Arc<ServerState>>,
    Query(pairs): RawQuery,
) -> Json<Vec<IndexEntry>> {
    let site = state.snapshot();
    let query = RouteQuery::from_pairs(pairs);
    let listing = ConceptListView::new(&site.registry).filter(query.search());
    Json(listing.index(&site.notebook.config.root))
}

async fn stylesheet_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

/// Anything no route matched
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    uri: Uri,
    Query(pairs): RawQuery,
) -> Response {
    let site = state.snapshot();
    let query = RouteQuery::from_pairs(pairs);
    let page = site.shell.not_found(&site.registry, uri.path(), &query);
    respond(&state, page)
}

fn respond(state: &ServerState, page: Page) -> Response {
    let status = match page.kind {
        PageKind::Home | PageKind::Concept | PageKind::Loading => StatusCode::OK,
        PageKind::NotFound => StatusCode::NOT_FOUND,
        PageKind::LoadError | PageKind::Failure => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let html = if state.live_reload {
        inject_live_reload(&page.html)
    } else {
        page.html
    };

    (status, Html(html)).into_response()
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

/// Handle WebSocket connection for live reload
async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replacen("</body>", LIVE_RELOAD_SCRIPT, 1)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::registry::tests::{hooks_registry, CountingSource};
    use crate::content::MarkdownRenderer;
    use axum::body::Body;
    use axum::http::Request;
    use std::fs;
    use tower::ServiceExt;

    fn state_with(registry: ContentRegistry, live_reload: bool) -> (tempfile::TempDir, Arc<ServerState>) {
        let dir = tempfile::tempdir().unwrap();
        let notebook = Notebook::new(dir.path()).unwrap();
        let state = ServerState::new(notebook, registry, live_reload).unwrap();
        (dir, Arc::new(state))
    }

    async fn get(state: &Arc<ServerState>, uri: &str) -> (StatusCode, String) {
        let response = router(Arc::clone(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_home_route() {
        let (_dir, state) = state_with(hooks_registry(), false);
        let (status, body) = get(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h3>use state</h3>"));
        assert!(body.contains("<h3>use effect</h3>"));
        assert!(!body.contains("__livereload"));
    }

    #[tokio::test]
    async fn test_home_search() {
        let (_dir, state) = state_with(hooks_registry(), false);

        let (_, body) = get(&state, "/?search=eff").await;
        assert!(body.contains("<h3>use effect</h3>"));
        assert!(!body.contains("<h3>use state</h3>"));

        let (status, body) = get(&state, "/?search=zzz").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No concepts found"));
    }

    #[tokio::test]
    async fn test_concept_route() {
        let (_dir, state) = state_with(hooks_registry(), false);
        let (status, body) = get(&state, "/concepts/use-effect").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Side effects after render."));
        assert!(!body.contains("Local state for components."));
    }

    #[tokio::test]
    async fn test_unknown_concept_is_404() {
        let (_dir, state) = state_with(hooks_registry(), false);
        let (status, body) = get(&state, "/concepts/use-memo").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Concept not found"));
    }

    #[tokio::test]
    async fn test_failed_load_is_500() {
        let (source, _) = CountingSource::new("never", usize::MAX);
        let registry = ContentRegistry::builder(Arc::new(MarkdownRenderer::new()))
            .register("broken", source)
            .unwrap()
            .build();
        let (_dir, state) = state_with(registry, false);

        let (status, body) = get(&state, "/concepts/broken").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Failed to load concept"));
    }

    #[tokio::test]
    async fn test_unmatched_path_is_404() {
        let (_dir, state) = state_with(hooks_registry(), false);
        let (status, body) = get(&state, "/settings/profile").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("404 - Page Not Found"));
        assert!(body.contains("Go back to Home"));
    }

    #[tokio::test]
    async fn test_api_concepts() {
        let (_dir, state) = state_with(hooks_registry(), false);
        let (status, body) = get(&state, "/api/concepts?search=STATE").await;
        assert_eq!(status, StatusCode::OK);
        let entries: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(entries.as_array().unwrap().len(), 1);
        assert_eq!(entries[0]["slug"], "use-state");
        assert_eq!(entries[0]["path"], "/concepts/use-state");
    }

    #[tokio::test]
    async fn test_stylesheet_and_static_files() {
        let (dir, state) = state_with(hooks_registry(), false);
        let (status, body) = get(&state, "/assets/notebook.css").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(".concept-card"));

        fs::create_dir_all(dir.path().join("static")).unwrap();
        fs::write(dir.path().join("static/demo.txt"), "hello").unwrap();
        let (status, body) = get(&state, "/static/demo.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_live_reload_script_injected() {
        let (_dir, state) = state_with(hooks_registry(), true);
        let (_, body) = get(&state, "/").await;
        assert!(body.contains("__livereload"));
        assert!(body.trim_end().ends_with("</html>"));
    }

    #[tokio::test]
    async fn test_unmatched_path_with_quote_is_escaped() {
        let (_dir, state) = state_with(hooks_registry(), false);
        let (status, body) = get(&state, "/x\"/onmouseover=alert(1)//").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.contains("x\"/onmouseover"));
        assert!(body.contains(r#"href="/x%22/onmouseover%3Dalert%281%29//?menu=open""#));
    }

    #[tokio::test]
    async fn test_repeated_query_key_keeps_first_value() {
        let (_dir, state) = state_with(hooks_registry(), false);
        let (status, body) = get(&state, "/?search=eff&search=zzz").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h3>use effect</h3>"));
        assert!(!body.contains("No concepts found"));

        let (status, body) = get(&state, "/nowhere?menu=open&menu=closed").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Go back to Home"));
    }

    #[tokio::test]
    async fn test_routes_mounted_under_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notebook.yml"), "root: /notes/\n").unwrap();
        let notebook = Notebook::new(dir.path()).unwrap();
        let state = Arc::new(ServerState::new(notebook, hooks_registry(), false).unwrap());

        let (status, body) = get(&state, "/notes/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"href="/notes/concepts/use-state""#));
        assert!(body.contains(r#"href="/notes/assets/notebook.css""#));

        let (status, _) = get(&state, "/notes").await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = get(&state, "/notes/concepts/use-state").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Local state for components."));
        let (status, _) = get(&state, "/notes/assets/notebook.css").await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = get(&state, "/notes/api/concepts").await;
        let entries: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(entries[0]["path"], "/notes/concepts/use-state");

        let (status, _) = get(&state, "/concepts/use-state").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reload_picks_up_content_dir_created_later() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = Notebook::new(dir.path()).unwrap();
        let registry = notebook.registry().unwrap();
        let state = Arc::new(ServerState::new(notebook, registry, false).unwrap());

        let (status, _) = get(&state, "/concepts/closures").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let content = dir.path().join("content/concepts");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("closures.md"), "# Closures").unwrap();
        state.reload(false).unwrap();

        let (status, body) = get(&state, "/concepts/closures").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Closures"));
    }

    #[tokio::test]
    async fn test_reload_applies_config_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("notebook.yml");
        fs::write(&config, "title: Before Title\n").unwrap();
        let notebook = Notebook::new(dir.path()).unwrap();
        let state = Arc::new(ServerState::new(notebook, hooks_registry(), false).unwrap());

        fs::write(&config, "title: After Title\nroot: /moved/\n").unwrap();
        state.reload(true).unwrap();

        let (status, body) = get(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("After Title"));
        assert!(!body.contains("Before Title"));
        // Root stays as started
        assert!(body.contains(r#"href="/assets/notebook.css""#));
    }

    #[test]
    fn test_classify_changes() {
        let dir = tempfile::tempdir().unwrap();
        let notebook = Notebook::new(dir.path()).unwrap();
        let base = dir.path();

        assert_eq!(
            classify(&notebook, &base.join("notebook.yml")),
            Some(Change::Config)
        );
        assert_eq!(
            classify(&notebook, &base.join("content/concepts/a.md")),
            Some(Change::Content)
        );
        assert_eq!(
            classify(&notebook, &base.join("static/site.css")),
            Some(Change::Static)
        );
        assert_eq!(classify(&notebook, &base.join("public/index.html")), None);
        assert_eq!(classify(&notebook, &base.join("content/concepts/a.md~")), None);
    }

    #[test]
    fn test_inject_live_reload() {
        let html = inject_live_reload("<html><body><p>x</p></body></html>");
        assert!(html.contains("new WebSocket"));
        assert_eq!(html.matches("</body>").count(), 1);

        let fragment = inject_live_reload("<p>x</p>");
        assert!(fragment.starts_with("<p>x</p>"));
    }
}
