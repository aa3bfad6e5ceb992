//! HTTP server exposing the dictionary as a small REST API.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{any, delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, trace, warn};

use crate::{
    connection::{self, ServeOptions},
    dictionary::{Dictionary, Entry},
    error::{DictionaryError, ServerError},
    middleware::{
        create_cors_layer, create_timeout_layer, preflight_middleware, reject_head,
        request_logging_middleware,
    },
    settings::Settings,
    shutdown,
};

/// Text served on `/` and on any unknown path.
pub const WELCOME: &str = "Dictionary API\n\n\
Available routes:\n\
- POST   /add\n\
- PUT    /update\n\
- DELETE /remove\n\
- DELETE /removeall\n\
- GET    /list\n\
- GET    /search\n\
- GET    /count\n\
- GET    /health\n";

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub dictionary: Arc<Dictionary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn json(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub total_mots: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct RemoveParams {
    #[serde(default)]
    mot: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

/// Create the HTTP router with all endpoints and middleware.
///
/// Each path accepts exactly one method; other methods get 405 from the
/// method router. `get` routes would also answer `HEAD`, so those are
/// guarded separately. Unknown paths fall back to the welcome text.
pub fn create_router(dictionary: Arc<Dictionary>, settings: &Settings) -> Router {
    let state = AppState { dictionary };

    Router::new()
        .route("/list", get(list_words))
        .route("/search", get(search_words))
        .route("/count", get(count_words))
        .route("/health", get(health_check))
        .route_layer(middleware::from_fn(reject_head))
        .route("/", any(home))
        .route("/add", post(add_word))
        .route("/update", put(update_word))
        .route("/remove", delete(remove_word))
        .route("/removeall", delete(remove_all_words))
        .fallback(home)
        .with_state(state)
        // Outermost first: CORS sees every request, logging runs just before
        // dispatch.
        .layer(
            ServiceBuilder::new()
                .layer(create_cors_layer(&settings.cors))
                .layer(middleware::from_fn(preflight_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(create_timeout_layer(settings.server.request_timeout()))
                .layer(middleware::from_fn(request_logging_middleware)),
        )
}

async fn home() -> &'static str {
    WELCOME
}

/// Decode an entry from the raw body. The `Content-Type` header is not
/// consulted.
fn decode_entry(body: &[u8]) -> Result<Entry, DictionaryError> {
    serde_json::from_slice(body)
        .map_err(|e| DictionaryError::InvalidInput(format!("invalid JSON body: {}", e)))
}

#[instrument(skip_all)]
async fn add_word(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>), DictionaryError> {
    let entry = decode_entry(&body)?;
    let word = entry.word.clone();
    state.dictionary.add(entry.word, entry.definition)?;

    info!(%word, "word added");
    Ok((StatusCode::CREATED, MessageResponse::json("word added")))
}

#[instrument(skip_all)]
async fn update_word(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, DictionaryError> {
    let entry = decode_entry(&body)?;
    let word = entry.word.clone();
    state.dictionary.update(entry.word, entry.definition)?;

    info!(%word, "word updated");
    Ok(MessageResponse::json("word updated"))
}

#[instrument(skip(state))]
async fn remove_word(
    State(state): State<AppState>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<MessageResponse>, DictionaryError> {
    state.dictionary.remove(&params.mot)?;

    info!(word = %params.mot, "word removed");
    Ok(MessageResponse::json("word removed"))
}

#[instrument(skip(state))]
async fn remove_all_words(State(state): State<AppState>) -> Json<MessageResponse> {
    state.dictionary.remove_all();

    warn!("all words removed");
    MessageResponse::json("all words removed")
}

async fn list_words(State(state): State<AppState>) -> Json<Vec<Entry>> {
    Json(state.dictionary.list())
}

#[instrument(skip(state))]
async fn search_words(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Entry>>, DictionaryError> {
    Ok(Json(state.dictionary.search(&params.query)?))
}

async fn count_words(State(state): State<AppState>) -> Json<CountResponse> {
    Json(CountResponse {
        total_mots: state.dictionary.count(),
    })
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Serve `app` on `listener` until `shutdown` is cancelled, then drain
/// in-flight requests for at most `options.drain_timeout`.
///
/// Every connection is bounded by `options.read_timeout` for request headers
/// and closed after `options.idle_timeout` without a request. Returns
/// [`ServerError::ShutdownTimeout`] when the drain overruns.
pub async fn run(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
    options: ServeOptions,
) -> Result<(), ServerError> {
    let builder = connection::http1_builder(&options);
    let connections = TaskTracker::new();

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            },
            _ = shutdown.cancelled() => break,
        };

        trace!(%peer, "connection accepted");
        connections.spawn(connection::serve_connection(
            builder.clone(),
            stream,
            app.clone(),
            options,
            shutdown.clone(),
        ));
    }

    drop(listener);
    connections.close();

    info!(timeout = ?options.drain_timeout, "draining in-flight requests");
    match tokio::time::timeout(options.drain_timeout, connections.wait()).await {
        Ok(()) => {
            info!("Server stopped cleanly");
            Ok(())
        }
        Err(_) => {
            error!("Shutdown did not complete within {:?}", options.drain_timeout);
            Err(ServerError::ShutdownTimeout(options.drain_timeout))
        }
    }
}

/// Fill `dictionary` from `path` if the file can be read.
///
/// A missing or malformed file is logged and leaves the store empty.
pub async fn load_initial(dictionary: &Arc<Dictionary>, path: &Path) {
    let store = Arc::clone(dictionary);
    let target = path.to_path_buf();
    match tokio::task::spawn_blocking(move || store.load_from_file(&target)).await {
        Ok(Ok(count)) => info!(count, path = %path.display(), "dictionary loaded"),
        Ok(Err(e)) => warn!("No saved dictionary loaded, starting empty: {}", e),
        Err(e) => warn!("Dictionary load task failed, starting empty: {}", e),
    }
}

/// Create the store, load it from the configured data file and build the
/// router around it.
pub async fn build(settings: &Settings) -> (Arc<Dictionary>, Router) {
    let dictionary = Arc::new(Dictionary::new());
    load_initial(&dictionary, &settings.storage.data_file).await;
    let app = create_router(Arc::clone(&dictionary), settings);
    (dictionary, app)
}

/// Load the dictionary, start the HTTP server and wait for a shutdown signal.
pub async fn serve(settings: &Settings) -> Result<(), ServerError> {
    let (dictionary, app) = build(settings).await;
    let data_file: PathBuf = settings.storage.data_file.clone();

    let addr = settings.server.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("Dictionary server listening on http://{}", listener.local_addr()?);

    let token = CancellationToken::new();
    tokio::spawn(shutdown::save_then_cancel(
        shutdown::wait_for_signal(),
        dictionary,
        data_file,
        token.clone(),
    ));

    run(listener, app, token, ServeOptions::from(&settings.server)).await
}
