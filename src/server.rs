//! HTTP server.
//!
//! Thin axum layer over [`handlers`](crate::handlers): it extracts request
//! data, calls the matching operation and maps [`ApiError`] onto the JSON
//! error contract.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness banner |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/test` | Document store status report |
//! | `POST` | `/api/validate-idea` | Analyze and store `{idea}` |
//! | `POST` | `/api/score-deck` | Score a multipart upload (field `file`) |
//! | `GET`  | `/api/reports` | Recent ideas and decks, `?limit=N` |
//! | `POST` | `/api/contact` | Store a contact-form message |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "validation_failed", "message": "...",
//!              "details": [ { "field": "email",
//!                             "reason": "value is not a valid email address" } ] } }
//! ```
//!
//! Error codes: `bad_request` (400), `validation_failed` (400),
//! `store_unavailable` (503), `internal` (500). `details` is only present
//! for `validation_failed`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use startupmate_core::analysis::PREVIEW_BYTES;
use startupmate_core::schema::Violation;
use startupmate_core::store::{DocumentBackend, StoreError};

use crate::config::{Config, DbConfig};
use crate::handlers::{self, ApiError, DeckUpload, Stores};
use crate::sqlite_store::SqliteBackend;

/// Multipart field carrying the deck.
const UPLOAD_FIELD: &str = "file";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    /// `None` when no document store is configured or it failed to open.
    stores: Option<Arc<Stores>>,
}

impl AppState {
    pub fn new(config: Config, backend: Option<Arc<dyn DocumentBackend>>) -> Self {
        Self {
            config: Arc::new(config),
            stores: backend.map(|b| Arc::new(Stores::new(b))),
        }
    }

    fn stores(&self) -> Option<&Stores> {
        self.stores.as_deref()
    }
}

/// Opens the SQLite document store if `[db]` is configured.
///
/// Failures are logged and yield `None`: the server still starts and store
/// operations answer 503.
pub async fn open_backend(config: &DbConfig) -> Option<Arc<dyn DocumentBackend>> {
    if !config.is_configured() {
        warn!("DATABASE_URL or DATABASE_NAME not set; running without a document store");
        return None;
    }
    match SqliteBackend::connect(config).await {
        Ok(backend) => {
            info!(database = backend.database(), "document store connected");
            Some(Arc::new(backend))
        }
        Err(e) => {
            error!(error = %e, "failed to open document store");
            None
        }
    }
}

/// Builds the router with every endpoint and the CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/test", get(handle_status))
        .route("/api/validate-idea", post(handle_validate_idea))
        .route("/api/score-deck", post(handle_score_deck))
        .route("/api/reports", get(handle_reports))
        .route("/api/contact", post(handle_contact))
        .layer(cors)
        .with_state(state)
}

/// Serves `state` on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Starts the HTTP server.
///
/// Binds to `[server].bind`, opens the document store when configured and
/// runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let backend = open_backend(&config.db).await;
    let listener = TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "StartupMate listening");
    serve(listener, AppState::new(config.clone(), backend)).await
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"store_unavailable"`).
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<Violation>>,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    details: Option<Vec<Violation>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code: code.to_string(),
        message: message.into(),
        details: None,
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    app_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidInput(message) => bad_request(message),
            ApiError::Validation(e) => AppError {
                details: Some(e.violations().to_vec()),
                ..app_error(StatusCode::BAD_REQUEST, "validation_failed", e.to_string())
            },
            ApiError::Store(e @ StoreError::Unavailable(_)) => {
                warn!(error = %e, "request failed: store unavailable");
                app_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", e.to_string())
            }
            ApiError::Store(e @ StoreError::Decode { .. }) => {
                error!(error = %e, "request failed");
                app_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string())
            }
        }
    }
}

// ============ Handlers ============

async fn handle_root() -> Json<Value> {
    Json(json!({ "message": "StartupMate Backend Running" }))
}

async fn handle_health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn handle_status(State(state): State<AppState>) -> Json<handlers::StatusReport> {
    Json(handlers::database_status(&state.config, state.stores()).await)
}

#[derive(Deserialize)]
struct IdeaRequest {
    #[serde(default)]
    idea: String,
}

async fn handle_validate_idea(
    State(state): State<AppState>,
    body: Result<Json<IdeaRequest>, JsonRejection>,
) -> Result<Json<handlers::IdeaResponse>, AppError> {
    let Json(req) = body.map_err(|e| bad_request(e.body_text()))?;
    Ok(Json(handlers::validate_idea(state.stores(), &req.idea).await?))
}

async fn handle_score_deck(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<handlers::DeckResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| bad_request(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let upload = read_upload(field).await?;
        return Ok(Json(handlers::score_deck(state.stores(), &upload).await?));
    }

    Err(bad_request(format!(
        "multipart field '{}' is required",
        UPLOAD_FIELD
    )))
}

/// Reads the upload metadata and at most [`PREVIEW_BYTES`] of its content.
async fn read_upload(mut field: Field<'_>) -> Result<DeckUpload, AppError> {
    let mut upload = DeckUpload {
        filename: field.file_name().map(str::to_string),
        mime_type: field.content_type().map(str::to_string),
        content: Vec::new(),
    };

    while upload.content.len() < PREVIEW_BYTES {
        match field
            .chunk()
            .await
            .map_err(|e| bad_request(e.body_text()))?
        {
            Some(chunk) => upload.content.extend_from_slice(&chunk),
            None => break,
        }
    }
    upload.content.truncate(PREVIEW_BYTES);
    Ok(upload)
}

#[derive(Deserialize)]
struct ReportsQuery {
    limit: Option<usize>,
}

async fn handle_reports(
    State(state): State<AppState>,
    query: Result<Query<ReportsQuery>, QueryRejection>,
) -> Result<Json<handlers::ReportsResponse>, AppError> {
    let Query(query) = query.map_err(|e| bad_request(e.body_text()))?;
    let limit = query.limit.unwrap_or(state.config.reports.default_limit);
    Ok(Json(handlers::list_reports(state.stores(), limit).await?))
}

async fn handle_contact(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<handlers::ContactResponse>, AppError> {
    let Json(body) = body.map_err(|e| bad_request(e.body_text()))?;
    Ok(Json(handlers::submit_contact(state.stores(), &body).await?))
}
