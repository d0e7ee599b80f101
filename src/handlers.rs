//! Request orchestration, independent of the HTTP framework.
//!
//! Each operation runs validate → analyze → persist → respond and ends in a
//! single terminal state. Input checks run before the store is touched, so a
//! rejected request never writes anything.
//!
//! The document store is passed in explicitly as `Option<&Stores>`: `None`
//! means no store is configured and every operation that needs one fails
//! with [`StoreError::Unavailable`].
//!
//! | Operation | Collection | Response |
//! |-----------|------------|----------|
//! | [`validate_idea`] | `ideaanalysis` | `{id, analysis}` |
//! | [`score_deck`] | `deckanalysis` | `{id, scorecard}` |
//! | [`list_reports`] | both of the above | `{ideas, decks}` |
//! | [`submit_contact`] | `contactmessage` | `{status: "received", id}` |
//! | [`database_status`] | all | [`StatusReport`] |

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use startupmate_core::analysis::{analyze_deck, analyze_idea, is_detailed_idea};
use startupmate_core::models::{ContactMessage, DeckAnalysis, IdeaAnalysis};
use startupmate_core::schema::{validate, validate_value, ValidationError};
use startupmate_core::store::{DocumentBackend, DocumentId, Store, StoreError, Stored};

use crate::config::Config;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Deck upload types accepted by [`score_deck`], matched exactly.
pub const ACCEPTED_DECK_TYPES: [&str; 3] = [MIME_PDF, MIME_PPTX, MIME_DOCX];

/// Collections listed by the status report.
const STATUS_COLLECTIONS_SHOWN: usize = 10;

pub fn is_accepted_deck_type(mime_type: &str) -> bool {
    ACCEPTED_DECK_TYPES.contains(&mime_type)
}

/// Typed store handles for every document kind, over one backend.
pub struct Stores {
    backend: Arc<dyn DocumentBackend>,
    pub ideas: Store<IdeaAnalysis>,
    pub decks: Store<DeckAnalysis>,
    pub contacts: Store<ContactMessage>,
}

impl Stores {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            ideas: Store::new(backend.clone()),
            decks: Store::new(backend.clone()),
            contacts: Store::new(backend.clone()),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<dyn DocumentBackend> {
        &self.backend
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The client sent something unusable; never retried.
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn require(stores: Option<&Stores>) -> Result<&Stores, ApiError> {
    stores.ok_or_else(|| {
        StoreError::Unavailable("document store is not configured".to_string()).into()
    })
}

#[derive(Debug, Serialize)]
pub struct IdeaResponse {
    pub id: DocumentId,
    pub analysis: IdeaAnalysis,
}

#[derive(Debug, Serialize)]
pub struct DeckResponse {
    pub id: DocumentId,
    pub scorecard: DeckAnalysis,
}

#[derive(Debug, Serialize)]
pub struct ReportsResponse {
    pub ideas: Vec<Stored<IdeaAnalysis>>,
    pub decks: Vec<Stored<DeckAnalysis>>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub status: &'static str,
    pub id: DocumentId,
}

/// An uploaded deck: declared metadata plus at most the preview prefix of
/// its content.
#[derive(Debug, Clone, Default)]
pub struct DeckUpload {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    pub content: Vec<u8>,
}

/// Analyzes and stores a startup idea.
#[tracing::instrument(name = "validate idea", skip_all)]
pub async fn validate_idea(
    stores: Option<&Stores>,
    idea: &str,
) -> Result<IdeaResponse, ApiError> {
    let idea = idea.trim();
    if !is_detailed_idea(idea) {
        return Err(ApiError::InvalidInput(
            "Please provide a more detailed idea (at least 10 characters).".to_string(),
        ));
    }
    let stores = require(stores)?;

    let doc = validate::<IdeaAnalysis>(&analyze_idea(idea))?;
    let id = stores.ideas.insert(&doc).await?;
    info!(%id, "stored idea analysis");

    Ok(IdeaResponse {
        id,
        analysis: doc.into_inner(),
    })
}

/// Scores and stores an uploaded pitch deck.
#[tracing::instrument(
    name = "score deck",
    skip_all,
    fields(filename = ?upload.filename, mime_type = ?upload.mime_type)
)]
pub async fn score_deck(
    stores: Option<&Stores>,
    upload: &DeckUpload,
) -> Result<DeckResponse, ApiError> {
    let mime_type = upload.mime_type.as_deref().unwrap_or_default();
    if !is_accepted_deck_type(mime_type) {
        return Err(ApiError::InvalidInput(
            "Unsupported file type. Upload PDF, PPTX, or DOCX.".to_string(),
        ));
    }
    let stores = require(stores)?;

    let fields = analyze_deck(
        upload.filename.as_deref(),
        upload.mime_type.as_deref(),
        &upload.content,
    );
    let doc = validate::<DeckAnalysis>(&fields)?;
    let id = stores.decks.insert(&doc).await?;
    info!(%id, "stored deck scorecard");

    Ok(DeckResponse {
        id,
        scorecard: doc.into_inner(),
    })
}

/// Lists up to `limit` recent ideas and decks, newest first.
#[tracing::instrument(name = "list reports", skip(stores))]
pub async fn list_reports(
    stores: Option<&Stores>,
    limit: usize,
) -> Result<ReportsResponse, ApiError> {
    let stores = require(stores)?;
    let ideas = stores.ideas.list(limit).await?;
    let decks = stores.decks.list(limit).await?;
    Ok(ReportsResponse { ideas, decks })
}

/// Validates and stores a contact-form message.
#[tracing::instrument(name = "submit contact", skip_all)]
pub async fn submit_contact(
    stores: Option<&Stores>,
    body: &Value,
) -> Result<ContactResponse, ApiError> {
    let msg = validate_value::<ContactMessage>(body)?;
    let stores = require(stores)?;
    let id = stores.contacts.insert(&msg).await?;
    info!(%id, "stored contact message");
    Ok(ContactResponse {
        status: "received",
        id,
    })
}

/// Health of the backend and its document store.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

/// Reports whether the store is configured and reachable. Never fails.
pub async fn database_status(config: &Config, stores: Option<&Stores>) -> StatusReport {
    let set_or_not =
        |v: &Option<String>| (if v.is_some() { "set" } else { "not set" }).to_string();
    let mut report = StatusReport {
        backend: "running".to_string(),
        database: "not available".to_string(),
        database_url: set_or_not(&config.db.url),
        database_name: set_or_not(&config.db.name),
        connection_status: "not connected".to_string(),
        collections: Vec::new(),
    };

    let Some(stores) = stores else {
        if config.db.is_configured() {
            report.database = "configured but not initialized".to_string();
        }
        return report;
    };

    report.connection_status = "connected".to_string();
    match stores.backend().collection_names().await {
        Ok(mut names) => {
            names.truncate(STATUS_COLLECTIONS_SHOWN);
            report.collections = names;
            report.database = "connected and working".to_string();
        }
        Err(e) => {
            warn!(error = %e, "document store status check failed");
            let detail: String = e.to_string().chars().take(80).collect();
            report.database = format!("connected but error: {}", detail);
        }
    }
    report
}
