//! Document kinds persisted by StartupMate.
//!
//! Each type is a flat document stored in its own collection. Its declared
//! [`Schema`] is what the validator enforces; the serde derive is only used
//! to move already-validated maps in and out of the typed representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{Constraint, DefaultValue, Document, FieldSpec, FieldType, Schema, SCORE};

const STRING_LIST: FieldType = FieldType::Sequence(&FieldType::String);

/// Heuristic analysis of a free-text startup idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaAnalysis {
    pub idea: String,
    pub summary: String,
    pub market: String,
    pub target_audience: String,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub score_overall: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

static IDEA_ANALYSIS: Schema = Schema {
    name: "IdeaAnalysis",
    collection: "ideaanalysis",
    fields: &[
        FieldSpec::required("idea", FieldType::String).with(&[Constraint::NonEmpty]),
        FieldSpec::required("summary", FieldType::String),
        FieldSpec::required("market", FieldType::String),
        FieldSpec::required("target_audience", FieldType::String),
        FieldSpec::defaulted("competitors", STRING_LIST, DefaultValue::EmptySequence),
        FieldSpec::defaulted("risks", STRING_LIST, DefaultValue::EmptySequence),
        FieldSpec::defaulted("next_steps", STRING_LIST, DefaultValue::EmptySequence),
        FieldSpec::optional("score_overall", FieldType::Integer).with(&[SCORE]),
        FieldSpec::defaulted("tags", STRING_LIST, DefaultValue::EmptySequence),
    ],
};

impl Document for IdeaAnalysis {
    fn schema() -> &'static Schema {
        &IDEA_ANALYSIS
    }
}

/// Scorecard for an uploaded pitch deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckAnalysis {
    pub filename: String,
    pub mime_type: Option<String>,
    pub size_bytes: Option<u64>,
    pub overall_score: i64,
    #[serde(default)]
    pub category_scores: BTreeMap<String, i64>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub extracted_text_preview: Option<String>,
}

static DECK_ANALYSIS: Schema = Schema {
    name: "DeckAnalysis",
    collection: "deckanalysis",
    fields: &[
        FieldSpec::required("filename", FieldType::String),
        FieldSpec::optional("mime_type", FieldType::String),
        FieldSpec::optional("size_bytes", FieldType::Integer).with(&[Constraint::Minimum(0)]),
        FieldSpec::required("overall_score", FieldType::Integer).with(&[SCORE]),
        FieldSpec::defaulted(
            "category_scores",
            FieldType::Mapping(&FieldType::Integer),
            DefaultValue::EmptyMapping,
        ),
        FieldSpec::defaulted("suggestions", STRING_LIST, DefaultValue::EmptySequence),
        FieldSpec::optional("extracted_text_preview", FieldType::String),
    ],
};

impl Document for DeckAnalysis {
    fn schema() -> &'static Schema {
        &DECK_ANALYSIS
    }
}

/// Message submitted through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

static CONTACT_MESSAGE: Schema = Schema {
    name: "ContactMessage",
    collection: "contactmessage",
    fields: &[
        FieldSpec::required("name", FieldType::String),
        FieldSpec::required("email", FieldType::String).with(&[Constraint::Email]),
        FieldSpec::required("message", FieldType::String),
    ],
};

impl Document for ContactMessage {
    fn schema() -> &'static Schema {
        &CONTACT_MESSAGE
    }
}

/// Runtime tag for the document kinds, for code that picks a schema by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    IdeaAnalysis,
    DeckAnalysis,
    ContactMessage,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::IdeaAnalysis, Kind::DeckAnalysis, Kind::ContactMessage];

    pub fn schema(self) -> &'static Schema {
        match self {
            Kind::IdeaAnalysis => IdeaAnalysis::schema(),
            Kind::DeckAnalysis => DeckAnalysis::schema(),
            Kind::ContactMessage => ContactMessage::schema(),
        }
    }

    pub fn collection(self) -> &'static str {
        self.schema().collection
    }
}
