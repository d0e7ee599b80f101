//! Deterministic analysis stand-ins for ideas and pitch decks.
//!
//! Both functions return a raw field map shaped for the matching document
//! schema; callers validate the map before persisting it. Output depends only
//! on the input, so the same idea or upload always yields the same scorecard.
//!
//! Any real scoring engine can replace these functions as long as it keeps
//! returning maps that pass [`IdeaAnalysis`](crate::models::IdeaAnalysis) and
//! [`DeckAnalysis`](crate::models::DeckAnalysis) validation.

use serde_json::{json, Map, Value};

/// Minimum trimmed length (in characters) of an idea worth analyzing.
pub const MIN_IDEA_CHARS: usize = 10;

/// Characters of the idea echoed in the summary.
const SUMMARY_EXCERPT_CHARS: usize = 120;

/// Bytes of an uploaded deck that are read and previewed.
pub const PREVIEW_BYTES: usize = 2048;

pub const IDEA_SCORE: i64 = 72;

pub const IDEA_TAGS: [&str; 5] = ["market", "problem-solution", "MVP", "risks", "growth"];

const IDEA_COMPETITORS: [&str; 3] = ["Incumbent A", "Startup B", "Open-source C"];

const IDEA_RISKS: [&str; 3] = [
    "Go-to-market complexity",
    "Data availability and model drift",
    "Regulatory or privacy constraints",
];

const IDEA_NEXT_STEPS: [&str; 3] = [
    "Define problem statement and success metric",
    "Outline 2-week MVP with clear scope",
    "Talk to 10 target users and validate willingness to pay",
];

/// Fixed per-category deck scores.
pub const CATEGORY_SCORES: [(&str, i64); 7] = [
    ("Problem", 70),
    ("Solution", 75),
    ("Market", 68),
    ("Business Model", 62),
    ("Traction", 55),
    ("Team", 80),
    ("Go-To-Market", 60),
];

const DECK_SUGGESTIONS: [&str; 3] = [
    "Clarify the quantified problem impact",
    "Add early validation/traction signals",
    "Tighten GTM milestones with specific channels",
];

/// Filename recorded when the upload did not carry one.
pub const DEFAULT_DECK_NAME: &str = "deck";

/// True if the idea is long enough to analyze.
pub fn is_detailed_idea(idea: &str) -> bool {
    idea.trim().chars().count() >= MIN_IDEA_CHARS
}

/// Builds the `IdeaAnalysis` field set for an idea.
///
/// The caller is expected to pass trimmed text that satisfies
/// [`is_detailed_idea`].
pub fn analyze_idea(idea: &str) -> Map<String, Value> {
    let excerpt: String = idea.chars().take(SUMMARY_EXCERPT_CHARS).collect();

    let mut fields = Map::new();
    fields.insert("idea".into(), json!(idea));
    fields.insert(
        "summary".into(),
        json!(format!("Concise overview of the idea: {}...", excerpt)),
    );
    fields.insert(
        "market".into(),
        json!("Estimated TAM/SAM/SOM with initial hypothesis and segments."),
    );
    fields.insert(
        "target_audience".into(),
        json!("Early adopters in SMB/enterprise depending on positioning."),
    );
    fields.insert("competitors".into(), json!(IDEA_COMPETITORS));
    fields.insert("risks".into(), json!(IDEA_RISKS));
    fields.insert("next_steps".into(), json!(IDEA_NEXT_STEPS));
    fields.insert("score_overall".into(), json!(IDEA_SCORE));
    fields.insert("tags".into(), json!(IDEA_TAGS));
    fields
}

/// Floor of the mean of [`CATEGORY_SCORES`].
pub fn overall_deck_score() -> i64 {
    let total: i64 = CATEGORY_SCORES.iter().map(|(_, score)| score).sum();
    total / CATEGORY_SCORES.len() as i64
}

/// Builds the `DeckAnalysis` field set for an upload.
///
/// Only the first [`PREVIEW_BYTES`] of `content` are looked at, and
/// `size_bytes` reports the length of that prefix rather than the full
/// upload size.
pub fn analyze_deck(
    filename: Option<&str>,
    mime_type: Option<&str>,
    content: &[u8],
) -> Map<String, Value> {
    let prefix = &content[..content.len().min(PREVIEW_BYTES)];
    let filename = filename
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DECK_NAME);
    let categories: Map<String, Value> = CATEGORY_SCORES
        .iter()
        .map(|(name, score)| (name.to_string(), json!(score)))
        .collect();

    let mut fields = Map::new();
    fields.insert("filename".into(), json!(filename));
    fields.insert("mime_type".into(), json!(mime_type));
    fields.insert("size_bytes".into(), json!(prefix.len()));
    fields.insert("overall_score".into(), json!(overall_deck_score()));
    fields.insert("category_scores".into(), Value::Object(categories));
    fields.insert("suggestions".into(), json!(DECK_SUGGESTIONS));
    fields.insert(
        "extracted_text_preview".into(),
        json!(decode_preview(prefix)),
    );
    fields
}

/// Decodes bytes as UTF-8, dropping invalid sequences. Never fails.
pub fn decode_preview(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeckAnalysis, IdeaAnalysis};
    use crate::schema::validate;

    #[test]
    fn test_idea_length_threshold() {
        assert!(!is_detailed_idea(""));
        assert!(!is_detailed_idea("          "));
        assert!(!is_detailed_idea("   short    "));
        assert!(!is_detailed_idea("123456789"));
        assert!(is_detailed_idea("1234567890"));
        assert!(is_detailed_idea("  1234567890  "));
        // characters, not bytes
        assert!(!is_detailed_idea("ééééééééé"));
    }

    #[test]
    fn test_idea_analysis_is_fixed_and_valid() {
        let fields = analyze_idea("A subscription service for office plants");
        let doc = validate::<IdeaAnalysis>(&fields).unwrap().into_inner();
        assert_eq!(doc.score_overall, Some(72));
        assert_eq!(doc.tags, IDEA_TAGS.to_vec());
        assert_eq!(doc.competitors.len(), 3);
        assert_eq!(doc.risks.len(), 3);
        assert_eq!(doc.next_steps.len(), 3);
        assert_eq!(doc.idea, "A subscription service for office plants");
    }

    #[test]
    fn test_idea_analysis_deterministic() {
        let idea = "Peer-to-peer tool rental for apartment buildings";
        assert_eq!(analyze_idea(idea), analyze_idea(idea));
    }

    #[test]
    fn test_summary_truncates_to_120_chars() {
        let idea = "ü".repeat(300);
        let fields = analyze_idea(&idea);
        let summary = fields["summary"].as_str().unwrap();
        let expected = format!("Concise overview of the idea: {}...", "ü".repeat(120));
        assert_eq!(summary, expected);

        let short = analyze_idea("tiny but ok idea");
        assert_eq!(
            short["summary"],
            "Concise overview of the idea: tiny but ok idea..."
        );
    }

    #[test]
    fn test_overall_deck_score() {
        assert_eq!(overall_deck_score(), (70 + 75 + 68 + 62 + 55 + 80 + 60) / 7);
        assert_eq!(overall_deck_score(), 67);
    }

    #[test]
    fn test_deck_analysis_small_file() {
        let fields = analyze_deck(Some("pitch.pdf"), Some("application/pdf"), b"Hello deck");
        let doc = validate::<DeckAnalysis>(&fields).unwrap().into_inner();
        assert_eq!(doc.filename, "pitch.pdf");
        assert_eq!(doc.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(doc.size_bytes, Some(10));
        assert_eq!(doc.overall_score, 67);
        assert_eq!(doc.category_scores.len(), 7);
        assert_eq!(doc.category_scores["Team"], 80);
        assert_eq!(doc.suggestions.len(), 3);
        assert_eq!(doc.extracted_text_preview.as_deref(), Some("Hello deck"));
    }

    #[test]
    fn test_size_bytes_reports_preview_length_not_file_size() {
        // Large uploads report the preview prefix length, not their true size.
        let content = vec![b'a'; 10_000];
        let fields = analyze_deck(Some("big.pdf"), Some("application/pdf"), &content);
        assert_eq!(fields["size_bytes"], 2048);
        assert_eq!(
            fields["extracted_text_preview"].as_str().unwrap().len(),
            2048
        );
    }

    #[test]
    fn test_missing_filename_defaults() {
        let fields = analyze_deck(None, None, b"");
        assert_eq!(fields["filename"], "deck");
        assert_eq!(fields["mime_type"], Value::Null);
        assert_eq!(fields["size_bytes"], 0);
        let fields = analyze_deck(Some(""), None, b"");
        assert_eq!(fields["filename"], "deck");
    }

    #[test]
    fn test_decode_preview_drops_invalid_bytes() {
        assert_eq!(decode_preview(b"ab\xffcd"), "abcd");
        assert_eq!(decode_preview(&[0xC3]), "");
        assert_eq!(decode_preview("héllo".as_bytes()), "héllo");
        // binary PDF header bytes do not cause a failure
        assert_eq!(decode_preview(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3"), "%PDF-1.7\n%");
    }

    #[test]
    fn test_preview_cut_inside_multibyte_char() {
        let mut content = vec![b'a'; PREVIEW_BYTES - 1];
        content.extend_from_slice("é".as_bytes());
        let fields = analyze_deck(Some("x.pdf"), None, &content);
        let preview = fields["extracted_text_preview"].as_str().unwrap();
        assert_eq!(preview.len(), PREVIEW_BYTES - 1);
        assert_eq!(fields["size_bytes"], PREVIEW_BYTES);
    }
}
