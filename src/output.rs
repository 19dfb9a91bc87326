//! Result types returned by the planner.

use crate::document::RenderedDocument;
use crate::error::RenderError;
use serde::{Deserialize, Serialize};

/// How a single candidate attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    /// Skipped to the next candidate.
    Unavailable { detail: String },
    /// Answered, but nothing was left after cleanup.
    Empty,
}

/// One entry in the per-request attempt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub model: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub duration_ms: u64,
}

/// A generated itinerary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    /// Cleaned Markdown text, never blank.
    pub markdown: String,
    /// The candidate that produced it.
    pub model: String,
    /// Every candidate tried, in order, including the successful one.
    pub attempts: Vec<AttemptRecord>,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

/// Itinerary plus its document.
///
/// `document` is an `Err` when only the PDF failed; the itinerary is still
/// valid and should be shown.
#[derive(Debug)]
pub struct PlanOutput {
    pub itinerary: Itinerary,
    pub document: Result<RenderedDocument, RenderError>,
    /// Suggested download name.
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_record_serialises_flat() {
        let rec = AttemptRecord {
            model: "gpt-4o".into(),
            outcome: AttemptOutcome::Unavailable {
                detail: "model_not_found".into(),
            },
            duration_ms: 12,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["outcome"], "unavailable");
        assert_eq!(json["detail"], "model_not_found");
    }

    #[test]
    fn empty_attempt_has_no_detail() {
        let rec = AttemptRecord {
            model: "gpt-4-turbo".into(),
            outcome: AttemptOutcome::Empty,
            duration_ms: 3,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["outcome"], "empty");
        assert!(json.get("detail").is_none());
    }
}
