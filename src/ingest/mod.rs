//! File ingestion: error codes and the accumulating error map shared by
//! the workbook round-trip.
//!
//! Ingest validation never fails fast: every problem found in one pass is
//! recorded under its error code, and the whole map is returned to the
//! caller as a 400-equivalent payload.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

pub mod xlsx;

pub use xlsx::AssessmentXlsx;

pub const ERROR: &str = "error";
pub const WARNING: &str = "warning";

pub const MISSING_SHEET: &str = "missing_sheet";
pub const INVALID_HEADER: &str = "invalid_header";
pub const INVALID_HEADER_CELLS: &str = "invalid_header_cells";
pub const INVALID_FILE_LOAD: &str = "invalid_file_load";
pub const ASSESSMENT_ID_MISMATCH: &str = "assessment_id_mismatch";
pub const INVALID_QUESTIONS: &str = "invalid_questions";
pub const INVALID_CHOICES: &str = "invalid_choices";
pub const INVALID_ANSWERS: &str = "invalid_answers";
pub const ANSWER_SAVE: &str = "answer_save";

/// One recorded problem: severity, human-readable message, and optional
/// structured payload (offending cell addresses, mismatched ids, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestIssue {
    pub level: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Error-code-keyed accumulator. One entry per code; a category that finds
/// several offending cells records them all in that entry's `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IngestErrors {
    issues: BTreeMap<&'static str, IngestIssue>,
}

impl IngestErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, code: &'static str, message: impl Into<String>, data: Option<Value>) {
        self.issues.insert(
            code,
            IngestIssue {
                level: ERROR,
                message: message.into(),
                data,
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.issues.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&IngestIssue> {
        self.issues.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&&'static str, &IngestIssue)> {
        self.issues.iter()
    }
}
