//! Error handling for the assessment core.
//!
//! Domain rule violations are collected into a field-keyed
//! [`ValidationErrors`] map rather than failing on the first problem, so a
//! caller sees every violated field/rule in one response. Everything else
//! uses thiserror enums with proper error chains.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Field-keyed validation failures, surfaced as a 400-equivalent response.
///
/// Keys are field names or rule names (e.g. `attributes`,
/// `non_field_errors`); each key carries every message recorded against it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

/// Key used for violations not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation against a field or rule name.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Build a single-entry error set.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.errors.iter()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// `Ok(())` when no violations were collected, else `Err(self)`.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Main error type for the assessment core.
#[derive(Error, Debug)]
pub enum ElinorError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Distinct from an ordinary denial: the requester has no collaborator
    /// row at all on the owning assessment.
    #[error("user {user} is not part of assessment {assessment}")]
    NotCollaborator { user: Uuid, assessment: Uuid },

    #[error("permission denied: {0}")]
    Denied(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for ElinorError {
    /// Translate storage-level conflicts into the structured 400-equivalent
    /// form instead of letting them surface as raw 500s.
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    return ElinorError::Validation(ValidationErrors::single(
                        NON_FIELD_ERRORS,
                        "a record with these unique values already exists",
                    ));
                }
                // foreign_key_violation (e.g. deleting a protected reference)
                Some("23503") => {
                    return ElinorError::Validation(ValidationErrors::single(
                        NON_FIELD_ERRORS,
                        "operation violates a protected reference",
                    ));
                }
                _ => {}
            }
        }
        ElinorError::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, ElinorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_messages_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("year", "may not be published unanswered");
        errors.add("year", "must be a positive integer");
        errors.add("attributes", "at least one attribute required");

        assert!(!errors.is_empty());
        let rendered = errors.to_string();
        assert!(rendered.contains("year: may not be published unanswered, must be a positive integer"));
        assert!(rendered.contains("attributes"));
    }

    #[test]
    fn empty_set_converts_to_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
        assert!(ValidationErrors::single("name", "bad").into_result().is_err());
    }
}
