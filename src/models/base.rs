//! Shared reference data: attributes, organizations, assessment versions.
//!
//! These are created by administrators and referenced by, never owned by,
//! assessments and answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named scoring category grouping survey questions.
///
/// `order` drives presentation everywhere questions are listed; `required`
/// attributes are force-added to every assessment's selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Attribute {
    pub id: Uuid,
    pub name: String,
    pub required: bool,
    pub order: i16,
    pub description: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl Attribute {
    /// Presentation ordering used by the workbook and score report.
    pub fn sort_key(&self) -> (i16, &str) {
        (self.order, self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// A `(year, major_version)` stamp, append-only and monotonically
/// increasing. The latest version is stamped onto an assessment when it is
/// finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct AssessmentVersion {
    pub id: Uuid,
    pub year: i16,
    pub major_version: i16,
    pub text: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl std::fmt::Display for AssessmentVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.year, self.major_version)
    }
}
