//! Likert question catalog and answer rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationErrors;

pub const POOR: i16 = 0;
pub const AVERAGE: i16 = 1;
pub const GOOD: i16 = 2;
pub const EXCELLENT: i16 = 3;

/// Display label for a Likert ordinal, `None` for out-of-range values.
pub fn likert_label(choice: i16) -> Option<&'static str> {
    match choice {
        POOR => Some("poor"),
        AVERAGE => Some("average"),
        GOOD => Some("good"),
        EXCELLENT => Some("excellent"),
        _ => None,
    }
}

/// A survey question with four Likert answer-choice labels.
///
/// Reference data; read-only from the assessment workflow's perspective.
/// `key` is the stable identifier used by the workbook round-trip and by
/// publish-gate violation messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct SurveyQuestionLikert {
    pub id: Uuid,
    pub attribute_id: Uuid,
    pub key: String,
    pub number: i16,
    pub text: String,
    pub rationale: String,
    pub information: String,
    pub guidance: String,
    pub poor_0: String,
    pub average_1: String,
    pub good_2: String,
    pub excellent_3: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl SurveyQuestionLikert {
    /// Raw choice label for a Likert ordinal.
    pub fn choice_label(&self, choice: i16) -> Option<&str> {
        match choice {
            POOR => Some(&self.poor_0),
            AVERAGE => Some(&self.average_1),
            GOOD => Some(&self.good_2),
            EXCELLENT => Some(&self.excellent_3),
            _ => None,
        }
    }
}

/// One answer per `(assessment, question)` pair, unique on that pair.
///
/// `choice` is null for "don't know" (and for never-selected dropdowns in
/// an imported workbook); a null choice still counts as answered for the
/// publish gate's coverage check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct SurveyAnswerLikert {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub question_id: Uuid,
    pub choice: Option<i16>,
    pub explanation: String,
    pub created_on: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_on: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// Field validation applied on every answer create/update, including each
/// candidate row of a workbook submit batch.
pub fn validate_answer(choice: Option<i16>) -> Result<(), ValidationErrors> {
    match choice {
        None => Ok(()),
        Some(c) if (POOR..=EXCELLENT).contains(&c) => Ok(()),
        Some(c) => Err(ValidationErrors::single(
            "choice",
            format!("{c} is not a valid choice"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_range() {
        assert!(validate_answer(None).is_ok());
        assert!(validate_answer(Some(0)).is_ok());
        assert!(validate_answer(Some(3)).is_ok());
        assert!(validate_answer(Some(4)).is_err());
        assert!(validate_answer(Some(-1)).is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(likert_label(0), Some("poor"));
        assert_eq!(likert_label(3), Some("excellent"));
        assert_eq!(likert_label(9), None);
    }
}
