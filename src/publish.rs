//! Completeness checks gating the one-way transition into "finalized".
//!
//! All checks run and every violation is collected before anything is
//! reported; the caller gets one structured error naming each violated
//! field or question key.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::models::{Assessment, Attribute, SurveyQuestionLikert};

/// Scalar fields that must be non-null before an assessment may be
/// finalized. An explicit list: a field added to [`Assessment`] is not
/// publish-required until it is added here. `created_by`/`updated_by` are
/// deliberately absent.
const REQUIRED_SCALAR_FIELDS: [&str; 4] = [
    "person_responsible_role",
    "management_area",
    "management_plan_file",
    "collection_method",
];

const UNANSWERED_MSG: &str = "may not be published unanswered";

/// Force-add globally required attributes to an assessment's selection.
///
/// Runs before any create/update regardless of what the caller requested;
/// an auto-repair step, not a rejection.
pub fn enforce_required_attributes(selected: &mut Vec<Uuid>, catalog: &[Attribute]) {
    for attribute in catalog.iter().filter(|a| a.required) {
        if !selected.contains(&attribute.id) {
            selected.push(attribute.id);
        }
    }
}

/// The questions an assessment must have answer rows for: every question
/// whose attribute is selected on the assessment or globally required.
pub fn required_questions<'a>(
    assessment: &Assessment,
    catalog: &[Attribute],
    questions: &'a [SurveyQuestionLikert],
) -> Vec<&'a SurveyQuestionLikert> {
    let covered: HashSet<Uuid> = catalog
        .iter()
        .filter(|a| a.required || assessment.attributes.contains(&a.id))
        .map(|a| a.id)
        .collect();
    questions
        .iter()
        .filter(|q| covered.contains(&q.attribute_id))
        .collect()
}

/// Share of required questions answered, as a 0–100 integer. The
/// denominator is floored at 1 so an assessment with no required questions
/// reads as complete rather than dividing by zero.
pub fn percent_complete(answered: usize, required: usize) -> u32 {
    let total = required.max(1);
    (100.0 * answered as f64 / total as f64).round() as u32
}

fn check_nulls(assessment: &Assessment, errors: &mut ValidationErrors) {
    for field in REQUIRED_SCALAR_FIELDS {
        let missing = match field {
            "person_responsible_role" => assessment.person_responsible_role.is_none(),
            "management_area" => assessment.management_area_id.is_none(),
            "management_plan_file" => assessment.management_plan_file.is_none(),
            "collection_method" => assessment.collection_method.is_none(),
            _ => false,
        };
        if missing {
            errors.add(field, UNANSWERED_MSG);
        }
    }
}

fn check_attributes(assessment: &Assessment, errors: &mut ValidationErrors) {
    if assessment.attributes.is_empty() {
        errors.add(
            "attributes",
            "may not be published without at least one associated attribute",
        );
    }
}

fn check_questions(
    assessment: &Assessment,
    catalog: &[Attribute],
    questions: &[SurveyQuestionLikert],
    answered_question_ids: &HashSet<Uuid>,
    errors: &mut ValidationErrors,
) {
    let missing: Vec<&str> = required_questions(assessment, catalog, questions)
        .into_iter()
        .filter(|q| !answered_question_ids.contains(&q.id))
        .map(|q| q.key.as_str())
        .collect();
    if !missing.is_empty() {
        errors.add(
            "questions",
            format!(
                "may not be published without answers to these questions: {}",
                missing.join(",")
            ),
        );
    }
}

/// Validate a candidate assessment for the transition into finalized.
///
/// Runs only when the target status is finalized; every other status skips
/// the gate entirely. `answered_question_ids` is the set of question ids
/// with an answer row for this assessment — a row with a null choice still
/// counts as answered, only a missing row fails coverage.
pub fn validate_for_publish(
    assessment: &Assessment,
    catalog: &[Attribute],
    questions: &[SurveyQuestionLikert],
    answered_question_ids: &HashSet<Uuid>,
) -> Result<(), ValidationErrors> {
    if !assessment.is_finalized() {
        return Ok(());
    }

    let mut errors = ValidationErrors::new();
    check_nulls(assessment, &mut errors);
    check_attributes(assessment, &mut errors);
    check_questions(assessment, catalog, questions, answered_question_ids, &mut errors);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_complete_rounds_and_floors_denominator() {
        assert_eq!(percent_complete(0, 0), 0);
        assert_eq!(percent_complete(1, 3), 33);
        assert_eq!(percent_complete(2, 3), 67);
        assert_eq!(percent_complete(3, 3), 100);
    }
}
