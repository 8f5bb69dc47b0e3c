//! Publish gate: collected violations, question coverage, and required
//! attribute enforcement.

mod helpers;

use std::collections::HashSet;

use elinor::models::AssessmentStatus;
use elinor::publish::{
    enforce_required_attributes, required_questions, validate_for_publish,
};
use helpers::fixture;
use uuid::Uuid;

fn answered(fixture: &helpers::Fixture, keys: &[&str]) -> HashSet<Uuid> {
    fixture
        .questions
        .iter()
        .filter(|q| keys.contains(&q.key.as_str()))
        .map(|q| q.id)
        .collect()
}

#[test]
fn gate_only_runs_for_finalized_target() {
    let mut fx = fixture();
    fx.assessment.management_area_id = None;
    fx.assessment.status = AssessmentStatus::NotFinalized;

    let result = validate_for_publish(
        &fx.assessment,
        &fx.attributes,
        &fx.questions,
        &HashSet::new(),
    );
    assert!(result.is_ok());
}

#[test]
fn all_violations_are_collected_in_one_error() {
    let mut fx = fixture();
    fx.assessment.status = AssessmentStatus::Finalized;
    fx.assessment.management_area_id = None;
    fx.assessment.collection_method = None;
    fx.assessment.attributes.clear();

    let errors = validate_for_publish(
        &fx.assessment,
        &fx.attributes,
        &fx.questions,
        &HashSet::new(),
    )
    .unwrap_err();

    assert!(errors.contains("management_area"));
    assert!(errors.contains("collection_method"));
    assert!(errors.contains("attributes"));
    // required-attribute questions are still demanded even with nothing selected
    assert!(errors.contains("questions"));
}

#[test]
fn unanswered_required_question_is_named_by_key() {
    let mut fx = fixture();
    fx.assessment.status = AssessmentStatus::Finalized;

    let errors = validate_for_publish(
        &fx.assessment,
        &fx.attributes,
        &fx.questions,
        &answered(&fx, &["gov_2", "rights_1"]),
    )
    .unwrap_err();

    let message = errors.to_string();
    assert!(message.contains("gov_1"));
    assert!(!message.contains("rights_1"));
}

#[test]
fn answer_row_with_null_choice_counts_as_answered() {
    // Coverage only demands a row per question; "don't know" passes.
    let mut fx = fixture();
    fx.assessment.status = AssessmentStatus::Finalized;

    let result = validate_for_publish(
        &fx.assessment,
        &fx.attributes,
        &fx.questions,
        &answered(&fx, &["gov_1", "gov_2", "rights_1"]),
    );
    assert!(result.is_ok());
}

#[test]
fn unselected_attribute_questions_are_not_required() {
    let fx = fixture();
    let required = required_questions(&fx.assessment, &fx.attributes, &fx.questions);
    let keys: Vec<&str> = required.iter().map(|q| q.key.as_str()).collect();
    assert_eq!(keys, vec!["gov_1", "gov_2", "rights_1"]);
}

#[test]
fn required_attributes_are_force_added() {
    let fx = fixture();
    let governance = &fx.attributes[0];
    assert!(governance.required);

    // caller tried to deselect the required attribute
    let mut selected = vec![fx.attributes[1].id];
    enforce_required_attributes(&mut selected, &fx.attributes);
    assert!(selected.contains(&governance.id));

    // idempotent when already present
    let before = selected.clone();
    enforce_required_attributes(&mut selected, &fx.attributes);
    assert_eq!(selected, before);
}

#[test]
fn globally_required_questions_apply_even_when_attribute_not_selected() {
    let mut fx = fixture();
    // deselect everything; Governance is still globally required
    fx.assessment.attributes = vec![fx.attributes[1].id];
    fx.assessment.status = AssessmentStatus::Finalized;

    let errors = validate_for_publish(
        &fx.assessment,
        &fx.attributes,
        &fx.questions,
        &answered(&fx, &["rights_1"]),
    )
    .unwrap_err();
    let message = errors.to_string();
    assert!(message.contains("gov_1"));
    assert!(message.contains("gov_2"));
}
