//! Entity types for the assessment domain.
//!
//! `base` holds shared reference data (attributes, organizations,
//! versions), `survey` the question catalog and answer rows, and
//! `assessment` the root aggregate with its collaborators, change log and
//! flags.

mod assessment;
mod base;
mod survey;

pub use assessment::{
    Assessment, AssessmentChange, AssessmentFlag, AssessmentStatus, ChangeEventType, Checkout,
    Collaborator, CollectionMethod, DataPolicy, FlagType, PersonResponsibleRole, Role,
};
pub use base::{AssessmentVersion, Attribute, Organization};
pub use survey::{
    likert_label, validate_answer, SurveyAnswerLikert, SurveyQuestionLikert, AVERAGE, EXCELLENT,
    GOOD, POOR,
};
