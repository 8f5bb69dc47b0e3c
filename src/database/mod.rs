//! Postgres persistence for the assessment domain.
//!
//! Repository structs hold a `PgPool` and expose the filtered queries and
//! transactional write paths the domain core needs. Enum columns are
//! stored as their smallint ordinals; uniqueness and cascade rules live in
//! the schema (`migrations/0001_init.sql`). Storage-level conflicts are
//! translated into structured validation errors by the `From<sqlx::Error>`
//! impl on [`crate::error::ElinorError`].

mod assessment_repository;
mod collaborator_repository;
mod survey_repository;
mod version_repository;

pub use assessment_repository::AssessmentRepository;
pub use collaborator_repository::CollaboratorRepository;
pub use survey_repository::SurveyRepository;
pub use version_repository::VersionRepository;
