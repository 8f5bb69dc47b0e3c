//! Elinor assessment core.
//!
//! Collects structured survey answers for natural-resource management
//! areas, folds them into per-attribute and overall scores, gates the
//! one-way finalize transition on completeness, and round-trips answers
//! through a formatted xlsx workbook.
//!
//! The domain core (models, scoring, publish gate, authorization, change
//! log, workbook generation/parsing) compiles with no default features and
//! has no I/O. Persistence lives behind the `database` feature; the HTTP
//! surface behind `server`.
//!
//! ## Quick start
//!
//! ```rust
//! use elinor::scoring::{score_answers, ScoredAnswerRow};
//!
//! let rows = vec![ScoredAnswerRow {
//!     attribute_order: 1,
//!     attribute_name: "Governance".to_string(),
//!     question_number: 1,
//!     question_key: "gov_1".to_string(),
//!     choice: Some(3),
//!     explanation: String::new(),
//! }];
//! let score = score_answers(&rows);
//! assert_eq!(score.attributes[0].score, Some(10.0));
//! ```

// Core error handling
pub mod error;

// Entities
pub mod models;

// Scoring engine
pub mod scoring;

// Completeness / publish gate
pub mod publish;

// Role & state authorization
pub mod authz;

// Status / data-policy audit trail
pub mod changelog;

// Assessment versioning service
pub mod versioning;

// Workbook ingest/export
pub mod ingest;

// Email composition
pub mod notify;

pub mod utils;

// Database integration (when enabled)
#[cfg(feature = "database")]
pub mod database;

// REST API surface (when enabled)
#[cfg(feature = "server")]
pub mod api;
