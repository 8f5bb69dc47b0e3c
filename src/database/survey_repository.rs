//! Question catalog reads and the transactional answer-submit batch.

use std::collections::{BTreeMap, HashSet};

use sqlx::{Acquire, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::Result;
use crate::ingest::xlsx::CandidateAnswer;
use crate::ingest::{IngestErrors, ANSWER_SAVE, INVALID_ANSWERS};
use crate::models::{Assessment, Attribute, SurveyAnswerLikert, SurveyQuestionLikert};
use crate::scoring::ScoredAnswerRow;

#[derive(Clone, Debug)]
pub struct SurveyRepository {
    pool: PgPool,
}

impl SurveyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attribute catalog in presentation order.
    pub async fn attributes(&self) -> Result<Vec<Attribute>> {
        let attributes = sqlx::query_as::<_, Attribute>(
            "SELECT id, name, required, \"order\", description, created_on, updated_on \
             FROM attributes ORDER BY \"order\", name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(attributes)
    }

    /// Question catalog ordered by (attribute order, attribute name,
    /// question number).
    pub async fn questions(&self) -> Result<Vec<SurveyQuestionLikert>> {
        let questions = sqlx::query_as::<_, SurveyQuestionLikert>(
            "SELECT q.id, q.attribute_id, q.key, q.number, q.text, q.rationale, q.information, \
             q.guidance, q.poor_0, q.average_1, q.good_2, q.excellent_3, q.created_on, \
             q.updated_on \
             FROM survey_question_likerts q \
             JOIN attributes a ON a.id = q.attribute_id \
             ORDER BY a.\"order\", a.name, q.number",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    pub async fn answers(&self, assessment_id: Uuid) -> Result<Vec<SurveyAnswerLikert>> {
        let answers = sqlx::query_as::<_, SurveyAnswerLikert>(
            "SELECT s.id, s.assessment_id, s.question_id, s.choice, s.explanation, s.created_on, \
             s.created_by, s.updated_on, s.updated_by \
             FROM survey_answer_likerts s \
             JOIN survey_question_likerts q ON q.id = s.question_id \
             JOIN attributes a ON a.id = q.attribute_id \
             WHERE s.assessment_id = $1 \
             ORDER BY a.\"order\", a.name, q.number",
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    /// Question ids with an answer row for this assessment, for the publish
    /// gate's coverage check.
    pub async fn answered_question_ids(&self, assessment_id: Uuid) -> Result<HashSet<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT question_id FROM survey_answer_likerts WHERE assessment_id = $1",
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    /// Answer rows joined to question and attribute, as the scoring engine
    /// consumes them.
    pub async fn scored_rows(&self, assessment_id: Uuid) -> Result<Vec<ScoredAnswerRow>> {
        let rows = sqlx::query_as::<_, ScoredAnswerRow>(
            "SELECT a.\"order\" AS attribute_order, a.name AS attribute_name, \
             q.number AS question_number, q.key AS question_key, s.choice, s.explanation \
             FROM survey_answer_likerts s \
             JOIN survey_question_likerts q ON q.id = s.question_id \
             JOIN attributes a ON a.id = q.attribute_id \
             WHERE s.assessment_id = $1 \
             ORDER BY a.\"order\", a.name, q.number",
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Persist a batch of parsed workbook answers, all-or-nothing.
    ///
    /// Every candidate is validated first; any failure aborts before any
    /// write and is reported under `invalid_answers`. Writes run inside a
    /// savepoint within one transaction: a dryrun, or any save error,
    /// rolls the savepoint back so nothing is persisted.
    pub async fn submit_answers(
        &self,
        assessment: &Assessment,
        candidates: &BTreeMap<String, CandidateAnswer>,
        questions: &[SurveyQuestionLikert],
        dryrun: bool,
        user: Uuid,
    ) -> Result<IngestErrors> {
        let mut errors = IngestErrors::new();

        let mut resolved: Vec<(&SurveyQuestionLikert, &CandidateAnswer)> = Vec::new();
        let mut invalid: Vec<String> = Vec::new();
        for (key, candidate) in candidates {
            match questions.iter().find(|q| q.key == *key) {
                Some(question) => {
                    if let Err(field_errors) = crate::models::validate_answer(candidate.choice) {
                        invalid.push(format!("{key}: {field_errors}"));
                    } else {
                        resolved.push((question, candidate));
                    }
                }
                None => invalid.push(format!("{key}: unknown question key")),
            }
        }
        if !invalid.is_empty() {
            errors.add(
                INVALID_ANSWERS,
                "invalid answers",
                Some(serde_json::json!({ "errors": invalid })),
            );
            return Ok(errors);
        }

        let mut tx = self.pool.begin().await?;
        let mut savepoint = tx.begin().await?;

        let mut save_failed = false;
        for (question, candidate) in &resolved {
            let result = sqlx::query(
                "INSERT INTO survey_answer_likerts \
                 (id, assessment_id, question_id, choice, explanation, created_on, created_by, \
                 updated_on, updated_by) \
                 VALUES ($1, $2, $3, $4, $5, now(), $6, now(), $6) \
                 ON CONFLICT (assessment_id, question_id) \
                 DO UPDATE SET choice = $4, explanation = $5, updated_on = now(), updated_by = $6",
            )
            .bind(Uuid::new_v4())
            .bind(assessment.id)
            .bind(question.id)
            .bind(candidate.choice)
            .bind(&candidate.explanation)
            .bind(user)
            .execute(&mut *savepoint)
            .await;

            if let Err(err) = result {
                error!(question = %question.key, %err, "failed to save answer");
                save_failed = true;
                break;
            }
        }

        if dryrun || save_failed {
            savepoint.rollback().await?;
            if save_failed {
                errors.add(ANSWER_SAVE, "error saving answers to database", None);
            }
        } else {
            savepoint.commit().await?;
        }
        tx.commit().await?;

        if errors.is_empty() && !dryrun {
            info!(
                assessment = %assessment.id,
                count = resolved.len(),
                "answer batch submitted"
            );
        }
        Ok(errors)
    }
}
