//! Assessment operation routes: score report, publish validation, and the
//! workbook export/import round-trip.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{actor_from_headers, ApiError, AppState};
use crate::authz::{authorize, can_view, Verb};
use crate::database::{AssessmentRepository, CollaboratorRepository, SurveyRepository};
use crate::error::ElinorError;
use crate::ingest::xlsx::CandidateAnswer;
use crate::ingest::AssessmentXlsx;
use crate::models::{Assessment, AssessmentStatus, Role, SurveyQuestionLikert};
use crate::publish::{percent_complete, required_questions, validate_for_publish};
use crate::scoring::{score_answers, AssessmentScore};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/assessments/:id/score", get(assessment_score))
        .route(
            "/api/assessments/:id/validate-publish",
            post(validate_publish),
        )
        .route(
            "/api/assessments/:id/xlsx",
            get(export_workbook).post(import_workbook),
        )
}

struct AssessmentContext {
    assessment: Assessment,
    role: Option<Role>,
}

/// Load the assessment and the caller's membership on it, enforcing read
/// visibility.
async fn load_context(
    state: &AppState,
    headers: &HeaderMap,
    id: Uuid,
) -> Result<(AssessmentContext, crate::authz::Actor), ApiError> {
    let actor = actor_from_headers(headers)?;
    let assessments = AssessmentRepository::new(state.pool.clone());
    let collaborators = CollaboratorRepository::new(state.pool.clone());

    let assessment = assessments.get_required(id).await?;
    let role = collaborators
        .get_for(id, actor.id)
        .await?
        .map(|c| c.role);

    if !can_view(&actor, &assessment, role) {
        return Err(ApiError::Domain(ElinorError::Denied(
            "assessment is not visible to this user".to_string(),
        )));
    }
    Ok((AssessmentContext { assessment, role }, actor))
}

// ============================================================================
// Score report
// ============================================================================

#[derive(Serialize)]
struct ScoreResponse {
    #[serde(flatten)]
    score: AssessmentScore,
    percent_complete: u32,
}

async fn assessment_score(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ScoreResponse>, ApiError> {
    let (context, _actor) = load_context(&state, &headers, id).await?;
    let survey = SurveyRepository::new(state.pool.clone());

    let rows = survey.scored_rows(id).await?;
    let score = score_answers(&rows);

    let catalog = survey.attributes().await?;
    let questions = survey.questions().await?;
    let required = required_questions(&context.assessment, &catalog, &questions);
    let answered = survey.answered_question_ids(id).await?;
    let answered_required = required
        .iter()
        .filter(|q| answered.contains(&q.id))
        .count();

    Ok(Json(ScoreResponse {
        score,
        percent_complete: percent_complete(answered_required, required.len()),
    }))
}

// ============================================================================
// Publish validation
// ============================================================================

async fn validate_publish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (context, _actor) = load_context(&state, &headers, id).await?;
    let survey = SurveyRepository::new(state.pool.clone());

    let catalog = survey.attributes().await?;
    let questions = survey.questions().await?;
    let answered = survey.answered_question_ids(id).await?;

    let mut draft = context.assessment;
    draft.status = AssessmentStatus::Finalized;

    match validate_for_publish(&draft, &catalog, &questions, &answered) {
        Ok(()) => Ok(Json(json!({ "publishable": true }))),
        Err(errors) => Ok(Json(json!({ "publishable": false, "violations": errors }))),
    }
}

// ============================================================================
// Workbook round-trip
// ============================================================================

fn question_key_index(questions: &[SurveyQuestionLikert]) -> BTreeMap<Uuid, String> {
    questions.iter().map(|q| (q.id, q.key.clone())).collect()
}

async fn export_workbook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (context, _actor) = load_context(&state, &headers, id).await?;
    let survey = SurveyRepository::new(state.pool.clone());

    let catalog = survey.attributes().await?;
    let questions = survey.questions().await?;
    let keys = question_key_index(&questions);

    let answers: Vec<(String, CandidateAnswer)> = survey
        .answers(id)
        .await?
        .into_iter()
        .filter_map(|a| {
            keys.get(&a.question_id).map(|key| {
                (
                    key.clone(),
                    CandidateAnswer {
                        choice: a.choice,
                        explanation: a.explanation,
                    },
                )
            })
        })
        .collect();

    let mut xlsx = AssessmentXlsx::new(&context.assessment, &catalog, &questions);
    xlsx.set_answers(answers);
    let bytes = xlsx.generate().map_err(ElinorError::Workbook)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"survey_{id}.xlsx\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Deserialize)]
struct ImportQuery {
    #[serde(default)]
    dryrun: bool,
}

async fn import_workbook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ImportQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (context, actor) = load_context(&state, &headers, id).await?;

    authorize(
        &actor,
        Some(&context.assessment),
        context.role,
        Verb::Put,
        None,
    )
    .into_result()
    .map_err(ApiError::Domain)?;

    let survey = SurveyRepository::new(state.pool.clone());
    let catalog = survey.attributes().await?;
    let questions = survey.questions().await?;

    let mut xlsx = AssessmentXlsx::new(&context.assessment, &catalog, &questions);
    xlsx.load_from_file(&body);
    if xlsx.has_errors() {
        return Err(ApiError::Ingest(xlsx.errors));
    }

    let errors = survey
        .submit_answers(
            &context.assessment,
            xlsx.answers(),
            &questions,
            query.dryrun,
            actor.id,
        )
        .await?;
    if !errors.is_empty() {
        return Err(ApiError::Ingest(errors));
    }

    Ok(Json(json!({
        "submitted": xlsx.answers().len(),
        "dryrun": query.dryrun,
    })))
}
