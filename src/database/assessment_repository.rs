//! Assessment persistence: visibility-filtered reads and the guarded
//! create/update/delete paths.
//!
//! Creation force-adds required attributes and seeds the creator as the
//! first admin collaborator. Updates run the publish gate when the target
//! status is finalized, stamp the published version, and append audit rows
//! for detected status/data-policy transitions. All multi-row writes are
//! transactional.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::authz::Actor;
use crate::changelog::assessment_change_events;
use crate::error::{ElinorError, Result};
use crate::models::{
    Assessment, AssessmentStatus, Attribute, Checkout, CollectionMethod, DataPolicy,
    PersonResponsibleRole, Role, SurveyQuestionLikert,
};
use crate::publish::{enforce_required_attributes, validate_for_publish};

const ASSESSMENT_COLUMNS: &str = "id, name, organization_id, status, data_policy, \
     person_responsible_id, person_responsible_role, person_responsible_role_other, year, \
     management_area_id, count_community, count_ngo, count_academic, count_government, \
     count_private, count_indigenous, count_gender_female, count_gender_male, \
     count_gender_nonbinary, count_gender_prefer_not_say, consent_given, consent_given_written, \
     management_plan_file, collection_method, collection_method_text, strengths_explanation, \
     needs_explanation, context, checkout_user_id, checked_out_on, checkout_ttl_minutes, \
     published_version_id, created_on, created_by, updated_on, updated_by";

#[derive(Clone, Debug)]
pub struct AssessmentRepository {
    pool: PgPool,
}

impl AssessmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<Assessment> {
        let status = AssessmentStatus::try_from(row.try_get::<i16, _>("status")?)
            .map_err(ElinorError::Validation)?;
        let data_policy = DataPolicy::try_from(row.try_get::<i16, _>("data_policy")?)
            .map_err(ElinorError::Validation)?;

        let checkout = match (
            row.try_get::<Option<Uuid>, _>("checkout_user_id")?,
            row.try_get::<Option<DateTime<Utc>>, _>("checked_out_on")?,
        ) {
            (Some(user_id), Some(checked_out_on)) => Some(Checkout {
                user_id,
                checked_out_on,
                ttl_minutes: row.try_get("checkout_ttl_minutes")?,
            }),
            _ => None,
        };

        Ok(Assessment {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            organization_id: row.try_get("organization_id")?,
            status,
            data_policy,
            attributes: Vec::new(),
            person_responsible_id: row.try_get("person_responsible_id")?,
            person_responsible_role: row.try_get::<Option<PersonResponsibleRole>, _>(
                "person_responsible_role",
            )?,
            person_responsible_role_other: row.try_get("person_responsible_role_other")?,
            year: row.try_get("year")?,
            management_area_id: row.try_get("management_area_id")?,
            count_community: row.try_get("count_community")?,
            count_ngo: row.try_get("count_ngo")?,
            count_academic: row.try_get("count_academic")?,
            count_government: row.try_get("count_government")?,
            count_private: row.try_get("count_private")?,
            count_indigenous: row.try_get("count_indigenous")?,
            count_gender_female: row.try_get("count_gender_female")?,
            count_gender_male: row.try_get("count_gender_male")?,
            count_gender_nonbinary: row.try_get("count_gender_nonbinary")?,
            count_gender_prefer_not_say: row.try_get("count_gender_prefer_not_say")?,
            consent_given: row.try_get("consent_given")?,
            consent_given_written: row.try_get("consent_given_written")?,
            management_plan_file: row.try_get("management_plan_file")?,
            collection_method: row.try_get::<Option<CollectionMethod>, _>("collection_method")?,
            collection_method_text: row.try_get("collection_method_text")?,
            strengths_explanation: row.try_get("strengths_explanation")?,
            needs_explanation: row.try_get("needs_explanation")?,
            context: row.try_get("context")?,
            checkout,
            published_version_id: row.try_get("published_version_id")?,
            created_on: row.try_get("created_on")?,
            created_by: row.try_get("created_by")?,
            updated_on: row.try_get("updated_on")?,
            updated_by: row.try_get("updated_by")?,
        })
    }

    async fn attribute_ids(&self, assessment_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT attribute_id FROM assessment_attributes WHERE assessment_id = $1",
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Assessment>> {
        let query = format!("SELECT {ASSESSMENT_COLUMNS} FROM assessments WHERE id = $1");
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        match row {
            None => Ok(None),
            Some(row) => {
                let mut assessment = Self::map_row(&row)?;
                assessment.attributes = self.attribute_ids(assessment.id).await?;
                Ok(Some(assessment))
            }
        }
    }

    pub async fn get_required(&self, id: Uuid) -> Result<Assessment> {
        self.get(id).await?.ok_or(ElinorError::NotFound {
            kind: "assessment",
            id,
        })
    }

    /// Assessments the actor may read: finalized-and-public ones plus any
    /// they collaborate on.
    pub async fn list_visible(&self, actor: &Actor) -> Result<Vec<Assessment>> {
        let query = format!(
            "SELECT {ASSESSMENT_COLUMNS} FROM assessments \
             WHERE (status <= $1 AND data_policy >= $2) \
                OR id IN (SELECT assessment_id FROM collaborators WHERE user_id = $3) \
             ORDER BY name, year",
        );
        let rows = sqlx::query(&query)
            .bind(AssessmentStatus::Finalized as i16)
            .bind(DataPolicy::Public as i16)
            .bind(actor.id)
            .fetch_all(&self.pool)
            .await?;

        let mut assessments = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut assessment = Self::map_row(row)?;
            assessment.attributes = self.attribute_ids(assessment.id).await?;
            assessments.push(assessment);
        }
        Ok(assessments)
    }

    /// Insert a new assessment, force-adding required attributes and
    /// seeding the creator as its first admin collaborator.
    pub async fn create(
        &self,
        assessment: &mut Assessment,
        catalog: &[Attribute],
        creator: Uuid,
    ) -> Result<()> {
        enforce_required_attributes(&mut assessment.attributes, catalog);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO assessments (id, name, organization_id, status, data_policy, \
             person_responsible_id, person_responsible_role, person_responsible_role_other, year, \
             management_area_id, count_community, count_ngo, count_academic, count_government, \
             count_private, count_indigenous, count_gender_female, count_gender_male, \
             count_gender_nonbinary, count_gender_prefer_not_say, consent_given, \
             consent_given_written, management_plan_file, collection_method, \
             collection_method_text, strengths_explanation, needs_explanation, context, \
             created_on, created_by, updated_on, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
             $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32)",
        )
        .bind(assessment.id)
        .bind(&assessment.name)
        .bind(assessment.organization_id)
        .bind(assessment.status as i16)
        .bind(assessment.data_policy as i16)
        .bind(assessment.person_responsible_id)
        .bind(assessment.person_responsible_role.map(|r| r as i16))
        .bind(&assessment.person_responsible_role_other)
        .bind(assessment.year)
        .bind(assessment.management_area_id)
        .bind(assessment.count_community)
        .bind(assessment.count_ngo)
        .bind(assessment.count_academic)
        .bind(assessment.count_government)
        .bind(assessment.count_private)
        .bind(assessment.count_indigenous)
        .bind(assessment.count_gender_female)
        .bind(assessment.count_gender_male)
        .bind(assessment.count_gender_nonbinary)
        .bind(assessment.count_gender_prefer_not_say)
        .bind(assessment.consent_given)
        .bind(assessment.consent_given_written)
        .bind(&assessment.management_plan_file)
        .bind(assessment.collection_method.map(|m| m as i16))
        .bind(&assessment.collection_method_text)
        .bind(&assessment.strengths_explanation)
        .bind(&assessment.needs_explanation)
        .bind(&assessment.context)
        .bind(assessment.created_on)
        .bind(assessment.created_by)
        .bind(assessment.updated_on)
        .bind(assessment.updated_by)
        .execute(&mut *tx)
        .await?;

        Self::replace_attribute_links(&mut tx, assessment.id, &assessment.attributes).await?;

        sqlx::query(
            "INSERT INTO collaborators (id, assessment_id, user_id, role, created_on, created_by, \
             updated_on, updated_by) VALUES ($1, $2, $3, $4, now(), $5, now(), $5)",
        )
        .bind(Uuid::new_v4())
        .bind(assessment.id)
        .bind(creator)
        .bind(Role::Admin as i16)
        .bind(creator)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(assessment = %assessment.id, "assessment created");
        Ok(())
    }

    /// Persist an update. When the target status is finalized the publish
    /// gate runs first and the latest assessment version is stamped on;
    /// detected status/data-policy transitions append audit rows.
    pub async fn update(
        &self,
        original: &Assessment,
        updated: &mut Assessment,
        catalog: &[Attribute],
        questions: &[SurveyQuestionLikert],
        user: Uuid,
    ) -> Result<()> {
        enforce_required_attributes(&mut updated.attributes, catalog);

        if updated.is_finalized() {
            let answered: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
                "SELECT question_id FROM survey_answer_likerts WHERE assessment_id = $1",
            )
            .bind(updated.id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .collect();
            validate_for_publish(updated, catalog, questions, &answered)
                .map_err(ElinorError::Validation)?;

            updated.published_version_id = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM assessment_versions ORDER BY year DESC, major_version DESC LIMIT 1",
            )
            .fetch_optional(&self.pool)
            .await?;
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "UPDATE assessments SET name = $2, organization_id = $3, status = $4, \
             data_policy = $5, person_responsible_id = $6, person_responsible_role = $7, \
             person_responsible_role_other = $8, year = $9, management_area_id = $10, \
             count_community = $11, count_ngo = $12, count_academic = $13, \
             count_government = $14, count_private = $15, count_indigenous = $16, \
             count_gender_female = $17, count_gender_male = $18, count_gender_nonbinary = $19, \
             count_gender_prefer_not_say = $20, consent_given = $21, consent_given_written = $22, \
             management_plan_file = $23, collection_method = $24, collection_method_text = $25, \
             strengths_explanation = $26, needs_explanation = $27, context = $28, \
             checkout_user_id = $29, checked_out_on = $30, checkout_ttl_minutes = $31, \
             published_version_id = $32, updated_on = now(), updated_by = $33 \
             WHERE id = $1",
        )
        .bind(updated.id)
        .bind(&updated.name)
        .bind(updated.organization_id)
        .bind(updated.status as i16)
        .bind(updated.data_policy as i16)
        .bind(updated.person_responsible_id)
        .bind(updated.person_responsible_role.map(|r| r as i16))
        .bind(&updated.person_responsible_role_other)
        .bind(updated.year)
        .bind(updated.management_area_id)
        .bind(updated.count_community)
        .bind(updated.count_ngo)
        .bind(updated.count_academic)
        .bind(updated.count_government)
        .bind(updated.count_private)
        .bind(updated.count_indigenous)
        .bind(updated.count_gender_female)
        .bind(updated.count_gender_male)
        .bind(updated.count_gender_nonbinary)
        .bind(updated.count_gender_prefer_not_say)
        .bind(updated.consent_given)
        .bind(updated.consent_given_written)
        .bind(&updated.management_plan_file)
        .bind(updated.collection_method.map(|m| m as i16))
        .bind(&updated.collection_method_text)
        .bind(&updated.strengths_explanation)
        .bind(&updated.needs_explanation)
        .bind(&updated.context)
        .bind(updated.checkout.map(|c| c.user_id))
        .bind(updated.checkout.map(|c| c.checked_out_on))
        .bind(updated.checkout.and_then(|c| c.ttl_minutes))
        .bind(updated.published_version_id)
        .bind(user)
        .execute(&mut *tx)
        .await?;

        Self::replace_attribute_links(&mut tx, updated.id, &updated.attributes).await?;

        for event in assessment_change_events(original, updated, user, Utc::now()) {
            sqlx::query(
                "INSERT INTO assessment_changes (id, assessment_id, user_id, event_on, event_type) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(event.id)
            .bind(event.assessment_id)
            .bind(event.user_id)
            .bind(event.event_on)
            .bind(event.event_type as i16)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete an assessment; answers and collaborators cascade with it.
    /// A protected published-version reference surfaces as a structured
    /// validation error via the sqlx translation.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM assessments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace_attribute_links(
        tx: &mut Transaction<'_, Postgres>,
        assessment_id: Uuid,
        attribute_ids: &[Uuid],
    ) -> Result<()> {
        sqlx::query("DELETE FROM assessment_attributes WHERE assessment_id = $1")
            .bind(assessment_id)
            .execute(&mut **tx)
            .await?;
        for attribute_id in attribute_ids {
            sqlx::query(
                "INSERT INTO assessment_attributes (assessment_id, attribute_id) VALUES ($1, $2)",
            )
            .bind(assessment_id)
            .bind(attribute_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}
