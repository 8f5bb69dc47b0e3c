//! Collaborator persistence with the membership invariants enforced at
//! write time: immutable (assessment, user), and never fewer than one
//! admin per assessment.

use sqlx::PgPool;
use uuid::Uuid;

use crate::authz::{validate_collaborator_update, validate_not_last_admin};
use crate::error::{ElinorError, Result};
use crate::models::{Collaborator, Role};

const COLLABORATOR_COLUMNS: &str =
    "id, assessment_id, user_id, role, created_on, created_by, updated_on, updated_by";

#[derive(Clone, Debug)]
pub struct CollaboratorRepository {
    pool: PgPool,
}

impl CollaboratorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Collaborator>> {
        let query = format!("SELECT {COLLABORATOR_COLUMNS} FROM collaborators WHERE id = $1");
        let collaborator = sqlx::query_as::<_, Collaborator>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(collaborator)
    }

    /// The requesting user's membership on an assessment, if any. `None`
    /// is what turns into the distinct not-a-collaborator denial upstream.
    pub async fn get_for(
        &self,
        assessment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Collaborator>> {
        let query = format!(
            "SELECT {COLLABORATOR_COLUMNS} FROM collaborators \
             WHERE assessment_id = $1 AND user_id = $2"
        );
        let collaborator = sqlx::query_as::<_, Collaborator>(&query)
            .bind(assessment_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(collaborator)
    }

    pub async fn for_assessment(&self, assessment_id: Uuid) -> Result<Vec<Collaborator>> {
        let query = format!(
            "SELECT {COLLABORATOR_COLUMNS} FROM collaborators \
             WHERE assessment_id = $1 ORDER BY created_on"
        );
        let collaborators = sqlx::query_as::<_, Collaborator>(&query)
            .bind(assessment_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(collaborators)
    }

    async fn admin_count(&self, assessment_id: Uuid) -> Result<usize> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM collaborators WHERE assessment_id = $1 AND role = $2",
        )
        .bind(assessment_id)
        .bind(Role::Admin as i16)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as usize)
    }

    async fn assessment_name(&self, assessment_id: Uuid) -> Result<String> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM assessments WHERE id = $1")
            .bind(assessment_id)
            .fetch_optional(&self.pool)
            .await?;
        name.ok_or(ElinorError::NotFound {
            kind: "assessment",
            id: assessment_id,
        })
    }

    /// Add a collaborator. A duplicate (assessment, user) surfaces as a
    /// structured validation error via the unique-violation translation.
    pub async fn add(
        &self,
        assessment_id: Uuid,
        user_id: Uuid,
        role: Role,
        actor: Uuid,
    ) -> Result<Collaborator> {
        let query = format!(
            "INSERT INTO collaborators (id, assessment_id, user_id, role, created_on, created_by, \
             updated_on, updated_by) VALUES ($1, $2, $3, $4, now(), $5, now(), $5) \
             RETURNING {COLLABORATOR_COLUMNS}"
        );
        let collaborator = sqlx::query_as::<_, Collaborator>(&query)
            .bind(Uuid::new_v4())
            .bind(assessment_id)
            .bind(user_id)
            .bind(role as i16)
            .bind(actor)
            .fetch_one(&self.pool)
            .await?;
        Ok(collaborator)
    }

    /// Update a collaborator row. `assessment_id`/`user_id` must match the
    /// stored values, and demoting the last admin is refused.
    pub async fn update(
        &self,
        id: Uuid,
        new_assessment_id: Uuid,
        new_user_id: Uuid,
        new_role: Role,
        actor: Uuid,
    ) -> Result<Collaborator> {
        let original = self.get(id).await?.ok_or(ElinorError::NotFound {
            kind: "collaborator",
            id,
        })?;

        validate_collaborator_update(
            original.assessment_id,
            original.user_id,
            new_assessment_id,
            new_user_id,
        )
        .map_err(ElinorError::Validation)?;

        if original.role.is_admin() && !new_role.is_admin() {
            let admins = self.admin_count(original.assessment_id).await?;
            let name = self.assessment_name(original.assessment_id).await?;
            validate_not_last_admin(true, admins, &name).map_err(ElinorError::Validation)?;
        }

        let query = format!(
            "UPDATE collaborators SET role = $2, updated_on = now(), updated_by = $3 \
             WHERE id = $1 RETURNING {COLLABORATOR_COLUMNS}"
        );
        let collaborator = sqlx::query_as::<_, Collaborator>(&query)
            .bind(id)
            .bind(new_role as i16)
            .bind(actor)
            .fetch_one(&self.pool)
            .await?;
        Ok(collaborator)
    }

    /// Remove a collaborator; refused for the last remaining admin.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let original = self.get(id).await?.ok_or(ElinorError::NotFound {
            kind: "collaborator",
            id,
        })?;

        if original.role.is_admin() {
            let admins = self.admin_count(original.assessment_id).await?;
            let name = self.assessment_name(original.assessment_id).await?;
            validate_not_last_admin(true, admins, &name).map_err(ElinorError::Validation)?;
        }

        sqlx::query("DELETE FROM collaborators WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
