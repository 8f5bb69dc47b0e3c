//! Assessment version persistence: latest-version lookup and the
//! mint-on-reference-data-change path driven by the versioning service.

use sqlx::PgPool;
use tracing::info;

use crate::error::Result;
use crate::models::AssessmentVersion;
use crate::versioning::{Clock, VersionService};

const VERSION_COLUMNS: &str = "id, year, major_version, text, created_on, updated_on";

#[derive(Clone, Debug)]
pub struct VersionRepository {
    pool: PgPool,
}

impl VersionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Most recent version by (year, major_version) descending.
    pub async fn latest(&self) -> Result<Option<AssessmentVersion>> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM assessment_versions \
             ORDER BY year DESC, major_version DESC LIMIT 1"
        );
        let version = sqlx::query_as::<_, AssessmentVersion>(&query)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version)
    }

    /// Mint the next version if the service's policy calls for one.
    /// Called after a tracked reference-data change is detected.
    pub async fn mint<C: Clock>(
        &self,
        service: &VersionService<C>,
    ) -> Result<Option<AssessmentVersion>> {
        let current = self.latest().await?;
        let Some((year, major_version)) = service.next_version(current.as_ref()) else {
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO assessment_versions (id, year, major_version, text, created_on, \
             updated_on) VALUES ($1, $2, $3, '', now(), now()) RETURNING {VERSION_COLUMNS}"
        );
        let version = sqlx::query_as::<_, AssessmentVersion>(&query)
            .bind(uuid::Uuid::new_v4())
            .bind(year)
            .bind(major_version)
            .fetch_one(&self.pool)
            .await?;
        info!(version = %version, "assessment version minted");
        Ok(Some(version))
    }
}
