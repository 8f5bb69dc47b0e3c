//! Integration tests for the repositories.
//!
//! These need a running PostgreSQL with migrations/0001_init.sql applied
//! and DATABASE_URL set, so they are ignored by default. Run with:
//! cargo test --features database --test database_integration_test -- --ignored

#[cfg(feature = "database")]
mod tests {
    use std::collections::BTreeMap;

    use elinor::database::{AssessmentRepository, CollaboratorRepository, SurveyRepository};
    use elinor::ingest::xlsx::CandidateAnswer;
    use elinor::models::Role;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    async fn setup_test_pool() -> sqlx::PgPool {
        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to connect to database")
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn create_seeds_admin_collaborator() {
        let pool = setup_test_pool().await;
        let assessments = AssessmentRepository::new(pool.clone());
        let collaborators = CollaboratorRepository::new(pool.clone());
        let survey = SurveyRepository::new(pool);

        let catalog = survey.attributes().await.expect("attribute catalog");
        let creator = Uuid::new_v4();
        let mut assessment = common_fixture_assessment();
        assessments
            .create(&mut assessment, &catalog, creator)
            .await
            .expect("create assessment");

        let membership = collaborators
            .get_for(assessment.id, creator)
            .await
            .expect("query membership")
            .expect("creator membership");
        assert_eq!(membership.role, Role::Admin);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn dryrun_submit_persists_nothing() {
        let pool = setup_test_pool().await;
        let assessments = AssessmentRepository::new(pool.clone());
        let survey = SurveyRepository::new(pool.clone());

        let catalog = survey.attributes().await.expect("attribute catalog");
        let questions = survey.questions().await.expect("question catalog");
        let creator = Uuid::new_v4();
        let mut assessment = common_fixture_assessment();
        assessments
            .create(&mut assessment, &catalog, creator)
            .await
            .expect("create assessment");

        let mut candidates: BTreeMap<String, CandidateAnswer> = BTreeMap::new();
        for question in questions.iter().take(3) {
            candidates.insert(
                question.key.clone(),
                CandidateAnswer {
                    choice: Some(2),
                    explanation: "dryrun".to_string(),
                },
            );
        }

        let errors = survey
            .submit_answers(&assessment, &candidates, &questions, true, creator)
            .await
            .expect("submit");
        assert!(errors.is_empty());

        let persisted = survey.answers(assessment.id).await.expect("answers");
        assert!(persisted.is_empty());
    }

    fn common_fixture_assessment() -> elinor::models::Assessment {
        use chrono::Utc;
        use elinor::models::{
            Assessment, AssessmentStatus, CollectionMethod, DataPolicy, PersonResponsibleRole,
        };

        Assessment {
            id: Uuid::new_v4(),
            name: format!("Integration {}", Uuid::new_v4()),
            organization_id: None,
            status: AssessmentStatus::NotFinalized,
            data_policy: DataPolicy::Private,
            attributes: Vec::new(),
            person_responsible_id: Uuid::new_v4(),
            person_responsible_role: Some(PersonResponsibleRole::AreaManager),
            person_responsible_role_other: String::new(),
            year: 2024,
            management_area_id: None,
            count_community: 0,
            count_ngo: 0,
            count_academic: 0,
            count_government: 0,
            count_private: 0,
            count_indigenous: 0,
            count_gender_female: 0,
            count_gender_male: 0,
            count_gender_nonbinary: 0,
            count_gender_prefer_not_say: 0,
            consent_given: true,
            consent_given_written: false,
            management_plan_file: None,
            collection_method: Some(CollectionMethod::DeskBased),
            collection_method_text: String::new(),
            strengths_explanation: String::new(),
            needs_explanation: String::new(),
            context: String::new(),
            checkout: None,
            published_version_id: None,
            created_on: Utc::now(),
            created_by: None,
            updated_on: Utc::now(),
            updated_by: None,
        }
    }
}
