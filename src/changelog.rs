//! Append-only audit trail for assessment status and data-policy
//! transitions.
//!
//! An explicit diff over the two tracked fields; events are emitted only
//! when a field actually changed, and only for transitions that have a
//! named event type (a move to "test" status, for example, records
//! nothing).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Assessment, AssessmentChange, AssessmentStatus, ChangeEventType, DataPolicy};

/// Compare `original` and `updated` and produce the audit rows to append.
pub fn assessment_change_events(
    original: &Assessment,
    updated: &Assessment,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Vec<AssessmentChange> {
    let mut events = Vec::new();

    if original.status == updated.status && original.data_policy == updated.data_policy {
        return events;
    }

    if original.status != updated.status {
        let event_type = match updated.status {
            AssessmentStatus::Finalized => Some(ChangeEventType::Submit),
            AssessmentStatus::NotFinalized => Some(ChangeEventType::Unsubmit),
            AssessmentStatus::Test => None,
        };
        if let Some(event_type) = event_type {
            events.push(change(updated.id, user_id, now, event_type));
        }
    }

    if original.data_policy != updated.data_policy {
        let event_type = match updated.data_policy {
            DataPolicy::Public => ChangeEventType::DataPolicyPublic,
            DataPolicy::Private => ChangeEventType::DataPolicyPrivate,
        };
        events.push(change(updated.id, user_id, now, event_type));
    }

    events
}

fn change(
    assessment_id: Uuid,
    user_id: Uuid,
    event_on: DateTime<Utc>,
    event_type: ChangeEventType,
) -> AssessmentChange {
    AssessmentChange {
        id: Uuid::new_v4(),
        assessment_id,
        user_id,
        event_on,
        event_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assessment, AssessmentStatus, DataPolicy};

    fn assessment(status: AssessmentStatus, data_policy: DataPolicy) -> Assessment {
        Assessment {
            id: Uuid::new_v4(),
            name: "Test area".to_string(),
            organization_id: None,
            status,
            data_policy,
            attributes: Vec::new(),
            person_responsible_id: Uuid::new_v4(),
            person_responsible_role: None,
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
            consent_given: false,
            consent_given_written: false,
            management_plan_file: None,
            collection_method: None,
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

    #[test]
    fn finalize_and_publish_emit_two_events() {
        let original = assessment(AssessmentStatus::NotFinalized, DataPolicy::Private);
        let mut updated = original.clone();
        updated.status = AssessmentStatus::Finalized;
        updated.data_policy = DataPolicy::Public;

        let events = assessment_change_events(&original, &updated, Uuid::new_v4(), Utc::now());
        let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![ChangeEventType::Submit, ChangeEventType::DataPolicyPublic]
        );
    }

    #[test]
    fn unchanged_fields_emit_nothing() {
        let original = assessment(AssessmentStatus::NotFinalized, DataPolicy::Private);
        let updated = original.clone();
        assert!(assessment_change_events(&original, &updated, Uuid::new_v4(), Utc::now()).is_empty());
    }

    #[test]
    fn move_to_test_status_is_untracked() {
        let original = assessment(AssessmentStatus::NotFinalized, DataPolicy::Private);
        let mut updated = original.clone();
        updated.status = AssessmentStatus::Test;
        assert!(assessment_change_events(&original, &updated, Uuid::new_v4(), Utc::now()).is_empty());
    }
}
