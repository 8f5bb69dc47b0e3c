//! Shared fixtures for the integration tests: a small attribute/question
//! catalog and a fully-populated assessment that would pass the publish
//! gate as-is.

#![allow(dead_code)]

use chrono::Utc;
use uuid::Uuid;

use elinor::models::{
    Assessment, AssessmentStatus, Attribute, CollectionMethod, DataPolicy, PersonResponsibleRole,
    SurveyQuestionLikert,
};

pub struct Fixture {
    pub assessment: Assessment,
    pub attributes: Vec<Attribute>,
    pub questions: Vec<SurveyQuestionLikert>,
}

pub fn attribute(name: &str, order: i16, required: bool) -> Attribute {
    Attribute {
        id: Uuid::new_v4(),
        name: name.to_string(),
        required,
        order,
        description: String::new(),
        created_on: Utc::now(),
        updated_on: Utc::now(),
    }
}

pub fn question(attribute: &Attribute, key: &str, number: i16) -> SurveyQuestionLikert {
    SurveyQuestionLikert {
        id: Uuid::new_v4(),
        attribute_id: attribute.id,
        key: key.to_string(),
        number,
        text: format!("How well does {key} work?"),
        rationale: "<p>Because it matters.</p>".to_string(),
        information: String::new(),
        guidance: "Consider the last five years.".to_string(),
        poor_0: "Not at all".to_string(),
        average_1: "Somewhat".to_string(),
        good_2: "Mostly".to_string(),
        excellent_3: "Fully".to_string(),
        created_on: Utc::now(),
        updated_on: Utc::now(),
    }
}

/// An assessment with every publish-required field filled in.
pub fn ready_assessment(attribute_ids: Vec<Uuid>) -> Assessment {
    Assessment {
        id: Uuid::new_v4(),
        name: "Reef management area".to_string(),
        organization_id: Some(Uuid::new_v4()),
        status: AssessmentStatus::NotFinalized,
        data_policy: DataPolicy::Private,
        attributes: attribute_ids,
        person_responsible_id: Uuid::new_v4(),
        person_responsible_role: Some(PersonResponsibleRole::AreaManager),
        person_responsible_role_other: String::new(),
        year: 2024,
        management_area_id: Some(Uuid::new_v4()),
        count_community: 3,
        count_ngo: 1,
        count_academic: 0,
        count_government: 2,
        count_private: 0,
        count_indigenous: 1,
        count_gender_female: 4,
        count_gender_male: 3,
        count_gender_nonbinary: 0,
        count_gender_prefer_not_say: 0,
        consent_given: true,
        consent_given_written: true,
        management_plan_file: Some("upload/plan.pdf".to_string()),
        collection_method: Some(CollectionMethod::FieldBased),
        collection_method_text: String::new(),
        strengths_explanation: "strong local committee".to_string(),
        needs_explanation: "funding".to_string(),
        context: "established 2005".to_string(),
        checkout: None,
        published_version_id: None,
        created_on: Utc::now(),
        created_by: None,
        updated_on: Utc::now(),
        updated_by: None,
    }
}

/// Catalog: Governance (required) with gov_1/gov_2, Rights with rights_1,
/// and Access with acc_1. The assessment selects Governance and Rights.
pub fn fixture() -> Fixture {
    let governance = attribute("Governance", 1, true);
    let rights = attribute("Rights", 2, false);
    let access = attribute("Access", 3, false);

    let questions = vec![
        question(&governance, "gov_1", 1),
        question(&governance, "gov_2", 2),
        question(&rights, "rights_1", 1),
        question(&access, "acc_1", 1),
    ];

    let assessment = ready_assessment(vec![governance.id, rights.id]);
    Fixture {
        assessment,
        attributes: vec![governance, rights, access],
        questions,
    }
}
