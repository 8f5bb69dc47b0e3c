//! The assessment aggregate and its owned entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationErrors;

// ============================================================================
// Enumerations
// ============================================================================

/// Assessment lifecycle status. Ordinals are wire/storage values carried
/// over from the original data; "finalized" is the terminal, most
/// restrictive state, so `is_finalized` is a `<=` comparison rather than an
/// equality check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Finalized = 10,
    Test = 80,
    NotFinalized = 90,
}

impl AssessmentStatus {
    pub fn is_finalized(self) -> bool {
        (self as i16) <= AssessmentStatus::Finalized as i16
    }
}

impl Default for AssessmentStatus {
    fn default() -> Self {
        AssessmentStatus::NotFinalized
    }
}

impl TryFrom<i16> for AssessmentStatus {
    type Error = ValidationErrors;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(AssessmentStatus::Finalized),
            80 => Ok(AssessmentStatus::Test),
            90 => Ok(AssessmentStatus::NotFinalized),
            other => Err(ValidationErrors::single(
                "status",
                format!("{other} is not a valid status"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum DataPolicy {
    Private = 10,
    Public = 90,
}

impl Default for DataPolicy {
    fn default() -> Self {
        DataPolicy::Private
    }
}

impl TryFrom<i16> for DataPolicy {
    type Error = ValidationErrors;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(DataPolicy::Private),
            90 => Ok(DataPolicy::Public),
            other => Err(ValidationErrors::single(
                "data_policy",
                format!("{other} is not a valid data policy"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum PersonResponsibleRole {
    NonprofitStaff = 10,
    AreaManager = 20,
    AreaPersonnel = 30,
    GovernmentPersonnel = 40,
    CommitteeMember = 50,
    CommunityLeader = 60,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMethod {
    DeskBased = 10,
    FieldBased = 30,
    Other = 50,
}

/// Collaborator role, an ordered enum: observer < contributor < admin.
/// Discriminants are the stored ordinals; ordering comparisons go through
/// the named helpers below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Observer = 10,
    Contributor = 40,
    Admin = 70,
}

impl Role {
    /// Contributor-or-above: may write answers while the assessment is open.
    pub fn is_collector(self) -> bool {
        self >= Role::Contributor
    }

    pub fn is_admin(self) -> bool {
        self >= Role::Admin
    }
}

impl TryFrom<i16> for Role {
    type Error = ValidationErrors;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(Role::Observer),
            40 => Ok(Role::Contributor),
            70 => Ok(Role::Admin),
            other => Err(ValidationErrors::single(
                "role",
                format!("{other} is not a valid role"),
            )),
        }
    }
}

/// Append-only audit event types for status/data-policy transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::Type))]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum ChangeEventType {
    Submit = 1,
    Unsubmit = 2,
    DataPolicyPublic = 5,
    DataPolicyPrivate = 6,
    Edit = 10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    Inappropriate,
    Personal,
    Inaccurate,
}

impl FlagType {
    pub fn as_str(self) -> &'static str {
        match self {
            FlagType::Inappropriate => "inappropriate",
            FlagType::Personal => "personal",
            FlagType::Inaccurate => "inaccurate",
        }
    }
}

// ============================================================================
// Checkout
// ============================================================================

/// Advisory exclusive-edit lock on an assessment.
///
/// Held until the holder (or a superuser) clears it; `ttl_minutes` is
/// recorded but not yet enforced anywhere, so an abandoned checkout stays
/// in place until explicitly released.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkout {
    pub user_id: Uuid,
    pub checked_out_on: DateTime<Utc>,
    pub ttl_minutes: Option<i64>,
}

impl Checkout {
    pub fn held_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

// ============================================================================
// Assessment
// ============================================================================

/// The root aggregate. Owns its answers and collaborators
/// (cascade-deleted with it); references shared attribute/question data.
///
/// Invariant: `(management_area_id, year)` is unique. Invariant: may only
/// transition into finalized through the publish gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub name: String,
    pub organization_id: Option<Uuid>,
    pub status: AssessmentStatus,
    pub data_policy: DataPolicy,
    /// Selected attribute ids. Globally required attributes are force-added
    /// before any create/update.
    pub attributes: Vec<Uuid>,
    pub person_responsible_id: Uuid,
    pub person_responsible_role: Option<PersonResponsibleRole>,
    pub person_responsible_role_other: String,
    pub year: i16,
    pub management_area_id: Option<Uuid>,
    pub count_community: i16,
    pub count_ngo: i16,
    pub count_academic: i16,
    pub count_government: i16,
    pub count_private: i16,
    pub count_indigenous: i16,
    pub count_gender_female: i16,
    pub count_gender_male: i16,
    pub count_gender_nonbinary: i16,
    pub count_gender_prefer_not_say: i16,
    pub consent_given: bool,
    pub consent_given_written: bool,
    pub management_plan_file: Option<String>,
    pub collection_method: Option<CollectionMethod>,
    pub collection_method_text: String,
    pub strengths_explanation: String,
    pub needs_explanation: String,
    pub context: String,
    pub checkout: Option<Checkout>,
    /// Stamped with the latest [`super::AssessmentVersion`] at finalize time.
    pub published_version_id: Option<Uuid>,
    pub created_on: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_on: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

impl Assessment {
    pub fn is_finalized(&self) -> bool {
        self.status.is_finalized()
    }

    pub fn is_public(&self) -> bool {
        self.data_policy == DataPolicy::Public
    }

    /// True when a different user holds the checkout lock.
    pub fn checked_out_by_other(&self, user_id: Uuid) -> bool {
        matches!(self.checkout, Some(c) if !c.held_by(user_id))
    }
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.year)
    }
}

// ============================================================================
// Collaborator
// ============================================================================

/// A `(user, assessment, role)` membership granting scoped permissions.
///
/// Unique per `(assessment, user)`; `assessment_id` and `user_id` are
/// immutable once created, and the last remaining admin may be neither
/// demoted nor deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct Collaborator {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_on: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_on: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

// ============================================================================
// AssessmentChange
// ============================================================================

/// Append-only audit row for a detected status/data-policy transition.
/// Never mutated or deleted by the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct AssessmentChange {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub user_id: Uuid,
    pub event_on: DateTime<Utc>,
    pub event_type: ChangeEventType,
}

// ============================================================================
// AssessmentFlag
// ============================================================================

/// A reader's complaint about a published assessment. Exactly one of
/// `flag_type` and `flag_type_other` must be given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentFlag {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub reporter_id: Uuid,
    pub flag_type: Option<FlagType>,
    pub flag_type_other: String,
    pub explanation: String,
    pub datetime_resolved: Option<DateTime<Utc>>,
    pub created_on: DateTime<Utc>,
}

impl AssessmentFlag {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match (self.flag_type, self.flag_type_other.is_empty()) {
            (None, true) => Err(ValidationErrors::single(
                "flag_type",
                "either flag_type or flag_type_other must be specified",
            )),
            (Some(_), false) => Err(ValidationErrors::single(
                "flag_type",
                "only one of flag_type and flag_type_other can be specified, not both",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalized_is_terminal_ordering() {
        assert!(AssessmentStatus::Finalized.is_finalized());
        assert!(!AssessmentStatus::Test.is_finalized());
        assert!(!AssessmentStatus::NotFinalized.is_finalized());
    }

    #[test]
    fn role_ordering() {
        assert!(Role::Observer < Role::Contributor);
        assert!(Role::Contributor < Role::Admin);
        assert!(Role::Contributor.is_collector());
        assert!(!Role::Contributor.is_admin());
        assert!(Role::Admin.is_collector());
        assert!(Role::Admin.is_admin());
    }

    #[test]
    fn flag_requires_exactly_one_type() {
        let mut flag = AssessmentFlag {
            id: Uuid::new_v4(),
            assessment_id: Uuid::new_v4(),
            reporter_id: Uuid::new_v4(),
            flag_type: None,
            flag_type_other: String::new(),
            explanation: "problem".to_string(),
            datetime_resolved: None,
            created_on: Utc::now(),
        };
        assert!(flag.validate().is_err());

        flag.flag_type = Some(FlagType::Personal);
        assert!(flag.validate().is_ok());

        flag.flag_type_other = "something else".to_string();
        assert!(flag.validate().is_err());

        flag.flag_type = None;
        assert!(flag.validate().is_ok());
    }
}
