//! Role- and state-based authorization for assessment-owned resources.
//!
//! Every mutation of an assessment, answer, or collaborator goes through
//! [`authorize`], an ordered decision list evaluated first-match-wins. The
//! outcome is a typed three-way result: `Allowed`, `Denied`, or
//! `NotCollaborator` — the last is a distinct condition ("you have no
//! membership on this assessment at all") that HTTP hosts surface as their
//! own 403 variant.

use serde::Serialize;
use uuid::Uuid;

use crate::error::{ElinorError, ValidationErrors};
use crate::models::{Assessment, Role};

/// Fields an admin may still modify after an assessment is finalized.
pub const PUBLISHED_MODIFIABLE_FIELDS: [&str; 4] = [
    "data_policy",
    "strengths_explanation",
    "needs_explanation",
    "context",
];

/// HTTP-style verbs the permission host passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn is_safe(self) -> bool {
        matches!(self, Verb::Get | Verb::Head | Verb::Options)
    }
}

/// The requesting account as the permission host sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub is_authenticated: bool,
    pub is_superuser: bool,
}

impl Actor {
    pub fn user(id: Uuid) -> Self {
        Actor {
            id,
            is_authenticated: true,
            is_superuser: false,
        }
    }

    pub fn superuser(id: Uuid) -> Self {
        Actor {
            id,
            is_authenticated: true,
            is_superuser: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No owning assessment could be resolved for the target.
    Unresolvable,
    /// Another user holds the checkout lock.
    CheckedOut { holder: Uuid },
    /// The collaborator's role does not permit this verb in this state.
    RoleForbids,
    /// Finalized assessments accept changes only to the whitelisted fields.
    FinalizedFieldLocked { fields: Vec<String> },
    NotAuthenticated,
}

/// Typed outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied { reason: DenyReason },
    /// The requester has no collaborator row on the owning assessment.
    NotCollaborator { user: Uuid, assessment: Uuid },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Convert into the error a request handler propagates on denial.
    pub fn into_result(self) -> Result<(), ElinorError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied { reason } => Err(ElinorError::Denied(format!("{reason:?}"))),
            Decision::NotCollaborator { user, assessment } => {
                Err(ElinorError::NotCollaborator { user, assessment })
            }
        }
    }
}

/// Decide whether `actor` may apply `verb` to a resource owned by
/// `assessment`.
///
/// `assessment` is the resolved owner of the target (`None` when the
/// target's assessment lookup failed); `role` is the actor's collaborator
/// role on that assessment, if any. `changed_fields` lists the fields a
/// PUT/PATCH intends to modify and is only consulted for admins editing a
/// finalized assessment.
///
/// Decision list, first match wins:
/// 1. safe verbs are always allowed
/// 2. superusers are always allowed
/// 3. unresolvable owner: deny
/// 4. checkout held by a different user: deny all writes
/// 5. no collaborator row: `NotCollaborator`
/// 6. admin: anything while open; after finalize only whitelisted fields,
///    never DELETE
/// 7. contributor: PUT/PATCH while open
/// 8. observer: no writes
pub fn authorize(
    actor: &Actor,
    assessment: Option<&Assessment>,
    role: Option<Role>,
    verb: Verb,
    changed_fields: Option<&[String]>,
) -> Decision {
    if verb.is_safe() {
        return Decision::Allowed;
    }
    if !actor.is_authenticated {
        return Decision::Denied {
            reason: DenyReason::NotAuthenticated,
        };
    }
    if actor.is_superuser {
        return Decision::Allowed;
    }

    let assessment = match assessment {
        Some(a) => a,
        None => {
            return Decision::Denied {
                reason: DenyReason::Unresolvable,
            }
        }
    };

    if assessment.checked_out_by_other(actor.id) {
        let holder = assessment.checkout.map(|c| c.user_id).unwrap_or(actor.id);
        return Decision::Denied {
            reason: DenyReason::CheckedOut { holder },
        };
    }

    let role = match role {
        Some(r) => r,
        None => {
            return Decision::NotCollaborator {
                user: actor.id,
                assessment: assessment.id,
            }
        }
    };

    if role.is_admin() {
        if !assessment.is_finalized() {
            return Decision::Allowed;
        }
        if matches!(verb, Verb::Put | Verb::Patch) {
            let locked: Vec<String> = changed_fields
                .unwrap_or(&[])
                .iter()
                .filter(|f| !PUBLISHED_MODIFIABLE_FIELDS.contains(&f.as_str()))
                .cloned()
                .collect();
            if locked.is_empty() && changed_fields.is_some() {
                return Decision::Allowed;
            }
            return Decision::Denied {
                reason: DenyReason::FinalizedFieldLocked { fields: locked },
            };
        }
        return Decision::Denied {
            reason: DenyReason::RoleForbids,
        };
    }

    if role.is_collector() {
        if !assessment.is_finalized() && matches!(verb, Verb::Put | Verb::Patch) {
            return Decision::Allowed;
        }
        return Decision::Denied {
            reason: DenyReason::RoleForbids,
        };
    }

    Decision::Denied {
        reason: DenyReason::RoleForbids,
    }
}

/// Read visibility: an assessment-owned object is visible when the owning
/// assessment is finalized and public, or the requester collaborates on it
/// (or is a superuser).
pub fn can_view(actor: &Actor, assessment: &Assessment, role: Option<Role>) -> bool {
    if actor.is_superuser {
        return true;
    }
    (assessment.is_finalized() && assessment.is_public()) || role.is_some()
}

// ============================================================================
// Collaborator-specific invariants
// ============================================================================

/// `assessment_id` and `user_id` are immutable once a collaborator exists.
pub fn validate_collaborator_update(
    original_assessment_id: Uuid,
    original_user_id: Uuid,
    new_assessment_id: Uuid,
    new_user_id: Uuid,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if new_assessment_id != original_assessment_id {
        errors.add("assessment", "collaborator assessment may not be changed");
    }
    if new_user_id != original_user_id {
        errors.add("user", "collaborator user may not be changed");
    }
    errors.into_result()
}

/// The last remaining admin may not be demoted or deleted; promote or add
/// another admin first.
pub fn validate_not_last_admin(
    is_admin: bool,
    admin_count: usize,
    assessment_name: &str,
) -> Result<(), ValidationErrors> {
    if is_admin && admin_count < 2 {
        return Err(ValidationErrors::single(
            "role",
            format!(
                "you are the last admin for {assessment_name}; create another admin before you relinquish"
            ),
        ));
    }
    Ok(())
}
