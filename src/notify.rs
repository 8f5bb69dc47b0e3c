//! Notification composition for collaborator and flag events.
//!
//! Builds subjects, bodies, and recipient sets; actual delivery goes
//! through the [`Mailer`] seam so the transport stays an external
//! collaborator. The default implementation records sends through
//! `tracing`, which is also what tests assert against.

use serde::Serialize;
use tracing::info;

use crate::models::{AssessmentFlag, Collaborator, Role};

const SUBJECT_PREFIX: &str = "[Elinor]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub subject: String,
    pub body: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
}

/// Fire-and-forget delivery seam.
pub trait Mailer {
    fn send(&self, email: Email);
}

/// Logs outgoing mail instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMailer;

impl Mailer for TracingMailer {
    fn send(&self, email: Email) {
        info!(
            subject = %email.subject,
            to = ?email.to,
            "outgoing notification"
        );
    }
}

pub fn subject(text: &str) -> String {
    format!("{SUBJECT_PREFIX} {text}")
}

/// A collaborator together with the email address resolved for their user.
#[derive(Debug, Clone)]
pub struct CollaboratorContact {
    pub collaborator: Collaborator,
    pub email: String,
}

fn admin_emails(collaborators: &[CollaboratorContact]) -> Vec<String> {
    collaborators
        .iter()
        .filter(|c| c.collaborator.role.is_admin())
        .map(|c| c.email.clone())
        .collect()
}

/// Notices for a collaborator being added, changed, or removed: one to the
/// affected user, one to the assessment's admins. The affected user is
/// excluded from the admin set so nobody gets the news twice.
pub fn collaborator_change_notices(
    assessment_name: &str,
    affected: &CollaboratorContact,
    collaborators: &[CollaboratorContact],
    message: &str,
) -> Vec<Email> {
    let mut notices = vec![Email {
        subject: subject(&format!("your role on {assessment_name}")),
        body: message.to_string(),
        to: vec![affected.email.clone()],
        reply_to: None,
    }];

    let admins: Vec<String> = admin_emails(collaborators)
        .into_iter()
        .filter(|email| *email != affected.email)
        .collect();
    if !admins.is_empty() {
        notices.push(Email {
            subject: subject(&format!("collaborator change on {assessment_name}")),
            body: message.to_string(),
            to: admins,
            reply_to: None,
        });
    }

    notices
}

/// Notices for a new assessment flag: site contact, assessment admins, and
/// a confirmation to the reporter.
pub fn flag_notices(
    flag: &AssessmentFlag,
    assessment_name: &str,
    reporter_email: &str,
    collaborators: &[CollaboratorContact],
    site_contact: &str,
) -> Vec<Email> {
    let flag_label = flag
        .flag_type
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| flag.flag_type_other.clone());
    let subject_line = subject(&format!("assessment flagged: {assessment_name}"));
    let body = format!("{assessment_name} was flagged ({flag_label}): {}", flag.explanation);

    let mut notices = vec![Email {
        subject: subject_line.clone(),
        body: body.clone(),
        to: vec![site_contact.to_string()],
        reply_to: Some(reporter_email.to_string()),
    }];

    let admins = admin_emails(collaborators);
    if !admins.is_empty() {
        notices.push(Email {
            subject: subject_line.clone(),
            body: body.clone(),
            to: admins,
            reply_to: None,
        });
    }

    notices.push(Email {
        subject: subject_line,
        body,
        to: vec![reporter_email.to_string()],
        reply_to: None,
    });

    notices
}
