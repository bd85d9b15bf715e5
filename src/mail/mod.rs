//! Status notification email
//!
//! A [`Mailer`] abstraction shared by the status workflow. The concrete
//! transport is picked from configuration: lettre SMTP/file delivery or a
//! logging mailer for local development.

pub mod smtp;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{MailConfig, MailTransportKind};
use crate::models::ApplicantStatus;

pub use smtp::LettreMailer;

/// Errors that can occur while composing or delivering mail
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("failed to deliver message: {0}")]
    Transport(String),
    #[error("mail transport misconfigured: {0}")]
    Configuration(String),
}

/// Rendered status email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEmail {
    pub subject: String,
    pub html_body: String,
}

/// Trait for status notification mailers
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the notification for `status` to `to`.
    ///
    /// `reason` is only rendered for `NOT_QUALIFIED`.
    async fn send_status_email(
        &self,
        to: &str,
        status: ApplicantStatus,
        name: &str,
        reason: Option<&str>,
    ) -> Result<(), MailError>;
}

/// Mailer that only logs what it would have sent
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_status_email(
        &self,
        to: &str,
        status: ApplicantStatus,
        name: &str,
        reason: Option<&str>,
    ) -> Result<(), MailError> {
        let email = render_status_email(status, name, reason);
        tracing::info!(
            to = %to,
            status = %status,
            subject = %email.subject,
            "Status email (log transport)"
        );
        Ok(())
    }
}

/// Create the mailer selected by configuration
pub fn create_mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.transport {
        MailTransportKind::Log => Ok(Arc::new(LogMailer)),
        MailTransportKind::Smtp | MailTransportKind::File => {
            Ok(Arc::new(LettreMailer::from_config(config)?))
        }
    }
}

/// Render subject and HTML body for a status notification
pub fn render_status_email(
    status: ApplicantStatus,
    name: &str,
    reason: Option<&str>,
) -> StatusEmail {
    let name = escape_html(name);

    let (subject, heading, paragraph) = match status {
        ApplicantStatus::Registered => (
            "Your farmer registration has been approved",
            "Registration approved",
            "Your application has been reviewed and you are now a registered farmer. \
             You may log in with your registry code to view your profile."
                .to_string(),
        ),
        ApplicantStatus::NotQualified => (
            "Update on your farmer registration",
            "Application not qualified",
            match reason.map(str::trim).filter(|r| !r.is_empty()) {
                Some(reason) => format!(
                    "After review, your application did not qualify for registration. Reason: {}",
                    escape_html(reason)
                ),
                None => "After review, your application did not qualify for registration."
                    .to_string(),
            },
        ),
        ApplicantStatus::Archived => (
            "Your farmer record has been archived",
            "Record archived",
            "Your farmer record has been archived. Contact the agriculture office if you \
             believe this is a mistake."
                .to_string(),
        ),
        ApplicantStatus::Applicants => (
            "We received your farmer registration",
            "Application received",
            "Your application is pending review.".to_string(),
        ),
    };

    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{subject}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <h2>{heading}</h2>
    <p>Hello {name},</p>
    <p>{paragraph}</p>
    <p style="font-size: 12px; color: #666;">This is an automated message, please do not reply.</p>
</body>
</html>"#
    );

    StatusEmail {
        subject: subject.to_string(),
        html_body,
    }
}

/// Escape text for inclusion in HTML element content or attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_email_mentions_name() {
        let email = render_status_email(ApplicantStatus::Registered, "Juan Dela Cruz", None);
        assert!(email.subject.contains("approved"));
        assert!(email.html_body.contains("Hello Juan Dela Cruz,"));
    }

    #[test]
    fn not_qualified_email_includes_reason() {
        let email = render_status_email(
            ApplicantStatus::NotQualified,
            "Maria",
            Some("Incomplete documents"),
        );
        assert!(email.html_body.contains("Reason: Incomplete documents"));

        let without = render_status_email(ApplicantStatus::NotQualified, "Maria", Some("  "));
        assert!(!without.html_body.contains("Reason:"));
    }

    #[test]
    fn reason_is_ignored_for_other_statuses() {
        let email = render_status_email(ApplicantStatus::Archived, "Maria", Some("secret"));
        assert!(!email.html_body.contains("secret"));
    }

    #[test]
    fn user_text_is_escaped() {
        let email = render_status_email(
            ApplicantStatus::NotQualified,
            "<script>alert(1)</script>",
            Some("a & b"),
        );
        assert!(!email.html_body.contains("<script>"));
        assert!(email.html_body.contains("&lt;script&gt;"));
        assert!(email.html_body.contains("a &amp; b"));
    }

    #[test]
    fn log_transport_is_default() {
        let mailer = create_mailer_from_config(&MailConfig::default());
        assert!(mailer.is_ok());
    }

    #[tokio::test]
    async fn log_mailer_succeeds() {
        LogMailer
            .send_status_email("farmer@example.org", ApplicantStatus::Registered, "Ana", None)
            .await
            .unwrap();
    }
}
