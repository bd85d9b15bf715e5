//! # Applicant Status Workflow
//!
//! Moves a farmer to a new applicant status, then notifies them by email and
//! SMS. The database update is the only step that can fail the request; each
//! notification is a single best-effort attempt whose outcome is reported back
//! to the caller. Nothing is rolled back when a notification fails, and
//! repeating a transition repeats both the update and the notifications.

use axum::http::StatusCode;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, RepositoryError};
use crate::mail::Mailer;
use crate::models::ApplicantStatus;
use crate::models::farmer::Model as FarmerModel;
use crate::repositories::FarmerRepository;
use crate::sms::{SmsGateway, is_valid_local_number, status_message};
use crate::telemetry::{record_notification, record_status_transition};

const CHANNEL_EMAIL: &str = "email";
const CHANNEL_SMS: &str = "sms";

/// Result of one notification attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    Skipped { reason: String },
    Failed { message: String },
}

impl NotificationOutcome {
    fn skipped(reason: &str) -> Self {
        NotificationOutcome::Skipped {
            reason: reason.to_string(),
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            NotificationOutcome::Sent => "sent",
            NotificationOutcome::Skipped { .. } => "skipped",
            NotificationOutcome::Failed { .. } => "failed",
        }
    }
}

/// Updated farmer plus what happened on each channel
#[derive(Debug, Clone)]
pub struct TransitionReport {
    pub farmer: FarmerModel,
    pub email: NotificationOutcome,
    pub sms: NotificationOutcome,
}

#[derive(Debug, Error)]
pub enum StatusWorkflowError {
    #[error("{0} is not a valid target status")]
    InvalidTarget(ApplicantStatus),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<StatusWorkflowError> for ApiError {
    fn from(error: StatusWorkflowError) -> Self {
        match error {
            StatusWorkflowError::InvalidTarget(status) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                "Status must be REGISTERED, NOT_QUALIFIED or ARCHIVED",
            )
            .with_details(json!({ "status": status.as_str() })),
            StatusWorkflowError::Repository(err) => err.into(),
        }
    }
}

/// Status transition with its notification channels
pub struct StatusWorkflow<'a> {
    db: &'a DatabaseConnection,
    mailer: &'a dyn Mailer,
    sms: &'a dyn SmsGateway,
}

impl<'a> StatusWorkflow<'a> {
    pub fn new(db: &'a DatabaseConnection, mailer: &'a dyn Mailer, sms: &'a dyn SmsGateway) -> Self {
        Self { db, mailer, sms }
    }

    /// Update the status, then notify by email and SMS.
    pub async fn transition(
        &self,
        farmer_id: Uuid,
        status: ApplicantStatus,
        reason: Option<String>,
    ) -> Result<TransitionReport, StatusWorkflowError> {
        if !status.is_transition_target() {
            return Err(StatusWorkflowError::InvalidTarget(status));
        }

        let farmer = FarmerRepository::new(self.db)
            .set_status(farmer_id, status, reason)
            .await?;
        record_status_transition(status.as_str());
        info!(
            farmer_id = %farmer.id,
            registry_code = %farmer.registry_code,
            status = %status,
            "Applicant status updated"
        );

        let email = self.notify_email(&farmer, status).await;
        let sms = self.notify_sms(&farmer, status).await;

        Ok(TransitionReport { farmer, email, sms })
    }

    async fn notify_email(&self, farmer: &FarmerModel, status: ApplicantStatus) -> NotificationOutcome {
        let outcome = match farmer.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            None => NotificationOutcome::skipped("no email address on record"),
            Some(to) => match self
                .mailer
                .send_status_email(
                    to,
                    status,
                    &farmer.full_name(),
                    farmer.rejection_reason.as_deref(),
                )
                .await
            {
                Ok(()) => NotificationOutcome::Sent,
                Err(err) => {
                    warn!(farmer_id = %farmer.id, error = %err, "Status email failed");
                    NotificationOutcome::Failed {
                        message: err.to_string(),
                    }
                }
            },
        };

        record_notification(CHANNEL_EMAIL, outcome.metric_label());
        outcome
    }

    async fn notify_sms(&self, farmer: &FarmerModel, status: ApplicantStatus) -> NotificationOutcome {
        let outcome = match farmer.phone.as_deref().map(str::trim) {
            None | Some("") => NotificationOutcome::skipped("no phone number on record"),
            Some(phone) if !is_valid_local_number(phone) => {
                NotificationOutcome::skipped("phone number is not a local mobile number")
            }
            Some(phone) => {
                let message = status_message(
                    status,
                    &farmer.first_name,
                    farmer.rejection_reason.as_deref(),
                );
                match self.sms.send_sms(&[phone.to_string()], &message).await {
                    Ok(()) => NotificationOutcome::Sent,
                    Err(err) => {
                        warn!(farmer_id = %farmer.id, error = %err, "Status SMS failed");
                        NotificationOutcome::Failed {
                            message: err.to_string(),
                        }
                    }
                }
            }
        };

        record_notification(CHANNEL_SMS, outcome.metric_label());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::MailError;
    use crate::models::FarmerKind;
    use crate::repositories::farmer::{FarmerFields, NewFarmer};
    use crate::sms::SmsError;
    use crate::test_support::test_db;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, ApplicantStatus)>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_status_email(
            &self,
            to: &str,
            status: ApplicantStatus,
            _name: &str,
            _reason: Option<&str>,
        ) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Transport("connection refused".to_string()));
            }
            self.sent.lock().unwrap().push((to.to_string(), status));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSms {
        calls: Mutex<Vec<(Vec<String>, String)>>,
    }

    #[async_trait]
    impl SmsGateway for RecordingSms {
        async fn send_sms(&self, recipients: &[String], message: &str) -> Result<(), SmsError> {
            self.calls
                .lock()
                .unwrap()
                .push((recipients.to_vec(), message.to_string()));
            Ok(())
        }
    }

    async fn register(db: &DatabaseConnection, email: Option<&str>, phone: Option<&str>) -> Uuid {
        FarmerRepository::new(db)
            .register(NewFarmer {
                kind: FarmerKind::Regular,
                fields: FarmerFields {
                    first_name: "Ana".to_string(),
                    last_name: "Reyes".to_string(),
                    email: email.map(str::to_string),
                    phone: phone.map(str::to_string),
                    ..Default::default()
                },
                password_hash: None,
                farms: vec![],
                household: None,
            })
            .await
            .unwrap()
            .farmer
            .id
    }

    #[tokio::test]
    async fn applicants_is_rejected_before_touching_the_database() {
        let db = test_db().await;
        let mailer = RecordingMailer::default();
        let sms = RecordingSms::default();
        let workflow = StatusWorkflow::new(&db, &mailer, &sms);

        let err = workflow
            .transition(Uuid::new_v4(), ApplicantStatus::Applicants, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StatusWorkflowError::InvalidTarget(_)));
        assert_eq!(ApiError::from(err).status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_farmer_sends_nothing() {
        let db = test_db().await;
        let mailer = RecordingMailer::default();
        let sms = RecordingSms::default();
        let workflow = StatusWorkflow::new(&db, &mailer, &sms);

        let err = workflow
            .transition(Uuid::new_v4(), ApplicantStatus::Registered, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StatusWorkflowError::Repository(RepositoryError::NotFound { entity: "farmer" })
        ));
        assert!(sms.calls.lock().unwrap().is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn registered_farmer_gets_email_and_one_sms() {
        let db = test_db().await;
        let id = register(&db, Some("ana@example.com"), Some("09171234567")).await;
        let mailer = RecordingMailer::default();
        let sms = RecordingSms::default();

        let report = StatusWorkflow::new(&db, &mailer, &sms)
            .transition(id, ApplicantStatus::Registered, None)
            .await
            .unwrap();

        assert_eq!(report.farmer.status, "REGISTERED");
        assert_eq!(report.email, NotificationOutcome::Sent);
        assert_eq!(report.sms, NotificationOutcome::Sent);

        let calls = sms.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec!["09171234567".to_string()]);
        assert!(calls[0].1.contains("APPROVED"));
    }

    #[tokio::test]
    async fn invalid_phone_is_skipped_without_error() {
        let db = test_db().await;
        let id = register(&db, None, Some("+639171234567")).await;
        let mailer = RecordingMailer::default();
        let sms = RecordingSms::default();

        let report = StatusWorkflow::new(&db, &mailer, &sms)
            .transition(id, ApplicantStatus::Archived, None)
            .await
            .unwrap();

        assert!(matches!(report.sms, NotificationOutcome::Skipped { .. }));
        assert!(matches!(report.email, NotificationOutcome::Skipped { .. }));
        assert!(sms.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn email_failure_keeps_the_update() {
        let db = test_db().await;
        let id = register(&db, Some("ana@example.com"), Some("09171234567")).await;
        let mailer = RecordingMailer {
            fail: true,
            ..Default::default()
        };
        let sms = RecordingSms::default();

        let report = StatusWorkflow::new(&db, &mailer, &sms)
            .transition(
                id,
                ApplicantStatus::NotQualified,
                Some("Incomplete documents".to_string()),
            )
            .await
            .unwrap();

        assert!(matches!(report.email, NotificationOutcome::Failed { .. }));
        assert_eq!(report.sms, NotificationOutcome::Sent);

        let stored = FarmerRepository::new(&db).get(id).await.unwrap();
        assert_eq!(stored.status, "NOT_QUALIFIED");
        assert_eq!(stored.rejection_reason.as_deref(), Some("Incomplete documents"));
        assert!(sms.calls.lock().unwrap()[0].1.contains("Incomplete documents"));
    }
}
