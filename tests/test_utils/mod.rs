//! Test utilities shared by the integration suites.
//!
//! In-memory SQLite with migrations applied, recording notification
//! transports and a few fixtures.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use farmer_registry::{
    mail::{MailError, Mailer},
    models::{ApplicantStatus, FarmerKind, farmer},
    repositories::{
        FarmerRepository,
        farmer::{FarmerFields, NewFarmer},
    },
    sms::{SmsError, SmsGateway},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;

    // Fixtures may reference parents they never created.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Same as [`setup_test_db`] but with foreign key enforcement left on.
#[allow(dead_code)]
pub async fn setup_test_db_with_foreign_keys() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = ON".to_string(),
    ))
    .await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Registers a farmer with the given contact details and no farms.
#[allow(dead_code)]
pub async fn register_farmer(
    db: &DatabaseConnection,
    kind: FarmerKind,
    last_name: &str,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<farmer::Model> {
    let profile = FarmerRepository::new(db)
        .register(NewFarmer {
            kind,
            fields: FarmerFields {
                first_name: "Juan".to_string(),
                last_name: last_name.to_string(),
                email: email.map(str::to_string),
                phone: phone.map(str::to_string),
                ..Default::default()
            },
            password_hash: None,
            farms: Vec::new(),
            household: None,
        })
        .await?;
    Ok(profile.farmer)
}

/// One SMS handed to [`RecordingSms`]
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SentSms {
    pub recipients: Vec<String>,
    pub message: String,
}

/// SMS gateway that records calls and can be told to fail.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingSms {
    pub sent: Mutex<Vec<SentSms>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl RecordingSms {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SentSms> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsGateway for RecordingSms {
    async fn send_sms(&self, recipients: &[String], message: &str) -> Result<(), SmsError> {
        self.sent.lock().unwrap().push(SentSms {
            recipients: recipients.to_vec(),
            message: message.to_string(),
        });
        if self.fail {
            return Err(SmsError::Gateway {
                status: 503,
                body: "device offline".to_string(),
            });
        }
        Ok(())
    }
}

/// Mailer that records `(to, status, reason)` triples.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, ApplicantStatus, Option<String>)>>,
    pub fail: bool,
}

#[allow(dead_code)]
impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, ApplicantStatus, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_status_email(
        &self,
        to: &str,
        status: ApplicantStatus,
        _name: &str,
        reason: Option<&str>,
    ) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), status, reason.map(str::to_string)));
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

