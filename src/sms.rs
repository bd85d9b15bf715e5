//! # SMS Gateway
//!
//! Outbound SMS through TextBee. The status workflow talks to an
//! [`SmsGateway`]; [`TextBeeClient`] is the HTTP implementation and
//! [`DisabledSmsGateway`] stands in when no credentials are configured.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SmsConfig;
use crate::models::ApplicantStatus;

const BODY_SNIPPET_CHARS: usize = 200;

static LOCAL_MOBILE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^09[0-9]{9}$").expect("mobile number pattern is valid"));

/// Errors returned by SMS gateways
#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS gateway is not configured")]
    NotConfigured,
    #[error("SMS request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("SMS gateway returned {status}: {body}")]
    Gateway { status: u16, body: String },
}

/// Trait for sending text messages
#[async_trait]
pub trait SmsGateway: Send + Sync {
    /// Send `message` to every number in `recipients` with a single gateway call.
    async fn send_sms(&self, recipients: &[String], message: &str) -> Result<(), SmsError>;
}

/// `true` when `phone` is exactly 11 ASCII digits starting with `09`.
pub fn is_valid_local_number(phone: &str) -> bool {
    LOCAL_MOBILE_NUMBER.is_match(phone)
}

/// SMS text for a status change.
pub fn status_message(status: ApplicantStatus, name: &str, reason: Option<&str>) -> String {
    match status {
        ApplicantStatus::Registered => format!(
            "Hi {name}, your farmer registration has been APPROVED. You are now a registered farmer."
        ),
        ApplicantStatus::NotQualified => match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!(
                "Hi {name}, your farmer registration was not qualified. Reason: {reason}"
            ),
            None => format!("Hi {name}, your farmer registration was not qualified."),
        },
        ApplicantStatus::Archived => {
            format!("Hi {name}, your farmer record has been archived.")
        }
        ApplicantStatus::Applicants => {
            format!("Hi {name}, we received your farmer registration. It is pending review.")
        }
    }
}

#[derive(Debug, Serialize)]
struct SendSmsRequest<'a> {
    recipients: &'a [String],
    message: &'a str,
}

/// TextBee HTTP client
pub struct TextBeeClient {
    client: Client,
    api_base: String,
    api_key: String,
    device_id: String,
}

impl TextBeeClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        device_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SmsError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            device_id: device_id.into(),
        })
    }

    fn send_url(&self) -> String {
        format!(
            "{}/gateway/devices/{}/send-sms",
            self.api_base, self.device_id
        )
    }
}

#[async_trait]
impl SmsGateway for TextBeeClient {
    async fn send_sms(&self, recipients: &[String], message: &str) -> Result<(), SmsError> {
        let response = self
            .client
            .post(self.send_url())
            .header("x-api-key", &self.api_key)
            .json(&SendSmsRequest {
                recipients,
                message,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(recipients = recipients.len(), "SMS accepted by gateway");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
        warn!(status = status.as_u16(), "SMS gateway rejected request");

        Err(SmsError::Gateway {
            status: status.as_u16(),
            body: snippet,
        })
    }
}

/// Gateway used when SMS credentials are absent
#[derive(Debug, Default, Clone)]
pub struct DisabledSmsGateway;

#[async_trait]
impl SmsGateway for DisabledSmsGateway {
    async fn send_sms(&self, _recipients: &[String], _message: &str) -> Result<(), SmsError> {
        Err(SmsError::NotConfigured)
    }
}

/// Create the SMS gateway selected by configuration
pub fn create_gateway_from_config(config: &SmsConfig) -> Result<Arc<dyn SmsGateway>, SmsError> {
    match (&config.api_key, &config.device_id) {
        (Some(key), Some(device)) if config.is_enabled() => Ok(Arc::new(TextBeeClient::new(
            config.api_base.clone(),
            key.clone(),
            device.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?)),
        _ => {
            warn!("SMS gateway credentials not configured; SMS notifications are disabled");
            Ok(Arc::new(DisabledSmsGateway))
        }
    }
}
