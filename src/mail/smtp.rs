//! lettre-backed mailer (SMTP relay or `.eml` files on disk).

use std::path::Path;

use async_trait::async_trait;
use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::{MailError, Mailer, render_status_email};
use crate::config::{MailConfig, MailTransportKind};
use crate::models::ApplicantStatus;

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

pub struct LettreMailer {
    transport: Transport,
    from: Mailbox,
}

impl LettreMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let from_email = config.from_email.as_deref().ok_or_else(|| {
            MailError::Configuration("sender address is required".to_string())
        })?;
        let from = parse_mailbox(from_email, Some(&config.from_name))?;

        let transport = match config.transport {
            MailTransportKind::Smtp => {
                let host = config.smtp_host.as_deref().ok_or_else(|| {
                    MailError::Configuration("SMTP host is required".to_string())
                })?;

                if !config.smtp_tls {
                    tracing::warn!("SMTP TLS is disabled");
                }

                let mut builder = if config.smtp_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .map_err(|e| MailError::Configuration(e.to_string()))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                }
                .port(config.smtp_port);

                if let (Some(username), Some(password)) =
                    (&config.smtp_username, &config.smtp_password)
                {
                    builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
                }

                Transport::Smtp(builder.build())
            }
            MailTransportKind::File => {
                let dir = Path::new(&config.file_dir);
                std::fs::create_dir_all(dir).map_err(|e| {
                    MailError::Configuration(format!("create mail directory {}: {e}", dir.display()))
                })?;
                Transport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
            MailTransportKind::Log => {
                return Err(MailError::Configuration(
                    "log transport does not use lettre".to_string(),
                ));
            }
        };

        Ok(Self { transport, from })
    }
}

fn parse_mailbox(address: &str, name: Option<&str>) -> Result<Mailbox, MailError> {
    let address_parsed = address.parse().map_err(|e: lettre::address::AddressError| {
        MailError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })?;
    let name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
    Ok(Mailbox::new(name, address_parsed))
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send_status_email(
        &self,
        to: &str,
        status: ApplicantStatus,
        name: &str,
        reason: Option<&str>,
    ) -> Result<(), MailError> {
        let email = render_status_email(status, name, reason);
        let to = parse_mailbox(to, Some(name))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.html_body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        match &self.transport {
            Transport::Smtp(smtp) => {
                smtp.send(message)
                    .await
                    .map_err(|e| MailError::Transport(e.to_string()))?;
            }
            Transport::File(file) => {
                file.send(message)
                    .await
                    .map_err(|e| MailError::Transport(e.to_string()))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(dir: &Path) -> MailConfig {
        MailConfig {
            transport: MailTransportKind::File,
            from_email: Some("registry@example.org".to_string()),
            file_dir: dir.to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn file_transport_writes_message() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = LettreMailer::from_config(&file_config(dir.path())).unwrap();

        mailer
            .send_status_email(
                "farmer@example.org",
                ApplicantStatus::Registered,
                "Juan Dela Cruz",
                None,
            )
            .await
            .unwrap();

        let written: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(written.len(), 1);

        let contents = std::fs::read_to_string(written[0].path()).unwrap();
        assert!(contents.contains("farmer@example.org"));
        assert!(contents.contains("approved"));
    }

    #[tokio::test]
    async fn invalid_recipient_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = LettreMailer::from_config(&file_config(dir.path())).unwrap();

        let result = mailer
            .send_status_email("not an address", ApplicantStatus::Archived, "X", None)
            .await;
        assert!(matches!(result, Err(MailError::InvalidAddress { .. })));
    }

    #[test]
    fn smtp_requires_host() {
        let config = MailConfig {
            transport: MailTransportKind::Smtp,
            from_email: Some("registry@example.org".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            LettreMailer::from_config(&config),
            Err(MailError::Configuration(_))
        ));
    }
}
