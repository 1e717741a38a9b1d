//! Mail delivery for alarms.
//!
//! # Design Decisions
//! - Delivery sits behind the [`Mailer`] trait so handlers can be driven
//!   without an SMTP server
//! - Port 465 uses implicit TLS, any other port upgrades with STARTTLS when
//!   the server offers it
//! - Server certificates are not verified (relays are typically internal)

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::alarm::AlarmParams;
use crate::config::MailConfig;

const IMPLICIT_TLS_PORT: u16 = 465;

/// Error type for mail delivery.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("no alarm receivers configured")]
    NoReceivers,

    #[error("invalid mail port {0}")]
    InvalidPort(i64),

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A plain-text alarm email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmMail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl AlarmMail {
    pub fn from_params(sender: &str, receivers: &[String], params: &AlarmParams) -> Self {
        Self {
            from: sender.to_string(),
            to: receivers.to_vec(),
            subject: params.subject(),
            body: params.message.clone(),
        }
    }

    fn to_message(&self) -> Result<Message, MailError> {
        if self.to.is_empty() {
            return Err(MailError::NoReceivers);
        }

        let mut builder = Message::builder()
            .from(self.from.parse::<Mailbox>()?)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_PLAIN);
        for receiver in &self.to {
            builder = builder.to(receiver.parse::<Mailbox>()?);
        }
        Ok(builder.body(self.body.clone())?)
    }
}

/// Sends alarm mails.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &AlarmMail) -> Result<(), MailError>;
}

/// SMTP delivery through `lettre`.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let port = u16::try_from(config.port).map_err(|_| MailError::InvalidPort(config.port))?;

        let parameters = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(true)
            .dangerous_accept_invalid_hostnames(true)
            .build()?;
        let tls = if port == IMPLICIT_TLS_PORT {
            Tls::Wrapper(parameters)
        } else {
            Tls::Opportunistic(parameters)
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            .port(port)
            .tls(tls)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .build();

        tracing::info!(host = %config.host, port, user = %config.user, "SMTP transport configured");
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &AlarmMail) -> Result<(), MailError> {
        let message = mail.to_message()?;
        self.transport.send(message).await?;
        tracing::debug!(subject = %mail.subject, receivers = mail.to.len(), "Alarm mail sent");
        Ok(())
    }
}
