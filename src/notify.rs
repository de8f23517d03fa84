//! Email delivery of digests.
//!
//! [`SmtpMailer`] submits one plain-text message per call over a
//! STARTTLS-secured, authenticated SMTP session. [`EmailNotifier`] wraps an
//! optional mailer and never lets a failure escape: missing sender
//! credentials turn every delivery into a logged skip, and transport errors
//! are logged and reported as [`Delivery::Failed`].

use crate::config::{Credentials, SmtpSettings};
use crate::error::NotifyError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Sends a single plain-text message.
pub trait Mailer: Send + Sync {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// SMTP submission with STARTTLS and sender credentials.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("sender", &self.sender.to_string())
            .finish()
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|source| NotifyError::Address {
        address: address.to_string(),
        source,
    })
}

impl SmtpMailer {
    /// Configure a STARTTLS relay that logs in as `sender_email`.
    ///
    /// No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Address`] when `sender_email` is not a mailbox, or
    /// [`NotifyError::Transport`] when the relay cannot be set up for `settings.host`.
    pub fn new(
        settings: &SmtpSettings,
        sender_email: &str,
        sender_password: &str,
    ) -> Result<Self, NotifyError> {
        let sender = parse_mailbox(sender_email)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(SmtpCredentials::new(
                sender_email.to_string(),
                sender_password.to_string(),
            ))
            .timeout(Some(settings.timeout()))
            .build();
        Ok(Self { transport, sender })
    }
}

impl Mailer for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(%to))]
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(parse_mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let t0 = Instant::now();
        self.transport.send(message).await?;
        info!(elapsed_ms = t0.elapsed().as_millis(), "SMTP submission accepted");
        Ok(())
    }
}

/// What happened to one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No sender credentials configured.
    Skipped,
    Failed,
}

/// Delivers digests by email, swallowing every failure after logging it.
#[derive(Debug)]
pub struct EmailNotifier<M> {
    mailer: Option<M>,
}

impl<M: Mailer> EmailNotifier<M> {
    pub fn new(mailer: Option<M>) -> Self {
        Self { mailer }
    }

    pub fn is_configured(&self) -> bool {
        self.mailer.is_some()
    }

    pub async fn deliver(&self, to: &str, subject: &str, body: &str) -> Delivery {
        let Some(mailer) = &self.mailer else {
            info!(%to, "Skipping email: SENDER_EMAIL or SENDER_PASSWORD not set");
            return Delivery::Skipped;
        };
        match mailer.send(to, subject, body).await {
            Ok(()) => {
                info!(%to, "Email sent successfully");
                Delivery::Sent
            }
            Err(e) => {
                error!(%to, error = %e, "Failed to send email");
                Delivery::Failed
            }
        }
    }
}

impl EmailNotifier<SmtpMailer> {
    /// Build the SMTP notifier from settings and sender credentials.
    ///
    /// Absent credentials or an unusable sender address leave the notifier
    /// unconfigured; deliveries are then skipped.
    pub fn smtp(settings: &SmtpSettings, credentials: &Credentials) -> Self {
        let (Some(email), Some(password)) = (
            credentials.sender_email.as_deref(),
            credentials.sender_password.as_deref(),
        ) else {
            warn!("SENDER_EMAIL or SENDER_PASSWORD not set; emails will be skipped");
            return Self::new(None);
        };
        match SmtpMailer::new(settings, email, password) {
            Ok(mailer) => {
                info!(host = %settings.host, port = settings.port, "SMTP mailer configured");
                Self::new(Some(mailer))
            }
            Err(e) => {
                error!(error = %e, "Cannot configure SMTP mailer; emails will be skipped");
                Self::new(None)
            }
        }
    }
}
