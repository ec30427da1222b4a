//! Email delivery for rider notifications.
//!
//! - [`SmtpNotifier`]: real delivery through an SMTP relay (Lettre)
//! - [`ConsoleNotifier`]: logs the email instead (development, no `SMTP_HOST`)

use crate::config::SmtpConfig;
use demoride_core::notification::{Notifier, NotifyError, OutgoingEmail};
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::future::Future;
use std::pin::Pin;

/// SMTP notifier using Lettre.
///
/// Lettre's blocking transport runs on the blocking thread pool.
#[derive(Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    credentials: Credentials,
    from: String,
}

impl SmtpNotifier {
    /// Build a notifier from configuration.
    #[must_use]
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from: format!("{} <{}>", config.from_name, config.from_email),
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, NotifyError> {
        Ok(SmtpTransport::relay(&self.host)
            .map_err(|e| NotifyError(format!("SMTP relay error: {e}")))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn build_message(&self, email: OutgoingEmail) -> Result<Message, NotifyError> {
        Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| NotifyError(format!("Invalid from address: {e}")))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| NotifyError(format!("Invalid to address: {e}")))?)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| NotifyError(format!("Failed to build email: {e}")))
    }
}

impl Notifier for SmtpNotifier {
    fn send(
        &self,
        email: OutgoingEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async move {
            let message = self.build_message(email)?;
            let mailer = self.build_transport()?;

            tokio::task::spawn_blocking(move || {
                mailer
                    .send(&message)
                    .map_err(|e| NotifyError(format!("Failed to send email: {e}")))
            })
            .await
            .map_err(|e| NotifyError(format!("Email task failed: {e}")))?
            .map(|_| ())
        })
    }
}

/// Console notifier (prints emails to the log for development).
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send(
        &self,
        email: OutgoingEmail,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(async move {
            tracing::info!(
                to = %email.to,
                subject = %email.subject,
                "\n{}",
                email.body
            );
            Ok(())
        })
    }
}
