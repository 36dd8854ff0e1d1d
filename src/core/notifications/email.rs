use super::{NotificationChannel, RunEvent};
use crate::config::EmailConfig;
use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{Mailbox, Message},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

/// Email notification channel: one plain-text message per run, sent over
/// authenticated STARTTLS SMTP.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn format_message(event: &RunEvent) -> (&'static str, String) {
        match event {
            RunEvent::Completed(report) => ("Backup Successful", report.render()),
            RunEvent::Failed { error } => ("Backup Failed", format!("An error occurred: {error}")),
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailNotifier {
    async fn notify(&self, event: &RunEvent) -> Result<()> {
        let (subject, body) = Self::format_message(event);

        let message = Message::builder()
            .from(self.config.user.parse::<Mailbox>()?)
            .to(self.config.recipient.parse::<Mailbox>()?)
            .subject(subject)
            .body(body)?;

        let credentials =
            Credentials::new(self.config.user.clone(), self.config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
            .port(self.config.port)
            .credentials(credentials)
            .build();

        mailer.send(message).await?;
        info!(recipient = %self.config.recipient, subject, "report email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::report::RunReport;

    #[test]
    fn failure_message_carries_error_detail() {
        let (subject, body) = EmailNotifier::format_message(&RunEvent::Failed {
            error: "remote connection failed: refused".into(),
        });
        assert_eq!(subject, "Backup Failed");
        assert!(body.contains("remote connection failed: refused"));
    }

    #[test]
    fn success_message_uses_rendered_report() {
        let (subject, body) =
            EmailNotifier::format_message(&RunEvent::Completed(RunReport::default()));
        assert_eq!(subject, "Backup Successful");
        assert_eq!(body, "No volumes found to back up.");
    }
}
