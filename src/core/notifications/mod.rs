mod email;
mod slack;

pub use email::EmailNotifier;
pub use slack::SlackNotifier;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::config::{NotificationChannelType, NotificationConfig};
use crate::core::report::RunReport;

/// Outcome handed to the notification layer: a completed run with its
/// report, or a fatal failure with its detail.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Completed(RunReport),
    Failed { error: String },
}

/// Trait for notification channel implementations (email, Slack, etc.)
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn notify(&self, event: &RunEvent) -> Result<()>;
}

/// Factory function to create a notifier based on config
pub fn create_notifier(config: &NotificationConfig) -> Option<Arc<dyn NotificationChannel>> {
    match config.channel {
        NotificationChannelType::None => None,
        NotificationChannelType::Email => {
            let Some(email) = config.email.as_ref() else {
                warn!("email channel selected but SMTP settings are incomplete");
                return None;
            };
            Some(Arc::new(EmailNotifier::new(email.clone())))
        }
        NotificationChannelType::Slack => {
            let webhook = config.slack_webhook.as_ref()?;
            if webhook.is_empty() {
                return None;
            }
            Some(Arc::new(SlackNotifier::new(webhook.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailConfig;

    #[test]
    fn no_channel_yields_no_notifier() {
        let config = NotificationConfig {
            channel: NotificationChannelType::None,
            email: None,
            slack_webhook: None,
        };
        assert!(create_notifier(&config).is_none());
    }

    #[test]
    fn email_channel_without_settings_yields_no_notifier() {
        let config = NotificationConfig {
            channel: NotificationChannelType::Email,
            email: None,
            slack_webhook: None,
        };
        assert!(create_notifier(&config).is_none());
    }

    #[test]
    fn email_channel_with_settings_yields_notifier() {
        let config = NotificationConfig {
            channel: NotificationChannelType::Email,
            email: Some(EmailConfig {
                host: "smtp.example.com".into(),
                port: 587,
                user: "volbak@example.com".into(),
                password: "secret".into(),
                recipient: "ops@example.com".into(),
            }),
            slack_webhook: None,
        };
        assert!(create_notifier(&config).is_some());
    }

    #[test]
    fn empty_webhook_yields_no_notifier() {
        let config = NotificationConfig {
            channel: NotificationChannelType::Slack,
            email: None,
            slack_webhook: Some(String::new()),
        };
        assert!(create_notifier(&config).is_none());
    }
}
