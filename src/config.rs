use crate::core::error::RunError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variables recognized by the configuration loader. Anything
/// else in the process environment is ignored.
const ENV_KEYS: &[&str] = &[
    "SSH_HOST",
    "SSH_USER",
    "SSH_PORT",
    "SSH_KEY_PATH",
    "REMOTE_BACKUP_PATH",
    "STORAGE_ROOT",
    "STAGING_DIR",
    "REMOTE_TIMEOUT_SECS",
    "SIMULATION",
    "EMAIL_HOST",
    "EMAIL_PORT",
    "EMAIL_USER",
    "EMAIL_PASSWORD",
    "NOTIFY_EMAIL",
    "SLACK_WEBHOOK",
    "NOTIFY_CHANNEL",
];

const DEFAULT_STORAGE_ROOT: &str = "/var/lib/docker/volumes";
const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 600;

/// Configuration as merged from `volbak.toml`, the environment and CLI
/// overrides, before any validation has happened. All fields are optional at
/// this stage so that a missing required setting can be reported as a proper
/// configuration error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub ssh_host: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_port: Option<u16>,
    pub ssh_key_path: Option<PathBuf>,
    pub remote_backup_path: Option<String>,
    pub storage_root: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub remote_timeout_secs: Option<u64>,
    pub simulation: Option<bool>,
    pub email_host: Option<String>,
    pub email_port: Option<u16>,
    pub email_user: Option<String>,
    pub email_password: Option<String>,
    pub notify_email: Option<String>,
    pub slack_webhook: Option<String>,
    pub notify_channel: Option<NotificationChannelType>,
}

impl RawConfig {
    /// Merge configuration sources, lowest to highest precedence:
    /// `volbak.toml`, recognized environment variables, CLI overrides.
    pub fn load<T: Serialize>(overrides: Option<&T>) -> Result<RawConfig, figment::Error> {
        let mut figment = Figment::new().merge(Toml::file("volbak.toml")).merge(
            Env::raw()
                .only(ENV_KEYS)
                .map(|key| key.as_str().to_lowercase().into()),
        );

        if let Some(overrides) = overrides {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        figment.extract()
    }

    /// Notification settings are extracted independently of validation so
    /// that a run failing on missing SSH settings can still report the
    /// failure through a configured channel.
    pub fn notification(&self) -> NotificationConfig {
        let email = match (
            &self.email_host,
            &self.email_user,
            &self.email_password,
            &self.notify_email,
        ) {
            (Some(host), Some(user), Some(password), Some(recipient)) => Some(EmailConfig {
                host: host.clone(),
                port: self.email_port.unwrap_or(DEFAULT_SMTP_PORT),
                user: user.clone(),
                password: password.clone(),
                recipient: recipient.clone(),
            }),
            _ => None,
        };

        let channel = match self.notify_channel {
            Some(channel) => channel,
            None if email.is_some() => NotificationChannelType::Email,
            None if self.slack_webhook.is_some() => NotificationChannelType::Slack,
            None => NotificationChannelType::None,
        };

        NotificationConfig {
            channel,
            email,
            slack_webhook: self.slack_webhook.clone(),
        }
    }

    /// Check required settings and freeze the configuration. Missing SSH
    /// settings abort before any volume work begins.
    pub fn validate(self) -> Result<AppConfig, RunError> {
        let simulation = self.simulation.unwrap_or(false);

        let mut missing = Vec::new();
        if self.ssh_host.is_none() {
            missing.push("SSH_HOST");
        }
        if self.ssh_user.is_none() {
            missing.push("SSH_USER");
        }
        if self.remote_backup_path.is_none() {
            missing.push("REMOTE_BACKUP_PATH");
        }
        let notification = self.notification();

        let (Some(ssh_host), Some(ssh_user), Some(remote_backup_path)) =
            (self.ssh_host, self.ssh_user, self.remote_backup_path)
        else {
            return Err(RunError::Configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        };

        let ssh_key_path = match self.ssh_key_path {
            Some(path) => path,
            None => dirs::home_dir()
                .ok_or_else(|| {
                    RunError::Configuration(
                        "SSH_KEY_PATH not set and no home directory to derive it from".into(),
                    )
                })?
                .join(".ssh")
                .join("id_rsa"),
        };
        if !simulation && !ssh_key_path.is_file() {
            return Err(RunError::Configuration(format!(
                "SSH key not readable at {}",
                ssh_key_path.display()
            )));
        }

        Ok(AppConfig {
            ssh_host,
            ssh_user,
            ssh_port: self.ssh_port.unwrap_or(DEFAULT_SSH_PORT),
            ssh_key_path,
            remote_backup_path: remote_backup_path.trim_end_matches('/').to_string(),
            storage_root: self
                .storage_root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT)),
            staging_dir: self.staging_dir.unwrap_or_else(std::env::temp_dir),
            remote_timeout: Duration::from_secs(
                self.remote_timeout_secs
                    .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS),
            ),
            simulation,
            notification,
        })
    }
}

/// Validated process configuration. Constructed once at startup and shared
/// by reference; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ssh_host: String,
    pub ssh_user: String,
    pub ssh_port: u16,
    pub ssh_key_path: PathBuf,
    pub remote_backup_path: String,
    pub storage_root: PathBuf,
    pub staging_dir: PathBuf,
    pub remote_timeout: Duration,
    pub simulation: bool,
    pub notification: NotificationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannelType {
    None,
    Email,
    Slack,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub channel: NotificationChannelType,
    pub email: Option<EmailConfig>,
    pub slack_webhook: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub recipient: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_raw() -> RawConfig {
        RawConfig {
            ssh_host: Some("backups.example.com".into()),
            ssh_user: Some("backup".into()),
            remote_backup_path: Some("/srv/backups/".into()),
            simulation: Some(true),
            ..RawConfig::default()
        }
    }

    #[test]
    fn missing_ssh_settings_are_listed_by_env_name() {
        let err = RawConfig::default().validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("SSH_HOST"), "{message}");
        assert!(message.contains("SSH_USER"), "{message}");
        assert!(message.contains("REMOTE_BACKUP_PATH"), "{message}");
    }

    #[test]
    fn remote_backup_path_is_normalized() {
        let config = minimal_raw().validate().unwrap();
        assert_eq!(config.remote_backup_path, "/srv/backups");
        assert_eq!(config.ssh_port, 22);
    }

    #[test]
    fn channel_inferred_from_email_settings() {
        let raw = RawConfig {
            email_host: Some("smtp.example.com".into()),
            email_user: Some("volbak@example.com".into()),
            email_password: Some("secret".into()),
            notify_email: Some("ops@example.com".into()),
            ..minimal_raw()
        };
        let notification = raw.notification();
        assert_eq!(notification.channel, NotificationChannelType::Email);
        assert_eq!(notification.email.unwrap().port, 587);
    }

    #[test]
    fn channel_defaults_to_none_without_credentials() {
        let notification = minimal_raw().notification();
        assert_eq!(notification.channel, NotificationChannelType::None);
        assert!(notification.email.is_none());
    }

    #[test]
    fn explicit_channel_wins_over_inference() {
        let raw = RawConfig {
            slack_webhook: Some("https://hooks.slack.com/services/T/B/x".into()),
            notify_channel: Some(NotificationChannelType::None),
            ..minimal_raw()
        };
        assert_eq!(raw.notification().channel, NotificationChannelType::None);
    }
}
