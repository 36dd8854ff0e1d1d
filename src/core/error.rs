use thiserror::Error;

/// Failure classification for one backup run.
///
/// The orchestrator decides fatal-vs-skip by origin, not by catch scope:
/// configuration and connection failures abort the run before any volume is
/// touched, while archive, remote-command and transfer failures skip exactly
/// one volume. Notification failures happen after the run and change nothing.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("remote connection failed: {0}")]
    Connection(String),

    #[error("archive creation failed: {0}")]
    Archive(String),

    #[error("remote command failed: {0}")]
    RemoteCommand(String),

    #[error("upload failed: {0}")]
    Transfer(String),

    #[error("notification failed: {0}")]
    Notification(String),
}

impl RunError {
    /// True for errors that abort the whole run rather than a single volume.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunError::Configuration(_) | RunError::Connection(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(RunError::Configuration("missing".into()).is_fatal());
        assert!(RunError::Connection("refused".into()).is_fatal());
        assert!(!RunError::Archive("tar exited with 2".into()).is_fatal());
        assert!(!RunError::RemoteCommand("mkdir failed".into()).is_fatal());
        assert!(!RunError::Transfer("scp exited with 1".into()).is_fatal());
        assert!(!RunError::Notification("smtp auth".into()).is_fatal());
    }
}
