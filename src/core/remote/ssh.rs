use crate::config::AppConfig;
use crate::core::archive_engine::ARCHIVE_SUFFIX;
use crate::core::error::RunError;
use crate::core::remote::{RemoteSession, RemoteTransport};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// Remote transport driving the OpenSSH client. `connect` establishes a
/// ControlMaster connection; subsequent `ssh`/`scp` invocations multiplex
/// over its control socket, so the whole run shares one authenticated
/// connection and `close` tears it down.
pub struct SshTransport {
    host: String,
    user: String,
    port: u16,
    key_path: PathBuf,
}

impl SshTransport {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            host: config.ssh_host.clone(),
            user: config.ssh_user.clone(),
            port: config.ssh_port,
            key_path: config.ssh_key_path.clone(),
        }
    }
}

#[async_trait]
impl RemoteTransport for SshTransport {
    async fn connect(&self) -> Result<Box<dyn RemoteSession>, RunError> {
        let control_path =
            std::env::temp_dir().join(format!("volbak-ssh-{}.ctl", std::process::id()));
        let target = format!("{}@{}", self.user, self.host);
        let key = self.key_path.to_string_lossy().into_owned();
        let control = control_path.to_string_lossy().into_owned();
        let port = self.port.to_string();

        let output = Command::new("ssh")
            .args([
                "-i",
                key.as_str(),
                "-p",
                port.as_str(),
                "-o",
                "BatchMode=yes",
                "-o",
                "StrictHostKeyChecking=accept-new",
                "-o",
                "ControlPersist=yes",
                "-M",
                "-S",
                control.as_str(),
                "-f",
                "-N",
                target.as_str(),
            ])
            .output()
            .await
            .map_err(|e| RunError::Connection(format!("failed to spawn ssh: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::Connection(format!(
                "ssh to {target} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        debug!(target = %target, control = %control, "ssh master connection established");

        Ok(Box::new(SshSession {
            target,
            key,
            control,
            port,
            closed: false,
        }))
    }
}

struct SshSession {
    target: String,
    key: String,
    control: String,
    port: String,
    closed: bool,
}

impl SshSession {
    async fn remote_command(&self, command: &str) -> Result<std::process::Output, RunError> {
        Command::new("ssh")
            .args([
                "-i",
                self.key.as_str(),
                "-p",
                self.port.as_str(),
                "-o",
                "BatchMode=yes",
                "-S",
                self.control.as_str(),
                self.target.as_str(),
                command,
            ])
            .output()
            .await
            .map_err(|e| RunError::RemoteCommand(format!("failed to spawn ssh: {e}")))
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn ensure_directory(&self, remote_dir: &str) -> Result<(), RunError> {
        let output = self
            .remote_command(&format!("mkdir -p '{remote_dir}'"))
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::RemoteCommand(format!(
                "mkdir -p {remote_dir} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    async fn upload(&self, local: &Path, remote_dir: &str) -> Result<(), RunError> {
        let local_str = local.to_string_lossy().into_owned();
        let destination = format!("{}:{}/", self.target, remote_dir);
        let control_opt = format!("ControlPath={}", self.control);

        let output = Command::new("scp")
            .args([
                "-i",
                self.key.as_str(),
                "-P",
                self.port.as_str(),
                "-o",
                "BatchMode=yes",
                "-o",
                control_opt.as_str(),
                local_str.as_str(),
                destination.as_str(),
            ])
            .output()
            .await
            .map_err(|e| RunError::Transfer(format!("failed to spawn scp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::Transfer(format!(
                "scp to {destination} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    async fn count_backups(&self, remote_dir: &str) -> Result<u32, RunError> {
        let output = self.remote_command(&format!("ls -1 '{remote_dir}'")).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::RemoteCommand(format!(
                "ls {remote_dir} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let listing = String::from_utf8_lossy(&output.stdout);
        let count = listing
            .lines()
            .filter(|line| line.trim_end().ends_with(ARCHIVE_SUFFIX))
            .count();
        Ok(count as u32)
    }

    async fn close(&mut self) -> Result<(), RunError> {
        if self.closed {
            warn!("remote session already closed");
            return Ok(());
        }
        self.closed = true;

        let output = Command::new("ssh")
            .args([
                "-S",
                self.control.as_str(),
                "-O",
                "exit",
                self.target.as_str(),
            ])
            .output()
            .await
            .map_err(|e| RunError::RemoteCommand(format!("failed to spawn ssh: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunError::RemoteCommand(format!(
                "closing ssh master exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
