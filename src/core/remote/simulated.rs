use crate::core::archive_engine::ARCHIVE_SUFFIX;
use crate::core::error::RunError;
use crate::core::remote::{RemoteSession, RemoteTransport};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// In-memory picture of the remote host: directories and the archive files
/// they hold, plus a counter for how often sessions were closed.
#[derive(Debug, Default)]
pub struct RemoteStateInner {
    pub directories: HashMap<String, Vec<String>>,
    pub close_count: u32,
}

pub type SharedRemoteState = Arc<Mutex<RemoteStateInner>>;

/// Remote transport for simulation mode and tests. Keeps the remote tree in
/// memory and can be told to refuse connections or fail individual
/// directory/upload operations.
pub struct SimulatedTransport {
    state: SharedRemoteState,
    connect_error: Option<String>,
    deny_mkdir: HashSet<String>,
    deny_upload: HashSet<String>,
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RemoteStateInner::default())),
            connect_error: None,
            deny_mkdir: HashSet::new(),
            deny_upload: HashSet::new(),
        }
    }

    /// Handle onto the shared remote state, for assertions across runs.
    pub fn state(&self) -> SharedRemoteState {
        Arc::clone(&self.state)
    }

    pub fn refuse_connections(mut self, reason: impl Into<String>) -> Self {
        self.connect_error = Some(reason.into());
        self
    }

    pub fn deny_mkdir(mut self, remote_dir: impl Into<String>) -> Self {
        self.deny_mkdir.insert(remote_dir.into());
        self
    }

    pub fn deny_upload(mut self, remote_dir: impl Into<String>) -> Self {
        self.deny_upload.insert(remote_dir.into());
        self
    }
}

#[async_trait]
impl RemoteTransport for SimulatedTransport {
    async fn connect(&self) -> Result<Box<dyn RemoteSession>, RunError> {
        if let Some(reason) = &self.connect_error {
            return Err(RunError::Connection(reason.clone()));
        }
        Ok(Box::new(SimulatedSession {
            state: Arc::clone(&self.state),
            deny_mkdir: self.deny_mkdir.clone(),
            deny_upload: self.deny_upload.clone(),
        }))
    }
}

struct SimulatedSession {
    state: SharedRemoteState,
    deny_mkdir: HashSet<String>,
    deny_upload: HashSet<String>,
}

#[async_trait]
impl RemoteSession for SimulatedSession {
    async fn ensure_directory(&self, remote_dir: &str) -> Result<(), RunError> {
        if self.deny_mkdir.contains(remote_dir) {
            return Err(RunError::RemoteCommand(format!(
                "mkdir -p {remote_dir}: permission denied"
            )));
        }
        let mut state = self.state.lock().expect("remote state lock poisoned");
        state.directories.entry(remote_dir.to_string()).or_default();
        Ok(())
    }

    async fn upload(&self, local: &Path, remote_dir: &str) -> Result<(), RunError> {
        if self.deny_upload.contains(remote_dir) {
            return Err(RunError::Transfer(format!(
                "upload to {remote_dir}: connection reset"
            )));
        }

        // A full read stands in for the copy: the local file must exist and
        // be readable for the upload to count as complete.
        std::fs::read(local)
            .map_err(|e| RunError::Transfer(format!("cannot read {}: {e}", local.display())))?;

        let Some(file_name) = local.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return Err(RunError::Transfer(format!(
                "local path has no file name: {}",
                local.display()
            )));
        };

        let mut state = self.state.lock().expect("remote state lock poisoned");
        let Some(files) = state.directories.get_mut(remote_dir) else {
            return Err(RunError::Transfer(format!(
                "remote directory does not exist: {remote_dir}"
            )));
        };
        files.push(file_name);
        Ok(())
    }

    async fn count_backups(&self, remote_dir: &str) -> Result<u32, RunError> {
        let state = self.state.lock().expect("remote state lock poisoned");
        let count = state
            .directories
            .get(remote_dir)
            .map(|files| {
                files
                    .iter()
                    .filter(|name| name.ends_with(ARCHIVE_SUFFIX))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u32)
    }

    async fn close(&mut self) -> Result<(), RunError> {
        let mut state = self.state.lock().expect("remote state lock poisoned");
        state.close_count += 1;
        Ok(())
    }
}
