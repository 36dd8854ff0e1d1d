mod simulated;
mod ssh;

pub use simulated::{RemoteStateInner, SharedRemoteState, SimulatedTransport};
pub use ssh::SshTransport;

use crate::config::AppConfig;
use crate::core::error::RunError;
use async_trait::async_trait;
use std::path::Path;

/// Owner of the credentials needed to reach the remote host. `connect`
/// authenticates once per run; everything after that happens over the
/// returned session.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RemoteSession>, RunError>;
}

/// One authenticated connection to the remote host, shared by every volume
/// in a run. `close` must be called exactly once when the run ends.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Create the remote directory if it does not exist yet.
    async fn ensure_directory(&self, remote_dir: &str) -> Result<(), RunError>;

    /// Copy a local archive into the remote directory. Either the file is
    /// fully present remotely afterwards or this returns an error; partial
    /// uploads are not retried within a run.
    async fn upload(&self, local: &Path, remote_dir: &str) -> Result<(), RunError>;

    /// Count archive files already present in the remote directory. Used
    /// for retention visibility in the report, not for pruning.
    async fn count_backups(&self, remote_dir: &str) -> Result<u32, RunError>;

    /// Release the connection.
    async fn close(&mut self) -> Result<(), RunError>;
}

/// Select the remote transport for this run.
pub fn create_transport(config: &AppConfig) -> Box<dyn RemoteTransport> {
    if config.simulation {
        Box::new(SimulatedTransport::new())
    } else {
        Box::new(SshTransport::new(config))
    }
}
