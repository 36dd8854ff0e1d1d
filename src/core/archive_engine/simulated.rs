use crate::core::archive_engine::ArchiveEngine;
use crate::core::error::RunError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// In-memory archive engine for simulation mode and tests. Writes a fixed
/// payload instead of invoking tar, and can be told to fail for specific
/// source directories.
pub struct SimulatedArchiveEngine {
    payload: Vec<u8>,
    fail_sources: HashSet<PathBuf>,
}

impl Default for SimulatedArchiveEngine {
    fn default() -> Self {
        Self {
            payload: b"simulated archive payload".to_vec(),
            fail_sources: HashSet::new(),
        }
    }
}

impl SimulatedArchiveEngine {
    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    /// Mark a source directory as broken: archiving it reports failure and
    /// produces no file, like tar on unreadable content.
    pub fn fail_for(mut self, source: impl Into<PathBuf>) -> Self {
        self.fail_sources.insert(source.into());
        self
    }
}

#[async_trait]
impl ArchiveEngine for SimulatedArchiveEngine {
    async fn create_archive(&self, source: &Path, dest: &Path) -> Result<(), RunError> {
        if self.fail_sources.contains(source) {
            return Err(RunError::Archive(format!(
                "simulated failure reading {}",
                source.display()
            )));
        }
        if !source.is_dir() {
            return Err(RunError::Archive(format!(
                "source is not a directory: {}",
                source.display()
            )));
        }
        std::fs::write(dest, &self.payload)
            .map_err(|e| RunError::Archive(format!("failed to write {}: {e}", dest.display())))?;
        Ok(())
    }
}
