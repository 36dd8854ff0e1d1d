pub mod archive_engine;
pub mod discovery;
pub mod error;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod remote;
pub mod report;

pub use error::RunError;
pub use models::{ArchiveOutcome, TransferOutcome, VolumeRecord};
pub use orchestrator::Orchestrator;
pub use report::{RunReport, SummaryEntry};
