///! Snapshot cycle module
///!
///! One cycle acquires both external sources (posts, likes), then persists
///! a summary record plus the raw payloads exactly once. The orchestrator
///! drives acquisition, timed retry, and the completion path; everything
///! downstream observes the cycle through bus notifications.

pub mod acquire;
pub mod fetcher;
pub mod orchestrator;
pub mod storage;
pub mod types;

pub use acquire::AcquisitionClient;
pub use fetcher::{HttpFetcher, SourceFetcher};
pub use orchestrator::CycleOrchestrator;
pub use storage::{FileStore, MemoryStore, SnapshotStore};
pub use types::{CycleState, Record, Source};
