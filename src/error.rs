use thiserror::Error;

/// Errors surfaced by the cycle orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("an acquisition cycle is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from the snapshot store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] std::io::Error),

    #[error("record store corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
