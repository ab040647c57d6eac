///! Cycle orchestrator - drives acquire, timed retry, and persistence
///!
///! State machine for one acquisition cycle. `start()` requests both
///! sources and arms the retry timer; source completions arrive as bus
///! notifications; the transition into both-received disarms the timer and
///! runs the completion path exactly once. Persistence success resets the
///! state for the next cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;

use super::acquire::AcquisitionClient;
use super::storage::SnapshotStore;
use super::types::{CycleState, Record, Source};
use crate::bus::{Notification, NotificationBus};
use crate::error::{OrchestratorError, StorageError};

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(15);

/// Everything the completion check needs to see atomically.
struct CycleInner {
    state: CycleState,
    /// True while the completion path is writing to storage. Kept out of
    /// `CycleState` so a storage failure can leave the received flags set
    /// while still letting the next `start()` through.
    persisting: bool,
    retry_handle: Option<JoinHandle<()>>,
}

/// Cloneable handle to the cycle state machine. Background tasks (the
/// completion listener, the retry timer, the completion path) share the
/// core behind an `Arc`.
#[derive(Clone)]
pub struct CycleOrchestrator {
    core: Arc<Core>,
}

struct Core {
    bus: NotificationBus,
    client: AcquisitionClient,
    store: Arc<dyn SnapshotStore>,
    retry_interval: Duration,
    inner: Mutex<CycleInner>,
    /// In-memory record sequence mirrored to durable storage, in
    /// chronological append order.
    records: RwLock<Vec<Record>>,
}

impl CycleOrchestrator {
    pub fn new(
        bus: NotificationBus,
        client: AcquisitionClient,
        store: Arc<dyn SnapshotStore>,
        retry_interval: Duration,
    ) -> Self {
        let core = Arc::new(Core {
            bus,
            client,
            store,
            retry_interval,
            inner: Mutex::new(CycleInner {
                state: CycleState::default(),
                persisting: false,
                retry_handle: None,
            }),
            records: RwLock::new(Vec::new()),
        });
        Core::spawn_completion_listener(&core);
        Self { core }
    }

    /// Load past records from storage into the displayed sequence.
    pub async fn hydrate(&self) -> Result<(), StorageError> {
        self.core.hydrate().await
    }

    /// Begin an acquisition cycle.
    ///
    /// Requests every source not yet received, arms the recurring retry
    /// timer, and fails with `AlreadyRunning` if a cycle is in progress.
    /// If both sources are already received (left over from a failed
    /// persistence) the completion path re-runs immediately.
    pub async fn start(&self) -> Result<(), OrchestratorError> {
        Core::start(&self.core).await
    }

    /// Disarm the retry timer. Idempotent; in-flight fetches are not
    /// aborted, but their late results no longer trigger persistence
    /// until `start()` is called again.
    pub async fn cancel(&self) {
        self.core.cancel().await
    }

    /// Current cycle state (for observers and tests).
    pub async fn state(&self) -> CycleState {
        self.core.inner.lock().await.state
    }

    /// The displayed record sequence.
    pub async fn records(&self) -> Vec<Record> {
        self.core.records.read().await.clone()
    }
}

impl Core {
    async fn hydrate(&self) -> Result<(), StorageError> {
        let records = self.store.load_all_records().await?;
        tracing::info!("Hydrated {} past records", records.len());
        *self.records.write().await = records;
        self.bus.publish(Notification::RecordsLoaded);
        Ok(())
    }

    async fn start(core: &Arc<Core>) -> Result<(), OrchestratorError> {
        {
            let mut inner = core.inner.lock().await;
            if inner.state.retry_timer_active || inner.persisting {
                return Err(OrchestratorError::AlreadyRunning);
            }
            inner.state.retry_timer_active = true;
            inner.retry_handle = Some(Core::spawn_retry_timer(core));
        }

        tracing::info!("Acquisition cycle started");
        core.bus.publish(Notification::AccessingApi);
        core.request_missing().await;
        Core::try_complete(core).await;
        Ok(())
    }

    async fn cancel(&self) {
        {
            let mut inner = self.inner.lock().await;
            if let Some(handle) = inner.retry_handle.take() {
                handle.abort();
                tracing::info!("Retry timer cancelled");
            }
            inner.state.retry_timer_active = false;
        }
        self.bus.publish(Notification::TimerCancelled);
    }

    /// Subscribe to source completions for the orchestrator's lifetime.
    /// Holds only a weak reference so dropping the last handle stops the
    /// listener.
    fn spawn_completion_listener(core: &Arc<Core>) {
        let mut rx = core.bus.subscribe();
        let weak = Arc::downgrade(core);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(Notification::SourceReceived(source)) => {
                        let Some(core) = weak.upgrade() else {
                            break;
                        };
                        core.mark_received(source).await;
                        Core::try_complete(&core).await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Completion listener lagged, skipped {}", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn spawn_retry_timer(core: &Arc<Core>) -> JoinHandle<()> {
        let core = Arc::clone(core);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(core.retry_interval);
            // interval's first tick completes immediately; the first retry
            // belongs one full interval after start().
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tracing::info!("Retrying source acquisition");
                core.bus.publish(Notification::RetryingApi);
                core.request_missing().await;
                Core::try_complete(&core).await;
            }
        })
    }

    /// Request only sources whose completion flag is still false.
    async fn request_missing(&self) {
        let state = self.inner.lock().await.state;
        for source in Source::ALL {
            if !state.received(source) {
                self.client.request_source(source);
            }
        }
    }

    async fn mark_received(&self, source: Source) {
        let mut inner = self.inner.lock().await;
        if !inner.state.received(source) {
            inner.state.mark_received(source);
            tracing::info!("Source {} completed", source);
        }
    }

    /// Run the completion path if this call observes the transition into
    /// both-received on an active cycle. The check and the flag flip
    /// happen under one lock, so duplicate notifications and racing retry
    /// ticks cannot trigger a second persistence.
    async fn try_complete(core: &Arc<Core>) {
        {
            let mut inner = core.inner.lock().await;
            if !inner.state.all_received() || !inner.state.retry_timer_active || inner.persisting {
                return;
            }
            inner.state.retry_timer_active = false;
            inner.persisting = true;
            if let Some(handle) = inner.retry_handle.take() {
                handle.abort();
            }
        }

        // Persist off the notification delivery path.
        let core = Arc::clone(core);
        tokio::spawn(async move {
            core.run_completion().await;
        });
    }

    async fn run_completion(&self) {
        let record = Record::build();
        self.records.write().await.push(record.clone());
        self.bus.publish(Notification::SavingData);

        match self.persist(&record).await {
            Ok(()) => {
                tracing::info!("Cycle complete, record {} persisted", record.id);
                {
                    let mut inner = self.inner.lock().await;
                    inner.state.reset();
                    inner.persisting = false;
                }
                self.client.clear().await;
                self.bus.publish(Notification::SaveComplete);
            }
            Err(e) => {
                // Received flags stay set so the next manual start() can
                // retry persistence without re-fetching.
                tracing::error!("Snapshot persistence failed: {}", e);
                let mut inner = self.inner.lock().await;
                inner.persisting = false;
            }
        }
    }

    async fn persist(&self, record: &Record) -> Result<(), StorageError> {
        self.store.append_record(record).await?;

        let fetched_at = Utc::now();
        for (source, payload) in self.client.payloads().await {
            self.store
                .append_payload(source, &payload, fetched_at)
                .await?;
        }
        Ok(())
    }
}
