///! Acquisition client - independent async fetches for the two sources
///!
///! Each request runs as its own task. Success captures the payload and
///! announces it on the bus; failure is only logged, because recovery
///! belongs to the orchestrator's retry timer.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::fetcher::SourceFetcher;
use super::types::Source;
use crate::bus::{Notification, NotificationBus};

pub struct AcquisitionClient {
    fetcher: Arc<dyn SourceFetcher>,
    bus: NotificationBus,
    /// Payloads captured so far in the current cycle. A source is absent
    /// until its fetch succeeds, never present with a placeholder.
    payloads: Arc<RwLock<HashMap<Source, Value>>>,
}

impl AcquisitionClient {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, bus: NotificationBus) -> Self {
        Self {
            fetcher,
            bus,
            payloads: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Kick off one fetch for `source` without waiting for it.
    pub fn request_source(&self, source: Source) {
        let fetcher = Arc::clone(&self.fetcher);
        let payloads = Arc::clone(&self.payloads);
        let bus = self.bus.clone();
        tokio::spawn(async move {
            tracing::debug!("Requesting {} data", source);
            match fetcher.fetch(source).await {
                Ok(payload) => {
                    payloads.write().await.insert(source, payload);
                    tracing::info!("Received {} data", source);
                    bus.publish(Notification::SourceReceived(source));
                    bus.publish(Notification::DataReceived);
                }
                Err(e) => {
                    // Silent on the bus; the retry timer will re-request.
                    tracing::warn!("Fetch failed for {}: {:#}", source, e);
                }
            }
        });
    }

    /// Snapshot of the payloads captured so far.
    pub async fn payloads(&self) -> HashMap<Source, Value> {
        self.payloads.read().await.clone()
    }

    /// Drop captured payloads at the end of a cycle.
    pub async fn clear(&self) {
        self.payloads.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    struct FixedFetcher {
        posts: Option<Value>,
        likes: Option<Value>,
    }

    #[async_trait]
    impl SourceFetcher for FixedFetcher {
        async fn fetch(&self, source: Source) -> anyhow::Result<Value> {
            let payload = match source {
                Source::Posts => self.posts.clone(),
                Source::Likes => self.likes.clone(),
            };
            payload.ok_or_else(|| anyhow!("no data for {}", source))
        }
    }

    #[tokio::test]
    async fn success_captures_payload_and_notifies() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let fetcher = Arc::new(FixedFetcher {
            posts: Some(json!([{"id": 1}])),
            likes: None,
        });
        let client = AcquisitionClient::new(fetcher, bus);

        client.request_source(Source::Posts);

        assert_eq!(
            rx.recv().await.unwrap(),
            Notification::SourceReceived(Source::Posts)
        );
        assert_eq!(rx.recv().await.unwrap(), Notification::DataReceived);

        let payloads = client.payloads().await;
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[&Source::Posts], json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn failure_is_silent_and_leaves_source_absent() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe();
        let fetcher = Arc::new(FixedFetcher {
            posts: None,
            likes: None,
        });
        let client = AcquisitionClient::new(fetcher, bus);

        client.request_source(Source::Likes);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(rx.try_recv().is_err());
        assert!(client.payloads().await.is_empty());
    }

    #[tokio::test]
    async fn clear_drops_captured_payloads() {
        let bus = NotificationBus::new();
        let fetcher = Arc::new(FixedFetcher {
            posts: Some(json!({})),
            likes: Some(json!({})),
        });
        let client = AcquisitionClient::new(fetcher, bus.clone());
        let mut rx = bus.subscribe();

        client.request_source(Source::Posts);
        client.request_source(Source::Likes);
        for _ in 0..4 {
            rx.recv().await.unwrap();
        }

        assert_eq!(client.payloads().await.len(), 2);
        client.clear().await;
        assert!(client.payloads().await.is_empty());
    }
}
