//! Event bus shared by the pipeline and its presentation layer.
//!
//! The pipeline publishes typed lifecycle and download-progress events; the CLI
//! subscribes and decides how to render them. Internally the bus uses
//! `tokio::broadcast` with a bounded buffer. When a subscriber lags, the oldest
//! events are dropped, which only ever costs intermediate progress updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::broadcast::{Receiver, Sender};
use uuid::Uuid;

/// Identifier assigned to each published event.
pub type EventId = u64;

/// Default broadcast buffer size.
const DEFAULT_CAPACITY: usize = 1_024;

/// Typed events emitted while a pipeline run progresses.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RunStarted {
        run_id: Uuid,
        work_dir: String,
    },
    StepStarted {
        step: String,
    },
    StepCompleted {
        step: String,
        detail: Option<String>,
    },
    StepFailed {
        step: String,
        message: String,
    },
    DownloadStarted {
        url: String,
        destination: String,
        bytes_total: Option<u64>,
    },
    DownloadProgress {
        destination: String,
        bytes_downloaded: u64,
        bytes_total: Option<u64>,
        elapsed_ms: u64,
    },
    DownloadCompleted {
        destination: String,
        bytes_downloaded: u64,
        elapsed_ms: u64,
    },
    RunCompleted {
        run_id: Uuid,
        artifact: String,
    },
    RunFailed {
        run_id: Uuid,
        message: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for log and JSON consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::StepStarted { .. } => "step_started",
            Self::StepCompleted { .. } => "step_completed",
            Self::StepFailed { .. } => "step_failed",
            Self::DownloadStarted { .. } => "download_started",
            Self::DownloadProgress { .. } => "download_progress",
            Self::DownloadCompleted { .. } => "download_completed",
            Self::RunCompleted { .. } => "run_completed",
            Self::RunFailed { .. } => "run_failed",
        }
    }

    /// Whether this event ends a run; no further events follow it.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::RunCompleted { .. } | Self::RunFailed { .. })
    }
}

/// Metadata wrapper around events carrying the sequential id and emission time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Construct a new bus with the provided broadcast capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "event bus capacity must be positive");
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Construct a bus with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Publish an event, assigning it the next sequential identifier.
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };
        // Events published before anyone subscribes are dropped.
        let _ = self.sender.send(envelope);
        id
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream of events received from the bus.
pub struct EventStream {
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Receive the next event, or `None` once every publisher has been dropped.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(bytes: u64) -> Event {
        Event::DownloadProgress {
            destination: "Troll.exe".into(),
            bytes_downloaded: bytes,
            bytes_total: Some(4_096),
            elapsed_ms: 10,
        }
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_publish_order() {
        let bus = EventBus::with_capacity(16);
        let mut stream = bus.subscribe();

        let mut last_id = 0;
        for i in 0..5 {
            last_id = bus.publish(progress(i * 512));
        }
        assert_eq!(last_id, 5);

        let mut ids = Vec::new();
        for _ in 0..5 {
            if let Some(envelope) = stream.next().await {
                ids.push(envelope.id);
            }
        }
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn events_before_subscription_are_not_delivered() {
        let bus = EventBus::with_capacity(4);
        bus.publish(progress(1));
        let mut stream = bus.subscribe();
        bus.publish(progress(2));
        drop(bus);

        let first = stream.next().await.map(|envelope| envelope.id);
        assert_eq!(first, Some(2));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn stream_ends_when_publishers_drop() {
        let bus = EventBus::with_capacity(4);
        let mut stream = bus.subscribe();
        bus.publish(Event::StepStarted {
            step: "preflight".into(),
        });
        drop(bus);

        let first = stream.next().await.map(|envelope| envelope.event);
        assert_eq!(
            first,
            Some(Event::StepStarted {
                step: "preflight".into()
            })
        );
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_retained_events() {
        let bus = EventBus::with_capacity(2);
        let mut stream = bus.subscribe();
        for i in 0..6 {
            bus.publish(progress(i));
        }
        let next = stream.next().await.map(|envelope| envelope.id);
        assert_eq!(next, Some(5));
    }

    #[test]
    fn terminal_events_are_flagged() {
        let run_id = Uuid::nil();
        assert!(
            Event::RunFailed {
                run_id,
                message: "boom".into()
            }
            .is_terminal()
        );
        assert!(!progress(1).is_terminal());
        assert_eq!(progress(1).kind(), "download_progress");
    }

    #[test]
    fn events_serialize_with_type_tag() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(Event::StepCompleted {
            step: "clone_source".into(),
            detail: None,
        })?;
        assert_eq!(value["type"], "step_completed");
        assert_eq!(value["step"], "clone_source");
        Ok(())
    }
}
