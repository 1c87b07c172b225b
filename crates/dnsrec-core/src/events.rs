//! Structured adapter events
//!
//! Adapters report what they did as [`AdapterEvent`]s through an injected
//! [`EventSink`]. The surrounding system decides where events go; the
//! adapter never writes to an output stream itself.
//!
//! ```rust,ignore
//! let (sink, mut events) = EventSink::channel(64);
//! let provider = Route53Provider::new(client, &config)?.with_events(sink);
//!
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//! });
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::record::RecordType;

/// Kind of change submitted to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    /// Strict create, fails when the record set exists
    Create,
    /// Create or replace
    Upsert,
    /// Delete the exact record set
    Delete,
}

impl ChangeAction {
    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Upsert => "UPSERT",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by record adapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// A zone name was resolved to a provider zone ID
    ZoneResolved {
        zone: String,
        zone_id: String,
    },

    /// A change batch was accepted by the provider
    ChangeSubmitted {
        zone_id: String,
        change_id: String,
        action: ChangeAction,
        name: String,
        record_type: RecordType,
        values: usize,
    },

    /// A submission failed transiently and will be retried
    SubmissionRetried {
        attempt: u32,
        error: String,
    },

    /// A delete found nothing to delete
    DeleteSkipped {
        name: String,
        record_type: RecordType,
    },

    /// The provider reported the change as fully propagated
    PropagationConfirmed {
        change_id: String,
        waited: Duration,
    },

    /// The propagation wait ended before the change was confirmed
    PropagationUnconfirmed {
        change_id: String,
        waited: Duration,
    },
}

/// Destination for adapter events
///
/// The default sink discards events. A channel sink forwards them over a
/// bounded channel; when the channel is full the event is dropped with a
/// warning so a slow consumer never blocks DNS changes.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<AdapterEvent>>,
}

impl EventSink {
    /// A sink that discards every event
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Create a channel-backed sink and the receiver for its events
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AdapterEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// Wrap an existing sender
    pub fn from_sender(tx: mpsc::Sender<AdapterEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Emit an event
    pub fn emit(&self, event: AdapterEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing the event channel capacity.");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
