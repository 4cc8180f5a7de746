//! In-process sync routing.
//!
//! The [`SyncHub`] stands in for the wire transport this engine leaves
//! to collaborators: it routes encoded sync payloads from a world's
//! runner to every viewer subscribed to that world id. Swapping it for a
//! real transport only means replacing where the bytes go — the payloads
//! themselves come from `homestead_net` either way.

// Some public APIs are not called from main() but are exercised by tests.
#![allow(dead_code)]

use dashmap::DashMap;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use homestead_net::{SyncError, SyncMessage, encode};

/// Routes encoded sync payloads by world id.
#[derive(Debug, Default)]
pub struct SyncHub {
    topics: DashMap<String, Vec<UnboundedSender<Vec<u8>>>>,
}

impl SyncHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a world's payloads. The receiver yields encoded
    /// [`SyncMessage`] bytes until the hub is dropped.
    #[must_use]
    pub fn subscribe(&self, world: &str) -> UnboundedReceiver<Vec<u8>> {
        let (tx, rx) = unbounded_channel();
        self.topics.entry(world.to_string()).or_default().push(tx);
        rx
    }

    /// Encode and deliver a payload to every live subscriber of its
    /// world, pruning subscribers that have gone away. Returns how many
    /// subscribers received it.
    ///
    /// # Errors
    ///
    /// [`SyncError::Encode`] if the payload cannot be encoded.
    pub fn publish(&self, message: &SyncMessage) -> Result<usize, SyncError> {
        let bytes = encode(message)?;
        match self.topics.get_mut(message.world()) {
            Some(mut subscribers) => {
                subscribers.retain(|tx| tx.send(bytes.clone()).is_ok());
                Ok(subscribers.len())
            }
            None => Ok(0),
        }
    }

    /// The number of live subscribers for a world.
    #[must_use]
    pub fn subscriber_count(&self, world: &str) -> usize {
        self.topics.get(world).map_or(0, |subs| subs.len())
    }
}
