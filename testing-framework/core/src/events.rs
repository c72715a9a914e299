use std::{
    collections::{HashMap, VecDeque},
    pin::pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::{Stream, StreamExt as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Channel the batch processor publishes its lifecycle events on.
pub const BATCH_PROCESSING_CHANNEL: &str = "TICKER_BATCH_PROCESSING";
/// Published once when a batch run begins.
pub const BATCH_PROCESSING_STARTED: &str = "BATCH_TICKER_PROCESSING_STARTED";
/// Published once per ticker the processor decorated.
pub const TICKER_DECORATED: &str = "TICKER_DECORATED";
/// Events kept per name before the oldest are dropped.
pub const DEFAULT_BUCKET_CAPACITY: usize = 10_000;

/// A decoded pub/sub event. Everything besides `name` is kept verbatim.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BufferedEvent {
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Raw message as delivered by a pub/sub transport.
#[derive(Clone, Debug)]
pub struct ChannelMessage {
    pub channel: String,
    pub payload: Vec<u8>,
}

impl ChannelMessage {
    #[must_use]
    pub fn new(channel: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

/// Accumulates events from one channel, bucketed by event name, until a
/// bucket is explicitly cleared. A bucket never holds more than its capacity;
/// names nobody clears keep only their most recent events.
#[derive(Debug)]
pub struct EventBuffer {
    channel: String,
    bucket_capacity: usize,
    events: Mutex<HashMap<String, VecDeque<BufferedEvent>>>,
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(BATCH_PROCESSING_CHANNEL)
    }
}

impl EventBuffer {
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
            events: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_bucket_capacity(mut self, capacity: usize) -> Self {
        self.bucket_capacity = capacity.max(1);
        self
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Buffers `payload` if it arrived on the subscribed channel and decodes
    /// to an event with a `name`. Returns whether the event was kept.
    pub fn handle_message(&self, channel: &str, payload: &[u8]) -> bool {
        if channel != self.channel {
            debug!(channel, expected = %self.channel, "ignoring message from other channel");
            return false;
        }

        let event: BufferedEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(error) => {
                warn!(channel, %error, "dropping undecodable event");
                return false;
            }
        };

        debug!(channel, name = %event.name, "event buffered");
        let mut events = self.lock();
        let bucket = events.entry(event.name.clone()).or_default();
        if bucket.len() >= self.bucket_capacity {
            if let Some(dropped) = bucket.pop_front() {
                warn!(
                    name = %dropped.name,
                    capacity = self.bucket_capacity,
                    "event bucket full, dropping oldest event"
                );
            }
        }
        bucket.push_back(event);
        true
    }

    /// Events received so far under `name`; empty when none arrived.
    #[must_use]
    pub fn events_by_name(&self, name: &str) -> Vec<BufferedEvent> {
        self.lock()
            .get(name)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear_events_by_name(&self, name: &str) {
        if let Some(events) = self.lock().remove(name) {
            debug!(name, cleared = events.len(), "event bucket cleared");
        }
    }

    /// Drains `feed` into the buffer on a background task until the feed ends.
    pub fn attach<S>(self: &Arc<Self>, feed: S) -> JoinHandle<()>
    where
        S: Stream<Item = ChannelMessage> + Send + 'static,
    {
        let buffer = Arc::clone(self);
        tokio::spawn(async move {
            let mut feed = pin!(feed);
            while let Some(message) = feed.next().await {
                buffer.handle_message(&message.channel, &message.payload);
            }
            debug!(channel = %buffer.channel, "event feed closed");
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<BufferedEvent>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
