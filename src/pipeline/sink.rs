//! Destinations for progress events

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::mpsc;

use super::events::ProgressEvent;
use crate::{Error, Result};

/// Ordered, one-way destination for the events of a single run
///
/// `emit` failing with [`Error::ClientDisconnected`] means nobody is
/// listening any more; the pipeline stops at that point.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Deliver one event
    async fn emit(&self, event: ProgressEvent) -> Result<()>;
}

/// Sink backed by a bounded channel, drained by the SSE response
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelSink {
    /// Wrap an existing sender
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving half
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn emit(&self, event: ProgressEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| Error::ClientDisconnected)
    }
}

/// Sink that keeps every event in memory
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl ProgressSink for MemorySink {
    async fn emit(&self, event: ProgressEvent) -> Result<()> {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
        Ok(())
    }
}
