//! Monitoring events
//!
//! The engine, watcher and dispatcher report what they do on a bounded
//! channel so an embedding application (or the daemon) can observe cycles
//! and deliveries without parsing logs.

use tokio::sync::mpsc;
use tracing::warn;

/// Events emitted while the engine runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        resources_count: usize,
    },

    /// A refresh cycle fetched a snapshot and applied it
    CycleCompleted {
        changes: usize,
    },

    /// A refresh cycle was abandoned; state is unchanged
    CycleFailed {
        error: String,
    },

    /// A change event was fanned out to all subscribers
    DispatchCompleted {
        code: String,
        succeeded: usize,
        failed: usize,
    },

    /// A change event could not be dispatched at all
    DispatchFailed {
        code: String,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Non-blocking sender for [`EngineEvent`]s
///
/// Cloning is cheap. A sink created with [`EventSink::disabled`] drops
/// everything silently.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<EngineEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sink with no receiver
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Emit an event without waiting for channel capacity
    pub fn emit(&self, event: EngineEvent) {
        let Some(tx) = &self.tx else {
            return;
        };

        // Full channel means the consumer is slower than the engine; the
        // event is dropped so the watcher never waits on monitoring.
        if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(event) {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}
