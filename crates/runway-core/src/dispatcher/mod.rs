//! Notification dispatcher
//!
//! The NotificationDispatcher is responsible for:
//! - Rendering one message per ChangeEvent
//! - Enumerating the current subscribers for every event
//! - Delivering to each subscriber independently
//! - Reporting per-recipient outcomes
//!
//! ## Failure isolation
//!
//! ```text
//! ChangeEvent ──▶ SubscriberRepository::get_all ──(error)──▶ event failed
//!                          │
//!                          ▼
//!          ┌───────────────┼───────────────┐
//!          ▼               ▼               ▼
//!      send(r1)        send(r2)        send(rK)      (concurrent, bounded)
//!          │               │               │
//!          └───────────────┴───────────────┘
//!                          ▼
//!                   DeliveryReport
//! ```
//!
//! A failed send is recorded and logged; it never cancels the other sends
//! and never marks the event as failed. Failed sends are not retried.

mod message;

pub use message::render_message;

use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventSink};
use crate::traits::{NotificationTransport, Subscriber, SubscriberRepository};
use crate::watcher::ChangeEvent;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};

/// Default number of deliveries in flight per event
const DEFAULT_MAX_CONCURRENT_DELIVERIES: usize = 8;

/// One failed delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub recipient_id: String,
    pub label: String,
    pub error: String,
}

/// Outcome of dispatching one change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Runway code of the event
    pub code: String,
    /// Number of delivery attempts made
    pub attempted: usize,
    /// Number of successful deliveries
    pub succeeded: usize,
    /// Failed deliveries, in subscriber order
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Every attempt succeeded (vacuously true with no subscribers)
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Some but not all attempts succeeded
    pub fn is_partial(&self) -> bool {
        self.succeeded > 0 && !self.failures.is_empty()
    }
}

/// Fan-out of change events to subscribers
pub struct NotificationDispatcher {
    /// Source of the current subscriber list
    subscribers: Arc<dyn SubscriberRepository>,

    /// Delivery mechanism, shared by concurrent sends
    transport: Arc<dyn NotificationTransport>,

    /// Bound on concurrent sends for one event
    max_concurrent_deliveries: usize,

    /// Monitoring events
    events: EventSink,
}

impl NotificationDispatcher {
    pub fn new(
        subscribers: Arc<dyn SubscriberRepository>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        Self {
            subscribers,
            transport,
            max_concurrent_deliveries: DEFAULT_MAX_CONCURRENT_DELIVERIES,
            events: EventSink::disabled(),
        }
    }

    /// Bound the number of sends in flight for one event (minimum 1)
    pub fn with_max_concurrent_deliveries(mut self, max: usize) -> Self {
        self.max_concurrent_deliveries = max.max(1);
        self
    }

    /// Report dispatch outcomes to a monitoring sink
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Deliver one change event to every current subscriber
    ///
    /// # Returns
    ///
    /// - `Ok(DeliveryReport)`: All attempts were made; the report may
    ///   contain failures
    /// - `Err(Error::Repository)`: Subscribers could not be enumerated and
    ///   no delivery was attempted
    pub async fn dispatch(&self, event: &ChangeEvent) -> Result<DeliveryReport> {
        let text: Arc<str> = render_message(event).into();

        let subscribers = match self.subscribers.get_all().await {
            Ok(subscribers) => subscribers,
            Err(e) => {
                let e = match e {
                    Error::Repository(_) => e,
                    other => Error::repository(other.to_string()),
                };
                error!(
                    "Dispatch of {} abandoned, {} failed: {}",
                    event.code,
                    self.subscribers.repository_name(),
                    e
                );
                self.events.emit(EngineEvent::DispatchFailed {
                    code: event.code.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        debug!(
            "Dispatching {} to {} subscriber(s) via {}",
            event.code,
            subscribers.len(),
            self.transport.transport_name()
        );

        let report = self.fan_out(&event.code, subscribers, text).await;

        if report.is_complete() {
            info!(
                "Delivered {} to {}/{} subscriber(s)",
                report.code, report.succeeded, report.attempted
            );
        } else {
            warn!(
                "Delivered {} to {}/{} subscriber(s), {} failed",
                report.code,
                report.succeeded,
                report.attempted,
                report.failed()
            );
        }

        self.events.emit(EngineEvent::DispatchCompleted {
            code: report.code.clone(),
            succeeded: report.succeeded,
            failed: report.failed(),
        });

        Ok(report)
    }

    /// Consume change events in queue order until the queue closes
    pub async fn run(self, changes: mpsc::UnboundedReceiver<ChangeEvent>) {
        info!(
            "Starting notification dispatcher (transport={}, subscribers={})",
            self.transport.transport_name(),
            self.subscribers.repository_name()
        );

        let mut changes = UnboundedReceiverStream::new(changes);
        while let Some(event) = changes.next().await {
            if let Err(e) = self.dispatch(&event).await {
                debug!("Change event for {} not delivered: {}", event.code, e);
            }
        }

        info!("Change queue closed, notification dispatcher stopped");
    }

    /// Send `text` to every subscriber concurrently and collect outcomes
    async fn fan_out(
        &self,
        code: &str,
        subscribers: Vec<Subscriber>,
        text: Arc<str>,
    ) -> DeliveryReport {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_deliveries));

        let deliveries: Vec<_> = subscribers
            .into_iter()
            .map(|subscriber| {
                let transport = Arc::clone(&self.transport);
                let permits = Arc::clone(&permits);
                let text = Arc::clone(&text);
                let recipient_id = subscriber.recipient_id.clone();

                let handle = tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await;
                    transport.send(&recipient_id, &text).await
                });

                (subscriber, handle)
            })
            .collect();

        let mut report = DeliveryReport {
            code: code.to_string(),
            attempted: deliveries.len(),
            succeeded: 0,
            failures: Vec::new(),
        };

        for (subscriber, handle) in deliveries {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(Error::transport(format!("delivery task failed: {}", e))),
            };

            match outcome {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    warn!(
                        "Delivery of {} to {} ({}) failed: {}",
                        code, subscriber.recipient_id, subscriber.label, e
                    );
                    report.failures.push(DeliveryFailure {
                        recipient_id: subscriber.recipient_id,
                        label: subscriber.label,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }
}
