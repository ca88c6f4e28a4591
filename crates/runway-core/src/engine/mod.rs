//! Runway alert engine
//!
//! The AlertEngine wires the watcher and the dispatcher together:
//! - The StateWatcher polls the source and produces ChangeEvents
//! - The change queue carries them in order to a single consumer
//! - The NotificationDispatcher fans each one out to all subscribers
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐                 ┌──────────────┐
//! │ SourceClient │◀── fetch ───────│ StateWatcher │── status ──▶ watch::Receiver
//! └──────────────┘                 └──────────────┘
//!                                         │
//!                                   ChangeEvent (FIFO)
//!                                         ▼
//!                              ┌────────────────────────┐
//!                              │ NotificationDispatcher │
//!                              └────────────────────────┘
//!                                         │
//!                  ┌──────────────────────┼──────────────────────┐
//!                  ▼                      ▼                      ▼
//!        ┌──────────────────┐   ┌───────────────────┐   ┌─────────────┐
//!        │ SubscriberRepo   │   │ NotificationTrans │   │   Events    │
//!        │ (enumerate)      │   │ (send)            │   │  (monitor)  │
//!        └──────────────────┘   └───────────────────┘   └─────────────┘
//! ```
//!
//! ## Shutdown
//!
//! 1. The watcher observes the stop signal between cycles
//! 2. Dropping its sender closes the change queue
//! 3. The dispatcher drains whatever is still queued, then returns
//! 4. `Stopped` is emitted

use crate::config::RunwayConfig;
use crate::dispatcher::NotificationDispatcher;
use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventSink};
use crate::resource::ResourceRegistry;
use crate::state::RunwayStatus;
use crate::traits::{NotificationTransport, SourceClient, SubscriberRepository};
use crate::watcher::StateWatcher;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info};

/// Core runway alert engine
///
/// ## Lifecycle
///
/// 1. Create with [`AlertEngine::new()`]
/// 2. Optionally grab [`AlertEngine::status()`] receivers
/// 3. Start with [`AlertEngine::run()`] or [`AlertEngine::run_with_shutdown()`]
/// 4. The engine runs until the shutdown signal is received
pub struct AlertEngine {
    /// Watched runways
    registry: Arc<ResourceRegistry>,

    /// Polling half
    watcher: StateWatcher,

    /// Fan-out half
    dispatcher: NotificationDispatcher,

    /// Time between refresh cycles
    poll_interval: Duration,

    /// Monitoring events
    events: EventSink,
}

impl AlertEngine {
    /// Create a new alert engine
    ///
    /// # Parameters
    ///
    /// - `source`: Runway usage source
    /// - `transport`: Notification delivery mechanism
    /// - `subscribers`: Recipient enumeration
    /// - `config`: Runway configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        source: Box<dyn SourceClient>,
        transport: Box<dyn NotificationTransport>,
        subscribers: Box<dyn SubscriberRepository>,
        config: RunwayConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);
        let events = EventSink::new(tx);

        let registry = Arc::new(ResourceRegistry::from_config(&config.resources)?);

        let watcher = StateWatcher::new(Arc::clone(&registry), source)
            .with_request_timeout(config.engine.request_timeout())
            .with_events(events.clone());

        let dispatcher = NotificationDispatcher::new(Arc::from(subscribers), Arc::from(transport))
            .with_max_concurrent_deliveries(config.engine.max_concurrent_deliveries)
            .with_events(events.clone());

        let engine = Self {
            registry,
            watcher,
            dispatcher,
            poll_interval: config.engine.poll_interval(),
            events,
        };

        Ok((engine, rx))
    }

    /// Receiver observing runway status after every cycle with changes
    pub fn status(&self) -> watch::Receiver<Vec<RunwayStatus>> {
        self.watcher.subscribe_status()
    }

    /// Watched runways, in diff order
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Run the engine until Ctrl-C
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: The Ctrl-C listener could not be installed, or the
    ///   dispatcher task panicked
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            tokio::signal::ctrl_c()
                .await
                .map_err(|e| Error::Other(format!("Failed to listen for Ctrl-C: {}", e)))
        })
        .await
    }

    /// Run the engine until `shutdown_rx` fires
    ///
    /// A dropped sender counts as a shutdown signal.
    pub async fn run_with_shutdown(self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_until(async {
            let _ = shutdown_rx.await;
            Ok(())
        })
        .await
    }

    /// Run until `shutdown` resolves
    ///
    /// An `Err` from `shutdown` stops the engine like a signal would and is
    /// returned once the queue is drained.
    async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        let Self {
            registry,
            watcher,
            dispatcher,
            poll_interval,
            events,
        } = self;

        info!("Alert engine started, watching {} runway(s)", registry.len());
        events.emit(EngineEvent::Started {
            resources_count: registry.len(),
        });

        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let dispatcher_handle = tokio::spawn(dispatcher.run(changes_rx));

        let mut signal = Ok(());
        watcher
            .run(poll_interval, changes_tx, async {
                signal = shutdown.await;
            })
            .await;

        let drained = dispatcher_handle
            .await
            .map_err(|e| Error::Other(format!("Notification dispatcher task failed: {}", e)));

        let reason = match &signal {
            Ok(()) => "Shutdown signal".to_string(),
            Err(e) => {
                error!("Stopping alert engine: {}", e);
                e.to_string()
            }
        };
        events.emit(EngineEvent::Stopped { reason });
        info!("Alert engine stopped");

        signal.and(drained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceConfig, TransportConfig};
    use crate::subscribers::MemorySubscriberRepository;
    use crate::traits::{Snapshot, SnapshotRequest};
    use async_trait::async_trait;

    struct IdleSource;

    #[async_trait]
    impl SourceClient for IdleSource {
        async fn fetch(&self, _request: &SnapshotRequest) -> Result<Snapshot> {
            Ok(Snapshot::with_runways(&[], &[]))
        }

        fn source_name(&self) -> &'static str {
            "idle"
        }
    }

    struct NullTransport;

    #[async_trait]
    impl NotificationTransport for NullTransport {
        async fn send(&self, _recipient_id: &str, _text: &str) -> Result<()> {
            Ok(())
        }

        fn transport_name(&self) -> &'static str {
            "null"
        }
    }

    fn config() -> RunwayConfig {
        RunwayConfig {
            source: SourceConfig::Lvnl {
                endpoint: "https://example.test/runways".to_string(),
            },
            transport: TransportConfig::Telegram {
                bot_token: "token".to_string(),
                api_base: None,
                dry_run: true,
            },
            ..RunwayConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.engine.poll_interval_secs = 0;

        let result = AlertEngine::new(
            Box::new(IdleSource),
            Box::new(NullTransport),
            Box::new(MemorySubscriberRepository::new()),
            config,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_signal_listener_stops_engine() {
        let (engine, mut events) = AlertEngine::new(
            Box::new(IdleSource),
            Box::new(NullTransport),
            Box::new(MemorySubscriberRepository::new()),
            config(),
        )
        .unwrap();

        let result = engine
            .run_until(async { Err(Error::Other("signal listener unavailable".to_string())) })
            .await;
        assert!(matches!(
            result,
            Err(Error::Other(ref msg)) if msg == "signal listener unavailable"
        ));

        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert!(matches!(
            last,
            Some(EngineEvent::Stopped { ref reason })
                if reason.contains("signal listener unavailable")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_events() {
        let (engine, mut events) = AlertEngine::new(
            Box::new(IdleSource),
            Box::new(NullTransport),
            Box::new(MemorySubscriberRepository::new()),
            config(),
        )
        .unwrap();

        let status = engine.status();
        assert_eq!(status.borrow().len(), 10);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(engine.run_with_shutdown(shutdown_rx));

        assert_eq!(
            events.recv().await,
            Some(EngineEvent::Started { resources_count: 10 })
        );
        assert_eq!(
            events.recv().await,
            Some(EngineEvent::CycleCompleted { changes: 0 })
        );

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert_eq!(
            last,
            Some(EngineEvent::Stopped {
                reason: "Shutdown signal".to_string()
            })
        );
    }
}
