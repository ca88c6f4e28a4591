//! Runway state watcher
//!
//! The StateWatcher is responsible for:
//! - Owning the runway state store
//! - Fetching a snapshot from the SourceClient on every tick
//! - Diffing the snapshot against the stored state
//! - Emitting exactly one ChangeEvent per real transition
//!
//! ## Refresh cycle
//!
//! ```text
//! tick ──▶ SnapshotRequest ──▶ SourceClient::fetch ──▶ Snapshot
//!                                    │                    │
//!                               (error/timeout)           ▼
//!                                    │            diff vs StateStore
//!                                    ▼                    │
//!                           cycle skipped,                ▼
//!                           state untouched     Vec<ChangeEvent> ──▶ queue
//! ```
//!
//! ## State machine (per runway)
//!
//! `Inactive ⇄ Active(Landing | Takeoff)`. Only membership in the reported
//! active set drives transitions; a runway that stays active while its
//! direction flips produces no event. A code reported both for landing and
//! takeoff is active for landing.

mod event;

pub use event::ChangeEvent;

use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventSink};
use crate::resource::ResourceRegistry;
use crate::state::{Direction, RunwayState, RunwayStatus, StateStore};
use crate::traits::{Snapshot, SnapshotRequest, SourceClient};
use chrono::NaiveDateTime;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Default upper bound on a single source fetch
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Periodic runway state watcher
///
/// ## Lifecycle
///
/// 1. Create with [`StateWatcher::new()`], which initializes every runway as
///    inactive
/// 2. Drive it with [`StateWatcher::run()`], or call
///    [`StateWatcher::refresh_once()`] directly
/// 3. The loop ends when the shutdown future resolves
///
/// ## Concurrency
///
/// `refresh_once` takes `&mut self`, so cycles cannot interleave. Readers
/// get status through [`StateWatcher::subscribe_status()`], never through
/// the store itself.
pub struct StateWatcher {
    /// Runways to watch, in diff order
    registry: Arc<ResourceRegistry>,

    /// Last-known state of every runway
    store: StateStore,

    /// Runway usage source
    source: Box<dyn SourceClient>,

    /// Upper bound on a single fetch
    request_timeout: Duration,

    /// Published status copies for external readers
    status_tx: watch::Sender<Vec<RunwayStatus>>,

    /// Monitoring events
    events: EventSink,
}

impl StateWatcher {
    /// Create a watcher with every registered runway inactive
    pub fn new(registry: Arc<ResourceRegistry>, source: Box<dyn SourceClient>) -> Self {
        let store = StateStore::initialize(&registry);
        let (status_tx, _) = watch::channel(store.statuses(&registry));
        debug!("Runway state initialized for {} runway(s)", store.len());

        Self {
            registry,
            store,
            source,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            status_tx,
            events: EventSink::disabled(),
        }
    }

    /// Set the upper bound on a single source fetch
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Report cycle outcomes to a monitoring sink
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Read-only access to the current state
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Copy of the current status, in registry order
    pub fn status(&self) -> Vec<RunwayStatus> {
        self.store.statuses(&self.registry)
    }

    /// Receiver that observes status after every cycle with changes
    pub fn subscribe_status(&self) -> watch::Receiver<Vec<RunwayStatus>> {
        self.status_tx.subscribe()
    }

    /// Run one refresh cycle for the given wall-clock time
    ///
    /// # Returns
    ///
    /// - `Ok(events)`: Transitions found this cycle, in registry order
    /// - `Err(Error)`: The fetch failed or timed out; state is unchanged
    pub async fn refresh_once(&mut self, now: NaiveDateTime) -> Result<Vec<ChangeEvent>> {
        let request = SnapshotRequest::from_datetime(&now);
        debug!("Fetching runway usage for {}", request);

        let snapshot = match self.fetch(&request).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Refresh cycle for {} skipped: {}", request, e);
                self.events.emit(EngineEvent::CycleFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let changes = self.apply_snapshot(&snapshot);
        debug!(
            "Refresh cycle for {} complete: {} change(s)",
            request,
            changes.len()
        );
        self.events.emit(EngineEvent::CycleCompleted {
            changes: changes.len(),
        });

        Ok(changes)
    }

    /// Diff a snapshot against the stored state and apply it
    ///
    /// Returns one event per runway whose active membership changed, in
    /// registry order.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<ChangeEvent> {
        for code in snapshot
            .active_landing()
            .into_iter()
            .chain(snapshot.active_takeoff())
        {
            if !self.registry.contains(code) {
                debug!("Source reported unknown runway code {}, ignoring", code);
            }
        }

        let mut changes = Vec::new();

        for resource in self.registry.iter() {
            let was_active = self.store.is_active(&resource.code);
            let is_active = snapshot.is_active(&resource.code);

            if was_active == is_active {
                continue;
            }

            let event = if is_active {
                let direction = if snapshot.is_landing(&resource.code) {
                    Direction::Landing
                } else {
                    Direction::Takeoff
                };
                ChangeEvent::activated(resource, direction)
            } else {
                ChangeEvent::deactivated(resource)
            };

            self.store.set(RunwayState {
                code: resource.code.clone(),
                active: event.new_active,
                direction: event.direction,
            });

            if event.new_active {
                info!("{} is now active for {}", resource.label(), event.direction);
            } else {
                info!("{} is no longer active", resource.label());
            }

            changes.push(event);
        }

        if !changes.is_empty() {
            self.status_tx.send_replace(self.store.statuses(&self.registry));
        }

        changes
    }

    /// Run refresh cycles until `shutdown` resolves
    ///
    /// The first cycle starts immediately. A cycle always runs to completion
    /// once started; ticks missed while it runs are skipped. Change events
    /// of a cycle are fully enqueued before the next tick is awaited.
    pub async fn run<F>(
        mut self,
        poll_interval: Duration,
        changes: mpsc::UnboundedSender<ChangeEvent>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        info!(
            "Starting runway watcher (source={}, interval={:?})",
            self.source.source_name(),
            poll_interval
        );

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Runway watcher received stop signal");
                    break;
                }

                _ = ticker.tick() => {
                    let now = chrono::Local::now().naive_local();
                    let Ok(events) = self.refresh_once(now).await else {
                        continue;
                    };

                    for event in events {
                        if changes.send(event).is_err() {
                            warn!("Change queue closed, stopping runway watcher");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Fetch a snapshot, bounded by the request timeout
    async fn fetch(&self, request: &SnapshotRequest) -> Result<Snapshot> {
        match tokio::time::timeout(self.request_timeout, self.source.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::source_unavailable(format!(
                "{} did not answer within {:?}",
                self.source.source_name(),
                self.request_timeout
            ))),
        }
    }
}
