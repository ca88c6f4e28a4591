//! Contract Test: Event Ordering
//!
//! This test verifies that change events reach subscribers in the order
//! the watcher found them, and that notification fan-out never holds up
//! the refresh loop.
//!
//! Constraints verified:
//! - Events within a cycle are delivered in registry order
//! - Events of cycle N are delivered before events of cycle N+1
//! - A slow transport does not delay subsequent refresh cycles
//! - Refresh cycles never overlap, and ticks missed during a slow fetch
//!   are coalesced instead of replayed in a burst

mod common;

use async_trait::async_trait;
use common::*;
use runway_core::engine::AlertEngine;
use runway_core::error::Result;
use runway_core::events::EngineEvent;
use runway_core::subscribers::MemorySubscriberRepository;
use runway_core::traits::{NotificationTransport, Snapshot, SnapshotRequest, SourceClient};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Transport that takes a long time per send
#[derive(Clone, Default)]
struct SlowTransport {
    inner: RecordingTransport,
}

#[async_trait]
impl NotificationTransport for SlowTransport {
    async fn send(&self, recipient_id: &str, text: &str) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(1000)).await;
        self.inner.send(recipient_id, text).await
    }

    fn transport_name(&self) -> &'static str {
        "slow"
    }
}

/// Source that sleeps before answering and tracks overlapping fetches
///
/// Each fetch takes the next delay from the list; once the list runs out,
/// `steady` is used.
#[derive(Clone)]
struct SlowSource {
    inner: ScriptedSource,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    steady: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl SlowSource {
    fn new(delays: Vec<Duration>, steady: Duration) -> Self {
        Self {
            inner: ScriptedSource::new(vec![Step::report(&[], &[])]),
            delays: Arc::new(Mutex::new(delays.into())),
            steady,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceClient for SlowSource {
    async fn fetch(&self, request: &SnapshotRequest) -> Result<Snapshot> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().pop_front().unwrap_or(self.steady);
        tokio::time::sleep(delay).await;
        let result = self.inner.fetch(request).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn source_name(&self) -> &'static str {
        "slow"
    }
}

/// Elapsed time at each of the first `cycles` completed refresh cycles
async fn cycle_completion_times(source: SlowSource, cycles: usize) -> Vec<Duration> {
    let mut config = minimal_config(60);
    config.engine.request_timeout_secs = 1000;

    let (engine, mut events) = AlertEngine::new(
        Box::new(source),
        Box::new(RecordingTransport::new()),
        Box::new(MemorySubscriberRepository::new()),
        config,
    )
    .expect("engine construction succeeds");

    let start = Instant::now();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle = tokio::spawn(engine.run_with_shutdown(shutdown_rx));

    let mut completed = Vec::new();
    while let Some(event) = events.recv().await {
        if matches!(event, EngineEvent::CycleCompleted { .. }) {
            completed.push(start.elapsed());
            if completed.len() == cycles {
                break;
            }
        }
    }

    shutdown_tx.send(()).unwrap();
    engine_handle.await.unwrap().unwrap();
    completed
}

#[tokio::test(start_paused = true)]
async fn slow_fetches_run_back_to_back_without_overlap() {
    // Every fetch takes 150s against a 60s interval
    let source = SlowSource::new(Vec::new(), Duration::from_secs(150));

    let completed = cycle_completion_times(source.clone(), 4).await;

    assert_eq!(source.max_in_flight(), 1, "Refresh cycles must never overlap");
    for (i, elapsed) in completed.iter().enumerate() {
        let expected = Duration::from_secs(150 * (i as u64 + 1));
        assert!(
            *elapsed >= expected && *elapsed < expected + Duration::from_secs(1),
            "Cycle {} finished at {:?}, expected {:?}",
            i + 1,
            elapsed,
            expected
        );
    }
}

#[tokio::test(start_paused = true)]
async fn ticks_missed_during_a_slow_fetch_are_not_replayed() {
    // The first fetch spans ten ticks; later fetches answer at once
    let source = SlowSource::new(vec![Duration::from_secs(600)], Duration::ZERO);

    let completed = cycle_completion_times(source.clone(), 4).await;

    assert_eq!(source.max_in_flight(), 1);

    // One catch-up cycle right after the slow one, then back on the interval
    assert!(completed[0] >= Duration::from_secs(600));
    assert!(
        completed[1] < Duration::from_secs(601),
        "One catch-up cycle is expected, got {:?}",
        completed
    );
    assert!(
        completed[2] >= Duration::from_secs(659),
        "Missed ticks were replayed as a burst: {:?}",
        completed
    );
    assert!(completed[3] >= completed[2] + Duration::from_secs(59));
}

#[tokio::test(start_paused = true)]
async fn deliveries_follow_cycle_then_registry_order() {
    let source = ScriptedSource::new(vec![
        Step::report(&["B"], &["A"]),
        Step::report(&[], &[]),
        Step::report(&[], &["B"]),
    ]);
    let transport = RecordingTransport::new();
    let repository = MemorySubscriberRepository::with_subscribers(subscribers(1));

    let (engine, mut events) = AlertEngine::new(
        Box::new(source),
        Box::new(transport.clone()),
        Box::new(repository),
        minimal_config(60),
    )
    .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle = tokio::spawn(engine.run_with_shutdown(shutdown_rx));

    let mut dispatched = 0;
    while let Some(event) = events.recv().await {
        if matches!(event, EngineEvent::DispatchCompleted { .. }) {
            dispatched += 1;
            if dispatched == 5 {
                break;
            }
        }
    }

    shutdown_tx.send(()).unwrap();
    engine_handle.await.unwrap().unwrap();

    assert_eq!(
        transport.texts_for("1"),
        vec![
            "Alpha (A) is now active for takeoff".to_string(),
            "Bravo (B) is now active for landing".to_string(),
            "Alpha (A) is no longer active".to_string(),
            "Bravo (B) is no longer active".to_string(),
            "Bravo (B) is now active for takeoff".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn slow_fanout_does_not_delay_refresh() {
    let source = ScriptedSource::new(vec![Step::report(&["A"], &[])]);
    let transport = SlowTransport::default();
    let repository = MemorySubscriberRepository::with_subscribers(subscribers(1));

    let (engine, mut events) = AlertEngine::new(
        Box::new(source.clone()),
        Box::new(transport.clone()),
        Box::new(repository),
        minimal_config(60),
    )
    .expect("engine construction succeeds");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let engine_handle = tokio::spawn(engine.run_with_shutdown(shutdown_rx));

    // The single send takes 1000s; with a 60s interval, more cycles must
    // complete before that dispatch does.
    let mut cycles_before_dispatch = 0;
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::CycleCompleted { .. } => cycles_before_dispatch += 1,
            EngineEvent::DispatchCompleted { .. } => break,
            _ => {}
        }
    }

    shutdown_tx.send(()).unwrap();
    engine_handle.await.unwrap().unwrap();

    assert!(
        cycles_before_dispatch >= 10,
        "Refresh cycles kept running during fan-out, got {}",
        cycles_before_dispatch
    );
    assert_eq!(transport.inner.send_call_count(), 1);
    assert!(source.fetch_call_count() >= cycles_before_dispatch);
}
