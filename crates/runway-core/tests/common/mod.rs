//! Test doubles and common utilities for contract tests
//!
//! These doubles stand in for the external collaborators at each boundary
//! (source, subscriber repository, transport) and count every call so tests
//! can assert on what the core actually did.

#![allow(dead_code)]

use async_trait::async_trait;
use runway_core::config::{RunwayConfig, SourceConfig, SubscriberStoreConfig, TransportConfig};
use runway_core::error::{Error, Result};
use runway_core::resource::{Resource, ResourceRegistry};
use runway_core::traits::{
    NotificationTransport, Snapshot, SnapshotRequest, SourceClient, Subscriber,
    SubscriberRepository,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted answer from [`ScriptedSource`]
#[derive(Debug, Clone)]
pub enum Step {
    Report(Snapshot),
    Unavailable,
    Malformed,
}

impl Step {
    pub fn report(landing: &[&str], takeoff: &[&str]) -> Self {
        Step::Report(Snapshot::with_runways(landing, takeoff))
    }
}

/// A SourceClient that answers from a script, one step per fetch
///
/// Once the script runs out, the last step is repeated. Clones share the
/// script and the counters.
#[derive(Clone)]
pub struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    last: Arc<Mutex<Step>>,
    fetch_call_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<SnapshotRequest>>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            last: Arc::new(Mutex::new(Step::report(&[], &[]))),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Requests seen so far, in call order
    pub fn requests(&self) -> Vec<SnapshotRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceClient for ScriptedSource {
    async fn fetch(&self, request: &SnapshotRequest) -> Result<Snapshot> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(*request);

        let step = {
            let mut last = self.last.lock().unwrap();
            if let Some(step) = self.steps.lock().unwrap().pop_front() {
                *last = step;
            }
            last.clone()
        };

        match step {
            Step::Report(snapshot) => Ok(snapshot),
            Step::Unavailable => Err(Error::source_unavailable("connection refused")),
            Step::Malformed => Err(Error::source_malformed("expected JSON object")),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A NotificationTransport that records every send
///
/// Recipients in the failing set get a `Transport` error; everyone else
/// succeeds. Clones share the record.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    failing: Arc<HashSet<String>>,
    send_call_count: Arc<AtomicUsize>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that always fails for the given recipients
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            failing: Arc::new(recipients.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Get the number of times send() was called
    pub fn send_call_count(&self) -> usize {
        self.send_call_count.load(Ordering::SeqCst)
    }

    /// Every (recipient, text) pair attempted, in completion order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts attempted for one recipient, in completion order
    pub fn texts_for(&self, recipient_id: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(r, _)| r == recipient_id)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send(&self, recipient_id: &str, text: &str) -> Result<()> {
        self.send_call_count.fetch_add(1, Ordering::SeqCst);
        self.sent
            .lock()
            .unwrap()
            .push((recipient_id.to_string(), text.to_string()));

        if self.failing.contains(recipient_id) {
            return Err(Error::transport(format!("chat {} not found", recipient_id)));
        }
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "recording"
    }
}

/// A SubscriberRepository whose enumeration always fails
#[derive(Clone, Default)]
pub struct FailingRepository {
    get_all_call_count: Arc<AtomicUsize>,
}

impl FailingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_all_call_count(&self) -> usize {
        self.get_all_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriberRepository for FailingRepository {
    async fn get_all(&self) -> Result<Vec<Subscriber>> {
        self.get_all_call_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::repository("subscriber store offline"))
    }

    fn repository_name(&self) -> &'static str {
        "failing"
    }
}

/// `count` subscribers with ids "1".."count"
pub fn subscribers(count: usize) -> Vec<Subscriber> {
    (1..=count)
        .map(|i| Subscriber::new(i.to_string(), format!("subscriber {}", i)))
        .collect()
}

/// Registry with runways A and B
pub fn two_runway_registry() -> Arc<ResourceRegistry> {
    Arc::new(
        ResourceRegistry::new(vec![
            Resource::new("A", "Alpha"),
            Resource::new("B", "Bravo"),
        ])
        .unwrap(),
    )
}

/// Helper to create a minimal RunwayConfig for testing
pub fn minimal_config(poll_interval_secs: u64) -> RunwayConfig {
    let mut config = RunwayConfig {
        source: SourceConfig::Lvnl {
            endpoint: "https://example.test/runways".to_string(),
        },
        transport: TransportConfig::Telegram {
            bot_token: "test-token".to_string(),
            api_base: None,
            dry_run: true,
        },
        subscribers: SubscriberStoreConfig::default(),
        resources: vec![
            runway_core::config::ResourceConfig {
                code: "A".to_string(),
                name: "Alpha".to_string(),
            },
            runway_core::config::ResourceConfig {
                code: "B".to_string(),
                name: "Bravo".to_string(),
            },
        ],
        ..RunwayConfig::default()
    };
    config.engine.poll_interval_secs = poll_interval_secs;
    config.engine.request_timeout_secs = 1;
    config.engine.event_channel_capacity = 100;
    config
}
