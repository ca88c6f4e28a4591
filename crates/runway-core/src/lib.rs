// # runway-core
//
// Core library for the runway alert system.
//
// ## Architecture Overview
//
// This library watches a runway usage source and notifies subscribers when a
// runway becomes active or inactive:
// - **SourceClient**: Trait for fetching runway usage snapshots
// - **StateWatcher**: Diffs each snapshot against the last-known state and
//   emits one ChangeEvent per transition
// - **NotificationDispatcher**: Fans each ChangeEvent out to every subscriber
// - **SubscriberRepository**: Trait for enumerating notification recipients
// - **NotificationTransport**: Trait for delivering one message to one recipient
// - **AlertEngine**: Wires watcher and dispatcher together with shutdown
// - **ComponentRegistry**: Plugin-based registry for sources, transports and
//   subscriber repositories
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Single Owner**: Only the watcher mutates runway state
// 3. **Plugin-Based**: Components are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Failure Isolation**: One failed delivery never affects the others

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod resource;
pub mod state;
pub mod subscribers;
#[cfg(feature = "test-util")]
pub mod testing;
pub mod traits;
pub mod watcher;

// Re-export core types for convenience
pub use config::{
    EngineConfig, ResourceConfig, RunwayConfig, SourceConfig, SubscriberStoreConfig,
    TransportConfig,
};
pub use dispatcher::{DeliveryFailure, DeliveryReport, NotificationDispatcher, render_message};
pub use engine::AlertEngine;
pub use error::{Error, Result};
pub use events::{EngineEvent, EventSink};
pub use registry::ComponentRegistry;
pub use resource::{Resource, ResourceRegistry};
pub use state::{Direction, RunwayState, RunwayStatus, StateStore, render_status_table};
pub use subscribers::{FileSubscriberRepository, MemorySubscriberRepository};
pub use traits::{
    NotificationTransport, Snapshot, SnapshotRequest, SourceClient, Subscriber,
    SubscriberRepository,
};
pub use watcher::{ChangeEvent, StateWatcher};
