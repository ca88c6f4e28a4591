//! Core traits for the runway alert system
//!
//! This module defines the abstract interfaces at each external boundary.
//!
//! - [`SourceClient`]: Fetch runway usage reports
//! - [`SubscriberRepository`]: Enumerate notification recipients
//! - [`NotificationTransport`]: Deliver one message to one recipient

pub mod source_client;
pub mod subscriber_repository;
pub mod transport;

pub use source_client::{Snapshot, SnapshotRequest, SourceClient, SourceClientFactory};
pub use subscriber_repository::{Subscriber, SubscriberRepository, SubscriberRepositoryFactory};
pub use transport::{NotificationTransport, NotificationTransportFactory};
