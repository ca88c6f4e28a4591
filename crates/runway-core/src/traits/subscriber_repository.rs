// # Subscriber Repository Trait
//
// Defines the read-only interface the dispatcher uses to enumerate the
// recipients of a change notification.
//
// ## Implementations
//
// - In-memory: `MemorySubscriberRepository`
// - JSON file: `FileSubscriberRepository`
//
// Subscriber management (subscribe/unsubscribe) lives outside this crate.
// The dispatcher calls `get_all()` once per change event, so subscribers
// added or removed between events are picked up without coordination.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A recipient of runway change notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Opaque transport-level recipient identifier (e.g. a Telegram chat id)
    pub recipient_id: String,
    /// Display label for logs
    #[serde(default)]
    pub label: String,
}

impl Subscriber {
    pub fn new(recipient_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            label: label.into(),
        }
    }
}

/// Trait for subscriber repository implementations
///
/// # Thread Safety
///
/// `get_all` may be called concurrently with dispatches of other events.
///
/// # Trust Level: Semi-Trusted
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O to read the subscriber list
///
/// ## Forbidden Capabilities
/// - ❌ Partial fallback lists on failure (return `Error::Repository`)
/// - ❌ Deliver notifications (owned by `NotificationDispatcher`)
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Enumerate all current subscribers
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Subscriber>)`: Current subscribers (possibly empty)
    /// - `Err(Error::Repository)`: The list could not be read
    async fn get_all(&self) -> Result<Vec<Subscriber>, crate::Error>;

    /// Get the repository name (for logging/debugging)
    fn repository_name(&self) -> &'static str;
}

/// Helper trait for constructing subscriber repositories from configuration
pub trait SubscriberRepositoryFactory: Send + Sync {
    /// Create a SubscriberRepository instance from configuration
    fn create(
        &self,
        config: &crate::config::SubscriberStoreConfig,
    ) -> Result<Box<dyn SubscriberRepository>, crate::Error>;
}
