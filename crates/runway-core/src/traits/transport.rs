// # Notification Transport Trait
//
// Defines the interface for delivering one text message to one recipient.
//
// ## Implementations
//
// - Telegram Bot API: `runway-notify-telegram` crate
//
// ## Usage
//
// ```rust,ignore
// use runway_core::traits::NotificationTransport;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let transport = /* NotificationTransport implementation */;
//
//     transport.send("123456789", "Polderbaan (18R) is now active for landing").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for notification transport implementations
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform one API call per `send`
/// - ✅ Parse the API's response to decide success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Retry failed deliveries (the next genuine transition is a new event)
/// - ❌ Spawn tasks (the dispatcher owns fan-out concurrency)
/// - ❌ Enumerate subscribers (owned by `SubscriberRepository`)
///
/// Implementations are shared across concurrent deliveries and must be
/// safe to call from several tasks at once.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Deliver `text` to `recipient_id`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Delivered
    /// - `Err(Error::Transport)`: Delivery failed, with the reason
    async fn send(&self, recipient_id: &str, text: &str) -> Result<(), crate::Error>;

    /// Get the transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}

/// Helper trait for constructing transports from configuration
pub trait NotificationTransportFactory: Send + Sync {
    /// Create a NotificationTransport instance from configuration
    fn create(
        &self,
        config: &crate::config::TransportConfig,
    ) -> Result<Box<dyn NotificationTransport>, crate::Error>;
}
