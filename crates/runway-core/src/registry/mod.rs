//! Plugin-based component registry
//!
//! The registry allows sources, transports and subscriber repositories to be
//! registered by name at runtime, so the daemon can build them from
//! configuration without hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use runway_core::registry::ComponentRegistry;
//!
//! let registry = ComponentRegistry::with_builtins();
//! runway_source_lvnl::register(&registry);
//! runway_notify_telegram::register(&registry);
//!
//! let source = registry.create_source(&config.source)?;
//! let transport = registry.create_transport(&config.transport)?;
//! let subscribers = registry.create_subscriber_repository(&config.subscribers)?;
//! ```
//!
//! ## Registration
//!
//! Plugin crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &ComponentRegistry) {
//!     registry.register_source("lvnl", Box::new(LvnlFactory));
//! }
//! ```

use crate::config::{SourceConfig, SubscriberStoreConfig, TransportConfig};
use crate::error::{Error, Result};
use crate::subscribers::{FileSubscriberRepositoryFactory, MemorySubscriberRepositoryFactory};
use crate::traits::{NotificationTransport, SourceClient, SubscriberRepository};
use crate::traits::{NotificationTransportFactory, SourceClientFactory, SubscriberRepositoryFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Component registry for plugin-based construction
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ComponentRegistry {
    /// Registered source client factories
    sources: RwLock<HashMap<String, Box<dyn SourceClientFactory>>>,

    /// Registered transport factories
    transports: RwLock<HashMap<String, Box<dyn NotificationTransportFactory>>>,

    /// Registered subscriber repository factories
    subscriber_repositories: RwLock<HashMap<String, Box<dyn SubscriberRepositoryFactory>>>,
}

impl ComponentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in `memory` and `file` subscriber
    /// repositories registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_subscriber_repository(
            "memory",
            Box::new(MemorySubscriberRepositoryFactory),
        );
        registry.register_subscriber_repository("file", Box::new(FileSubscriberRepositoryFactory));
        registry
    }

    /// Register a source client factory
    ///
    /// # Parameters
    ///
    /// - `name`: Source type name (e.g., "lvnl")
    /// - `factory`: Factory object for creating source instances
    pub fn register_source(&self, name: impl Into<String>, factory: Box<dyn SourceClientFactory>) {
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.insert(name.into(), factory);
    }

    /// Register a notification transport factory
    ///
    /// # Parameters
    ///
    /// - `name`: Transport type name (e.g., "telegram")
    /// - `factory`: Factory object for creating transport instances
    pub fn register_transport(
        &self,
        name: impl Into<String>,
        factory: Box<dyn NotificationTransportFactory>,
    ) {
        let mut transports = self.transports.write().unwrap_or_else(PoisonError::into_inner);
        transports.insert(name.into(), factory);
    }

    /// Register a subscriber repository factory
    ///
    /// # Parameters
    ///
    /// - `name`: Repository type name (e.g., "file", "memory")
    /// - `factory`: Factory object for creating repository instances
    pub fn register_subscriber_repository(
        &self,
        name: impl Into<String>,
        factory: Box<dyn SubscriberRepositoryFactory>,
    ) {
        let mut repositories = self
            .subscriber_repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        repositories.insert(name.into(), factory);
    }

    /// Create a source client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn SourceClient>)`: Created source instance
    /// - `Err(Error)`: If the source type is not registered or creation fails
    pub fn create_source(&self, config: &SourceConfig) -> Result<Box<dyn SourceClient>> {
        let source_type = config.type_name();
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown source type: {}", source_type)))?;

        factory.create(config)
    }

    /// Create a notification transport from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn NotificationTransport>)`: Created transport instance
    /// - `Err(Error)`: If the transport type is not registered or creation fails
    pub fn create_transport(
        &self,
        config: &TransportConfig,
    ) -> Result<Box<dyn NotificationTransport>> {
        let transport_type = config.type_name();
        let transports = self.transports.read().unwrap_or_else(PoisonError::into_inner);

        let factory = transports
            .get(transport_type)
            .ok_or_else(|| Error::config(format!("Unknown transport type: {}", transport_type)))?;

        factory.create(config)
    }

    /// Create a subscriber repository from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn SubscriberRepository>)`: Created repository instance
    /// - `Err(Error)`: If the repository type is not registered or creation fails
    pub fn create_subscriber_repository(
        &self,
        config: &SubscriberStoreConfig,
    ) -> Result<Box<dyn SubscriberRepository>> {
        let repository_type = config.type_name();
        let repositories = self
            .subscriber_repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = repositories.get(repository_type).ok_or_else(|| {
            Error::config(format!(
                "Unknown subscriber repository type: {}",
                repository_type
            ))
        })?;

        factory.create(config)
    }

    /// List all registered source types
    pub fn list_sources(&self) -> Vec<String> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.keys().cloned().collect()
    }

    /// List all registered transport types
    pub fn list_transports(&self) -> Vec<String> {
        let transports = self.transports.read().unwrap_or_else(PoisonError::into_inner);
        transports.keys().cloned().collect()
    }

    /// List all registered subscriber repository types
    pub fn list_subscriber_repositories(&self) -> Vec<String> {
        let repositories = self
            .subscriber_repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        repositories.keys().cloned().collect()
    }

    /// Check if a source type is registered
    pub fn has_source(&self, name: &str) -> bool {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }

    /// Check if a transport type is registered
    pub fn has_transport(&self, name: &str) -> bool {
        let transports = self.transports.read().unwrap_or_else(PoisonError::into_inner);
        transports.contains_key(name)
    }

    /// Check if a subscriber repository type is registered
    pub fn has_subscriber_repository(&self, name: &str) -> bool {
        let repositories = self
            .subscriber_repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        repositories.contains_key(name)
    }
}
