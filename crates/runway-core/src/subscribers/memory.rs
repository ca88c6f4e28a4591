// # Memory Subscriber Repository
//
// In-memory implementation of SubscriberRepository.
//
// ## Purpose
//
// Holds a fixed subscriber list from configuration, or a list that an
// embedding application swaps out with `replace_all` as people subscribe and
// unsubscribe. The dispatcher sees the new list on its next event.
//
// ## When to Use
//
// - Testing environments
// - Small deployments with a static recipient list
// - Applications that manage subscribers themselves

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::SubscriberStoreConfig;
use crate::traits::subscriber_repository::{
    Subscriber, SubscriberRepository, SubscriberRepositoryFactory,
};

/// In-memory subscriber repository
///
/// # Example
///
/// ```rust,no_run
/// use runway_core::subscribers::MemorySubscriberRepository;
/// use runway_core::traits::{Subscriber, SubscriberRepository};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repository = MemorySubscriberRepository::with_subscribers(vec![
///         Subscriber::new("123456789", "ops channel"),
///     ]);
///
///     let subscribers = repository.get_all().await?;
///     assert_eq!(subscribers.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySubscriberRepository {
    inner: Arc<RwLock<Vec<Subscriber>>>,
}

impl MemorySubscriberRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `subscribers`
    pub fn with_subscribers(subscribers: Vec<Subscriber>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(subscribers)),
        }
    }

    /// Swap the whole subscriber list
    ///
    /// Clones share the list, so the dispatcher holding one clone sees the
    /// change on its next event.
    pub async fn replace_all(&self, subscribers: Vec<Subscriber>) {
        *self.inner.write().await = subscribers;
    }

    /// Get the number of subscribers
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if there are no subscribers
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriberRepository for MemorySubscriberRepository {
    async fn get_all(&self) -> Result<Vec<Subscriber>, Error> {
        Ok(self.inner.read().await.clone())
    }

    fn repository_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for in-memory repositories
pub struct MemorySubscriberRepositoryFactory;

impl SubscriberRepositoryFactory for MemorySubscriberRepositoryFactory {
    fn create(
        &self,
        config: &SubscriberStoreConfig,
    ) -> Result<Box<dyn SubscriberRepository>, Error> {
        match config {
            SubscriberStoreConfig::Memory { subscribers } => Ok(Box::new(
                MemorySubscriberRepository::with_subscribers(subscribers.clone()),
            )),
            _ => Err(Error::config("Invalid config for memory subscriber repository")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_repository_basic() {
        let repository = MemorySubscriberRepository::new();
        assert!(repository.is_empty().await);
        assert!(repository.get_all().await.unwrap().is_empty());

        repository
            .replace_all(vec![Subscriber::new("1", "one"), Subscriber::new("2", "two")])
            .await;

        assert_eq!(repository.len().await, 2);
        assert_eq!(repository.get_all().await.unwrap()[1].label, "two");
    }

    #[tokio::test]
    async fn test_clones_share_the_list() {
        let repository = MemorySubscriberRepository::new();
        let dispatcher_view = repository.clone();

        repository.replace_all(vec![Subscriber::new("1", "one")]).await;

        assert_eq!(dispatcher_view.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_factory_uses_inline_subscribers() {
        let config = SubscriberStoreConfig::Memory {
            subscribers: vec![Subscriber::new("42", "")],
        };

        let repository = MemorySubscriberRepositoryFactory.create(&config).unwrap();
        assert_eq!(repository.get_all().await.unwrap().len(), 1);
        assert_eq!(repository.repository_name(), "memory");

        let wrong = SubscriberStoreConfig::File {
            path: "subscribers.json".to_string(),
        };
        assert!(MemorySubscriberRepositoryFactory.create(&wrong).is_err());
    }
}
