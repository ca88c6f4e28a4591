// # Subscriber Repository Implementations
//
// Built-in implementations of the SubscriberRepository trait. Both are
// read-only from the dispatcher's point of view; subscriber management
// happens elsewhere.

pub mod file;
pub mod memory;

pub use file::{FileSubscriberRepository, FileSubscriberRepositoryFactory};
pub use memory::{MemorySubscriberRepository, MemorySubscriberRepositoryFactory};
