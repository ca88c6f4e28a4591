// # File Subscriber Repository
//
// Read-only view of a JSON subscriber file.
//
// ## Purpose
//
// Lets an external tool (or an operator) own the subscriber list while the
// dispatcher only reads it. The file is re-read on every `get_all`, so edits
// take effect on the next change event without a restart.
//
// ## Corruption Handling
//
// - Missing file: no subscribers
// - Unparsable file: fall back to `<path>.backup` if it exists
// - Both unusable: `Error::Repository` (the dispatch for that event fails)
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "subscribers": [
//     { "recipient_id": "123456789", "label": "ops channel" }
//   ]
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Error;
use crate::config::SubscriberStoreConfig;
use crate::traits::subscriber_repository::{
    Subscriber, SubscriberRepository, SubscriberRepositoryFactory,
};

/// Subscriber file format version
const SUBSCRIBER_FILE_VERSION: &str = "1.0";

/// Serializable subscriber file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct SubscriberFileFormat {
    version: String,
    subscribers: Vec<Subscriber>,
}

/// Outcome of reading one file
enum Load {
    Missing,
    Loaded(Vec<Subscriber>),
    Corrupt(Error),
}

/// JSON file subscriber repository
///
/// # Example
///
/// ```rust,no_run
/// use runway_core::subscribers::FileSubscriberRepository;
/// use runway_core::traits::SubscriberRepository;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let repository = FileSubscriberRepository::new("/var/lib/runway/subscribers.json");
///
///     for subscriber in repository.get_all().await? {
///         println!("{} ({})", subscriber.recipient_id, subscriber.label);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSubscriberRepository {
    path: PathBuf,
}

impl FileSubscriberRepository {
    /// Create a repository reading from `path`
    ///
    /// The file does not need to exist yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Load subscribers, falling back to the backup on corruption
    async fn load_with_recovery(&self) -> Result<Vec<Subscriber>, Error> {
        match Self::load(&self.path).await? {
            Load::Missing => {
                tracing::debug!("Subscriber file does not exist: {}", self.path.display());
                Ok(Vec::new())
            }
            Load::Loaded(subscribers) => Ok(subscribers),
            Load::Corrupt(e) => {
                tracing::warn!(
                    "Subscriber file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(&self.path);
                match Self::load(&backup_path).await? {
                    Load::Loaded(subscribers) => {
                        tracing::info!(
                            "Read {} subscriber(s) from backup {}",
                            subscribers.len(),
                            backup_path.display()
                        );
                        Ok(subscribers)
                    }
                    Load::Missing => Err(Error::repository(format!(
                        "{} (no backup found)",
                        e
                    ))),
                    Load::Corrupt(backup_err) => Err(Error::repository(format!(
                        "{}; backup also unusable: {}",
                        e, backup_err
                    ))),
                }
            }
        }
    }

    /// Read and parse one file
    async fn load(path: &Path) -> Result<Load, Error> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Load::Missing),
            Err(e) => {
                return Err(Error::repository(format!(
                    "Failed to read subscriber file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let file: SubscriberFileFormat = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(e) => {
                return Ok(Load::Corrupt(Error::repository(format!(
                    "Failed to parse subscriber file {}: {}",
                    path.display(),
                    e
                ))));
            }
        };

        if file.version != SUBSCRIBER_FILE_VERSION {
            tracing::warn!(
                "Subscriber file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                SUBSCRIBER_FILE_VERSION,
                file.version
            );
        }

        Ok(Load::Loaded(file.subscribers))
    }
}

#[async_trait]
impl SubscriberRepository for FileSubscriberRepository {
    async fn get_all(&self) -> Result<Vec<Subscriber>, Error> {
        self.load_with_recovery().await
    }

    fn repository_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for file repositories
pub struct FileSubscriberRepositoryFactory;

impl SubscriberRepositoryFactory for FileSubscriberRepositoryFactory {
    fn create(
        &self,
        config: &SubscriberStoreConfig,
    ) -> Result<Box<dyn SubscriberRepository>, Error> {
        match config {
            SubscriberStoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(Error::config("Subscriber file path is required"));
                }
                Ok(Box::new(FileSubscriberRepository::new(path)))
            }
            _ => Err(Error::config("Invalid config for file subscriber repository")),
        }
    }
}
