// # Source Client Trait
//
// Defines the interface for fetching a point-in-time runway usage report.
//
// ## Implementations
//
// - LVNL runway usage endpoint: `runway-source-lvnl` crate
//
// ## Usage
//
// ```rust,ignore
// use runway_core::traits::{SourceClient, SnapshotRequest};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* SourceClient implementation */;
//
//     let request = SnapshotRequest::from_datetime(&chrono::Local::now());
//     let snapshot = source.fetch(&request).await?;
//     println!("landing: {:?}", snapshot.active_landing());
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt;

/// Number of landing (and takeoff) slots in a report
pub const SLOTS_PER_CATEGORY: usize = 3;

/// A runway usage request at minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotRequest {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl SnapshotRequest {
    /// Build a request from a wall-clock time, truncated to the minute
    pub fn from_datetime<T: Datelike + Timelike>(now: &T) -> Self {
        Self {
            year: now.year(),
            month: now.month(),
            day: now.day(),
            hour: now.hour(),
            minute: now.minute(),
        }
    }

    /// The wire payload: `[year,month,day,hour,minute]`
    pub fn payload(&self) -> String {
        format!(
            "[{},{},{},{},{}]",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

impl fmt::Display for SnapshotRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

/// One report of currently active runways
///
/// Empty slots are represented by empty strings, matching the source.
/// A snapshot is consumed once per refresh cycle and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Report identifier
    pub id: i64,
    /// When the report was last updated
    pub updated: NaiveDateTime,
    /// Start of the validity window
    pub start: NaiveDateTime,
    /// End of the validity window
    pub end: NaiveDateTime,
    /// Runway codes in use for landing
    pub landing: [String; SLOTS_PER_CATEGORY],
    /// Runway codes in use for takeoff
    pub takeoff: [String; SLOTS_PER_CATEGORY],
    /// Source status string
    pub state: String,
    /// Whether this is the most recent report
    pub is_last: bool,
}

impl Snapshot {
    /// Create a snapshot with neutral metadata from lists of active codes
    ///
    /// At most three codes per category are kept; extra codes are ignored
    /// as the source never reports more.
    pub fn with_runways(landing: &[&str], takeoff: &[&str]) -> Self {
        let epoch = NaiveDateTime::default();
        Self {
            id: 0,
            updated: epoch,
            start: epoch,
            end: epoch,
            landing: fill_slots(landing),
            takeoff: fill_slots(takeoff),
            state: String::new(),
            is_last: true,
        }
    }

    /// Non-empty landing codes, in slot order
    pub fn active_landing(&self) -> Vec<&str> {
        active_slots(&self.landing)
    }

    /// Non-empty takeoff codes, in slot order
    pub fn active_takeoff(&self) -> Vec<&str> {
        active_slots(&self.takeoff)
    }

    pub fn is_landing(&self, code: &str) -> bool {
        self.active_landing().contains(&code)
    }

    /// Whether `code` is reported in either category
    pub fn is_active(&self, code: &str) -> bool {
        self.is_landing(code) || self.active_takeoff().contains(&code)
    }
}

fn fill_slots(codes: &[&str]) -> [String; SLOTS_PER_CATEGORY] {
    let mut slots: [String; SLOTS_PER_CATEGORY] = Default::default();
    for (slot, code) in slots.iter_mut().zip(codes) {
        *slot = code.to_string();
    }
    slots
}

fn active_slots(slots: &[String; SLOTS_PER_CATEGORY]) -> Vec<&str> {
    slots
        .iter()
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
        .collect()
}

/// Trait for runway usage source implementations
///
/// # Trust Level: Untrusted
///
/// Sources are single-shot request/response adapters:
///
/// ## Allowed Capabilities
/// - ✅ Perform one HTTP call (or equivalent) per `fetch`
/// - ✅ Parse the source's response format
///
/// ## Forbidden Capabilities
/// - ❌ Retry (the next scheduled tick is the retry)
/// - ❌ Retain state between calls
/// - ❌ Touch the runway state store (owned by `StateWatcher`)
///
/// The watcher bounds every call with its own request timeout, and treats
/// an elapsed timeout the same as `Error::SourceUnavailable`.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch the runway usage report for the given minute
    ///
    /// # Returns
    ///
    /// - `Ok(Snapshot)`: The report
    /// - `Err(Error::SourceUnavailable)`: Transport error or non-success status
    /// - `Err(Error::SourceMalformed)`: Response could not be parsed
    async fn fetch(&self, request: &SnapshotRequest) -> Result<Snapshot, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing source clients from configuration
pub trait SourceClientFactory: Send + Sync {
    /// Create a SourceClient instance from configuration
    fn create(
        &self,
        config: &crate::config::SourceConfig,
    ) -> Result<Box<dyn SourceClient>, crate::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_request_from_datetime() {
        let now = NaiveDate::from_ymd_opt(2019, 5, 1)
            .unwrap()
            .and_hms_opt(13, 7, 42)
            .unwrap();

        let request = SnapshotRequest::from_datetime(&now);
        assert_eq!(request.payload(), "[2019,5,1,13,7]");
        assert_eq!(request.to_string(), "2019-05-01 13:07");
    }

    #[test]
    fn test_empty_slots_are_inactive() {
        let mut snapshot = Snapshot::with_runways(&["18R", ""], &["24"]);
        snapshot.takeoff[2] = "  ".to_string();

        assert_eq!(snapshot.active_landing(), vec!["18R"]);
        assert_eq!(snapshot.active_takeoff(), vec!["24"]);
        assert!(snapshot.is_active("24"));
        assert!(!snapshot.is_active(""));
        assert!(!snapshot.is_landing("24"));
    }

    #[test]
    fn test_with_runways_keeps_three_slots() {
        let snapshot = Snapshot::with_runways(&["A", "B", "C", "D"], &[]);
        assert_eq!(snapshot.active_landing(), vec!["A", "B", "C"]);
    }
}
