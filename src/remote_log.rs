use std::fmt::Display;

use tracing::warn;

use crate::error::{FeedError, Stage, StoreError};
use crate::store::{ObjectStore, Written, upsert};
use crate::time::{Clock, log_stamp};

const ENTRY_TERMINATOR: &[u8] = b"\n\n";

/// Append-only error log kept as a single object in the store.
pub struct RemoteLog<'a> {
    store: &'a dyn ObjectStore,
    path: String,
    clock: Clock,
}

impl<'a> RemoteLog<'a> {
    pub fn new(store: &'a dyn ObjectStore, path: impl Into<String>, clock: Clock) -> Self {
        Self {
            store,
            path: path.into(),
            clock,
        }
    }

    /// `[Fri Jul 26 09:41:2024] [Get RSS error] detail`
    pub fn entry(&self, stage: Stage, detail: impl Display) -> String {
        format!("[{}] [{}] {}", log_stamp(&self.clock.now()), stage, detail)
    }

    /// Append `line` followed by a blank line, creating the log on first use.
    pub fn append(&self, line: &str) -> Result<Written, StoreError> {
        upsert(self.store, &self.path, |existing| {
            let mut content = existing.map(<[u8]>::to_vec).unwrap_or_default();
            content.extend_from_slice(line.as_bytes());
            content.extend_from_slice(ENTRY_TERMINATOR);
            content
        })
    }

    /// Best effort: a log that cannot be written is reported locally and
    /// otherwise ignored.
    pub fn record(&self, stage: Stage, detail: impl Display) {
        let line = self.entry(stage, detail);
        if let Err(err) = self.append(&line) {
            warn!(path = %self.path, error = %err, entry = %line, "could not append to error log");
        }
    }

    pub fn record_feed_error(&self, err: &FeedError) {
        self.record(err.stage(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn clock() -> Clock {
        Clock::frozen(Utc.with_ymd_and_hms(2024, 7, 26, 1, 41, 0).unwrap(), 8)
    }

    #[test]
    fn first_append_creates_object() {
        let store = MemoryStore::new();
        let log = RemoteLog::new(&store, "api/error.log", clock());
        assert_eq!(log.append("only line").unwrap(), Written::Created);
        assert_eq!(
            store.read_string("api/error.log").as_deref(),
            Some("only line\n\n")
        );
    }

    #[test]
    fn later_appends_keep_existing_content() {
        let store = MemoryStore::new().with_object("api/error.log", "A\n\n");
        let log = RemoteLog::new(&store, "api/error.log", clock());
        assert_eq!(log.append("B").unwrap(), Written::Updated);
        assert_eq!(
            store.read_string("api/error.log").as_deref(),
            Some("A\n\nB\n\n")
        );
    }

    #[test]
    fn entry_layout() {
        let store = MemoryStore::new();
        let log = RemoteLog::new(&store, "api/error.log", clock());
        assert_eq!(
            log.entry(Stage::Fetch, "https://x.example/feed: HTTP status 500"),
            "[Fri Jul 26 09:41:2024] [Get RSS error] https://x.example/feed: HTTP status 500"
        );
    }

    #[test]
    fn record_swallows_store_failures() {
        let store = MemoryStore::new().failing("api/error.log");
        let log = RemoteLog::new(&store, "api/error.log", clock());
        log.record(Stage::Parse, "broken");
        assert!(store.read("api/error.log").is_none());
    }

    #[test]
    fn records_feed_errors_with_their_stage() {
        let store = MemoryStore::new();
        let log = RemoteLog::new(&store, "api/error.log", clock());
        log.record_feed_error(&FeedError::Timestamp {
            title: "Undated".to_string(),
        });
        assert_eq!(
            store.read_string("api/error.log").as_deref(),
            Some("[Fri Jul 26 09:41:2024] [Getting article time error] Undated: no parseable published or updated time\n\n")
        );
    }
}
