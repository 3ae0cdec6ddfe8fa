use std::fmt;

use thiserror::Error;

/// Label written between brackets in every error-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
    Timestamp,
    Domain,
    ReadFeeds,
    SaveData,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Fetch => "Get RSS error",
            Stage::Parse => "Parse RSS error",
            Stage::Timestamp => "Getting article time error",
            Stage::Domain => "Extract domain error",
            Stage::ReadFeeds => "Read RSS feeds error",
            Stage::SaveData => "Save data error",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to parse time: {0}")]
pub struct TimestampParseError(pub String);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url}: HTTP status {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. } | FetchError::Status { url, .. } => url,
        }
    }
}

/// Everything that can go wrong with a single feed. None of these stop a run.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },

    #[error("{title}: no parseable published or updated time")]
    Timestamp { title: String },

    #[error("{link}: {reason}")]
    Domain { link: String, reason: String },
}

impl FeedError {
    pub fn stage(&self) -> Stage {
        match self {
            FeedError::Fetch(_) => Stage::Fetch,
            FeedError::Parse { .. } => Stage::Parse,
            FeedError::Timestamp { .. } => Stage::Timestamp,
            FeedError::Domain { .. } => Stage::Domain,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request for '{path}' failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{path}' returned HTTP {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("'{path}' changed since it was read")]
    Conflict { path: String },

    #[error("{operation} '{path}': {source}")]
    Io {
        operation: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode '{path}': {reason}")]
    Decode { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum FeedListError {
    #[error("cannot read feed list '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("feed list '{0}' does not exist")]
    Missing(String),

    #[error("feed list '{path}' is not UTF-8")]
    Encoding { path: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("cannot serialize articles: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("reading feed list: {0}")]
    FeedList(#[from] FeedListError),

    #[error("publishing articles: {0}")]
    Publish(#[from] PublishError),
}
