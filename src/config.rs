use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dirs::{config_dir, data_dir};
use serde::Deserialize;

use crate::extract::ExtractOptions;
use crate::pipeline::{DEFAULT_ARTIFACT_PATH, DEFAULT_ERROR_LOG_PATH, RunSettings};
use crate::time::DEFAULT_OFFSET_HOURS;

/// Shape of config.toml on disk
///
/// Example:
/// ```toml
/// artifact_path = "api/rss_data.json"
/// error_log_path = "api/error.log"
/// track_domain = true
/// log_offset_hours = 8
/// fetch_timeout_secs = 30
///
/// [feeds]
/// object = "api/rss_feeds.txt"
///
/// [store]
/// kind = "github"
/// owner = "someone"
/// repo = "someone.github.io"
/// token_env = "TOKEN"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    pub artifact_path: Option<String>,
    pub error_log_path: Option<String>,
    pub track_domain: Option<bool>,
    pub log_offset_hours: Option<i32>,
    pub fetch_timeout_secs: Option<u64>,
    pub store_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub feeds: Option<RawFeeds>,
    pub store: Option<RawStore>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawFeeds {
    pub file: Option<String>,
    pub object: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawStore {
    Fs {
        root: Option<String>,
    },
    Github {
        owner: String,
        repo: String,
        branch: Option<String>,
        token_env: Option<String>,
        api_url: Option<String>,
    },
    Http {
        bucket_url: String,
        token_env: Option<String>,
    },
}

/// Credential read from the environment; kept out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    File(PathBuf),
    Object(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Fs {
        root: PathBuf,
    },
    Github {
        owner: String,
        repo: String,
        branch: String,
        token: Secret,
        api_url: String,
    },
    Http {
        bucket_url: String,
        token: Option<Secret>,
    },
}

/// Resolved config used by the app
#[derive(Debug, Clone)]
pub struct Config {
    pub artifact_path: String,
    pub error_log_path: String,
    pub track_domain: bool,
    pub log_offset_hours: i32,
    pub fetch_timeout: Duration,
    pub store_timeout: Duration,
    pub user_agent: String,
    pub feeds: FeedSource,
    pub store: StoreConfig,
}

impl Config {
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            artifact_path: self.artifact_path.clone(),
            error_log_path: self.error_log_path.clone(),
            extract: ExtractOptions {
                track_domain: self.track_domain,
            },
        }
    }
}

pub const DEFAULT_FEEDS_FILE: &str = "rss_feeds.txt";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOKEN_ENV: &str = "TOKEN";
pub const DEFAULT_BRANCH: &str = "master";
pub const GITHUB_API_URL: &str = "https://api.github.com";

pub fn default_config_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedroll")
        .join("config.toml")
}

/// Load config from `path`, or from ~/.config/feedroll/config.toml if it
/// exists, otherwise use defaults:
///
/// artifact_path = "api/rss_data.json"
/// error_log_path = "api/error.log"
/// feeds file = "rss_feeds.txt"
/// store = files under ~/.local/share/feedroll
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let raw = match path {
        Some(path) => Some(read_raw(path)?),
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                Some(read_raw(&default_path)?)
            } else {
                None
            }
        }
    };

    resolve(raw.unwrap_or_default(), |name| std::env::var(name).ok())
}

fn read_raw(path: &Path) -> Result<RawConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Apply defaults and look up the store token with `env`.
pub fn resolve(raw: RawConfig, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let log_offset_hours = raw.log_offset_hours.unwrap_or(DEFAULT_OFFSET_HOURS);
    if !(-23..=23).contains(&log_offset_hours) {
        bail!("log_offset_hours must be between -23 and 23, got {log_offset_hours}");
    }

    let feeds = match raw.feeds.unwrap_or_default() {
        RawFeeds {
            file: Some(_),
            object: Some(_),
        } => bail!("[feeds] takes either `file` or `object`, not both"),
        RawFeeds {
            object: Some(object),
            ..
        } => FeedSource::Object(object),
        RawFeeds { file, .. } => {
            FeedSource::File(PathBuf::from(file.as_deref().unwrap_or(DEFAULT_FEEDS_FILE)))
        }
    };

    let read_token = |var: &str| {
        env(var)
            .filter(|v| !v.is_empty())
            .map(Secret::new)
            .with_context(|| format!("Environment variable '{var}' is not set"))
    };

    let store = match raw.store {
        None | Some(RawStore::Fs { root: None }) => StoreConfig::Fs {
            root: data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("feedroll"),
        },
        Some(RawStore::Fs { root: Some(root) }) => StoreConfig::Fs {
            root: PathBuf::from(root),
        },
        Some(RawStore::Github {
            owner,
            repo,
            branch,
            token_env,
            api_url,
        }) => StoreConfig::Github {
            token: read_token(token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV))?,
            owner,
            repo,
            branch: branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            api_url: api_url.unwrap_or_else(|| GITHUB_API_URL.to_string()),
        },
        Some(RawStore::Http {
            bucket_url,
            token_env,
        }) => StoreConfig::Http {
            token: token_env.as_deref().map(read_token).transpose()?,
            bucket_url,
        },
    };

    Ok(Config {
        artifact_path: raw
            .artifact_path
            .unwrap_or_else(|| DEFAULT_ARTIFACT_PATH.to_string()),
        error_log_path: raw
            .error_log_path
            .unwrap_or_else(|| DEFAULT_ERROR_LOG_PATH.to_string()),
        track_domain: raw.track_domain.unwrap_or(true),
        log_offset_hours,
        fetch_timeout: Duration::from_secs(raw.fetch_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        store_timeout: Duration::from_secs(raw.store_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        user_agent: raw
            .user_agent
            .unwrap_or_else(|| format!("feedroll/{}", env!("CARGO_PKG_VERSION"))),
        feeds,
        store,
    })
}
