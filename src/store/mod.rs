//! Remote object storage.
//!
//! None of the backends offer an upsert, so writes go through [`upsert`]:
//! read the object, then either create it or update it with the version
//! token from that read. Nothing guards the gap between the read and the
//! write; a concurrent writer in between wins or gets a conflict.

pub mod fs;
pub mod github;
pub mod http;
pub mod memory;

use std::time::Duration;

use tracing::debug;

use crate::config::StoreConfig;
use crate::error::StoreError;

pub use fs::FsStore;
pub use github::GithubStore;
pub use http::HttpStore;
pub use memory::MemoryStore;

/// Opaque identity of the stored revision an update is based on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content: Vec<u8>,
    pub version: VersionToken,
}

pub trait ObjectStore {
    /// `Ok(None)` when nothing was ever written at `path`.
    fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError>;

    fn create(&self, path: &str, content: &[u8]) -> Result<(), StoreError>;

    fn update(&self, path: &str, content: &[u8], version: &VersionToken)
    -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Written {
    Created,
    Updated,
}

/// Read `path`, build the new content from what is there, and write it back.
pub fn upsert<F>(store: &dyn ObjectStore, path: &str, build: F) -> Result<Written, StoreError>
where
    F: FnOnce(Option<&[u8]>) -> Vec<u8>,
{
    match store.get(path)? {
        None => {
            debug!(path, "object absent, creating");
            store.create(path, &build(None))?;
            Ok(Written::Created)
        }
        Some(existing) => {
            debug!(path, version = existing.version.as_str(), "updating object");
            let content = build(Some(&existing.content));
            store.update(path, &content, &existing.version)?;
            Ok(Written::Updated)
        }
    }
}

/// Construct the backend named in the config.
pub fn open_store(
    cfg: &StoreConfig,
    user_agent: &str,
    timeout: Duration,
) -> Result<Box<dyn ObjectStore>, StoreError> {
    let store: Box<dyn ObjectStore> = match cfg {
        StoreConfig::Fs { root } => Box::new(FsStore::new(root.clone())),
        StoreConfig::Github {
            owner,
            repo,
            branch,
            token,
            api_url,
        } => Box::new(GithubStore::new(
            api_url,
            owner,
            repo,
            branch,
            token.expose(),
            user_agent,
            timeout,
        )?),
        StoreConfig::Http { bucket_url, token } => Box::new(HttpStore::new(
            bucket_url,
            token.as_ref().map(|t| t.expose()),
            user_agent,
            timeout,
        )?),
    };
    Ok(store)
}
