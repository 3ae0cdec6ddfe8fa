use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::store::{ObjectStore, StoredObject, VersionToken};

#[derive(Debug, Default)]
struct Objects {
    entries: HashMap<String, (Vec<u8>, u64)>,
    revision: u64,
}

/// In-process store with the same create/update rules as the remote ones.
/// Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<Objects>,
    failing: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object as if an earlier run had written it.
    pub fn with_object(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        {
            let mut objects = self.lock();
            objects.revision += 1;
            let revision = objects.revision;
            objects
                .entries
                .insert(path.to_string(), (content.into(), revision));
        }
        self
    }

    /// Every operation on `path` fails as if the backend were down.
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.lock()
            .entries
            .get(path)
            .map(|(content, _)| content.clone())
    }

    pub fn read_string(&self, path: &str) -> Option<String> {
        self.read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn lock(&self) -> MutexGuard<'_, Objects> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, path: &str) -> Result<(), StoreError> {
        if self.failing.contains(path) {
            return Err(StoreError::Status {
                path: path.to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError> {
        self.check(path)?;
        Ok(self
            .lock()
            .entries
            .get(path)
            .map(|(content, revision)| StoredObject {
                content: content.clone(),
                version: VersionToken::new(revision.to_string()),
            }))
    }

    fn create(&self, path: &str, content: &[u8]) -> Result<(), StoreError> {
        self.check(path)?;
        let mut objects = self.lock();
        if objects.entries.contains_key(path) {
            return Err(StoreError::Conflict {
                path: path.to_string(),
            });
        }
        objects.revision += 1;
        let revision = objects.revision;
        objects
            .entries
            .insert(path.to_string(), (content.to_vec(), revision));
        Ok(())
    }

    fn update(
        &self,
        path: &str,
        content: &[u8],
        version: &VersionToken,
    ) -> Result<(), StoreError> {
        self.check(path)?;
        let mut objects = self.lock();
        objects.revision += 1;
        let revision = objects.revision;
        match objects.entries.get_mut(path) {
            Some(entry) if entry.1.to_string() == version.as_str() => {
                *entry = (content.to_vec(), revision);
                Ok(())
            }
            _ => Err(StoreError::Conflict {
                path: path.to_string(),
            }),
        }
    }
}
