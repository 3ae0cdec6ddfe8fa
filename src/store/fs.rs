use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::store::{ObjectStore, StoredObject, VersionToken};

/// Objects as files under a root directory; the version token is the
/// SHA-256 of the content.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

fn io_error(operation: &'static str, path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        operation,
        path: path.display().to_string(),
        source,
    }
}

fn digest(content: &[u8]) -> VersionToken {
    VersionToken::new(format!("{:x}", Sha256::digest(content)))
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn ensure_parent(&self, file: &Path) -> Result<(), StoreError> {
        match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| io_error("Failed to create", parent, e))
            }
            _ => Ok(()),
        }
    }
}

impl ObjectStore for FsStore {
    fn get(&self, path: &str) -> Result<Option<StoredObject>, StoreError> {
        let file = self.resolve(path);
        match fs::read(&file) {
            Ok(content) => Ok(Some(StoredObject {
                version: digest(&content),
                content,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("Failed to read", &file, e)),
        }
    }

    fn create(&self, path: &str, content: &[u8]) -> Result<(), StoreError> {
        let file = self.resolve(path);
        self.ensure_parent(&file)?;
        let mut handle = match OpenOptions::new().write(true).create_new(true).open(&file) {
            Ok(handle) => handle,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                });
            }
            Err(e) => return Err(io_error("Failed to create", &file, e)),
        };
        handle
            .write_all(content)
            .map_err(|e| io_error("Failed to write", &file, e))
    }

    fn update(
        &self,
        path: &str,
        content: &[u8],
        version: &VersionToken,
    ) -> Result<(), StoreError> {
        match self.get(path)? {
            Some(current) if current.version == *version => {}
            _ => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                });
            }
        }
        let file = self.resolve(path);
        fs::write(&file, content).map_err(|e| io_error("Failed to write", &file, e))
    }
}
