use std::fs;
use std::path::PathBuf;

use crate::error::FeedListError;
use crate::store::ObjectStore;

/// Where the newline-delimited list of feed URLs comes from.
pub trait FeedList {
    fn list_feeds(&self) -> Result<Vec<String>, FeedListError>;
}

/// One candidate URL per line. Blank lines are kept; fetching them fails
/// and is logged like any other bad feed.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

pub struct FileFeedList {
    path: PathBuf,
}

impl FileFeedList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FeedList for FileFeedList {
    fn list_feeds(&self) -> Result<Vec<String>, FeedListError> {
        let text = fs::read_to_string(&self.path).map_err(|source| FeedListError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(split_lines(&text))
    }
}

/// Feed list kept next to the artifacts in the object store.
pub struct StoreFeedList<'a> {
    store: &'a dyn ObjectStore,
    path: String,
}

impl<'a> StoreFeedList<'a> {
    pub fn new(store: &'a dyn ObjectStore, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }
}

impl FeedList for StoreFeedList<'_> {
    fn list_feeds(&self) -> Result<Vec<String>, FeedListError> {
        let object = self
            .store
            .get(&self.path)?
            .ok_or_else(|| FeedListError::Missing(self.path.clone()))?;
        let text = String::from_utf8(object.content).map_err(|_| FeedListError::Encoding {
            path: self.path.clone(),
        })?;
        Ok(split_lines(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn keeps_blank_lines_and_strips_terminators() {
        assert_eq!(
            split_lines("https://a.example/feed\r\n\nhttps://b.example/rss\n"),
            ["https://a.example/feed", "", "https://b.example/rss"]
        );
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rss_feeds.txt");
        fs::write(&path, "https://a.example/feed\nhttps://b.example/rss").unwrap();
        let feeds = FileFeedList::new(&path).list_feeds().unwrap();
        assert_eq!(feeds, ["https://a.example/feed", "https://b.example/rss"]);

        let missing = FileFeedList::new(dir.path().join("nope.txt")).list_feeds();
        assert!(matches!(missing, Err(FeedListError::Io { .. })));
    }

    #[test]
    fn reads_store_object() {
        let store = MemoryStore::new().with_object("api/rss_feeds.txt", "https://a.example/feed\n");
        let feeds = StoreFeedList::new(&store, "api/rss_feeds.txt")
            .list_feeds()
            .unwrap();
        assert_eq!(feeds, ["https://a.example/feed"]);

        let missing = StoreFeedList::new(&store, "api/other.txt").list_feeds();
        assert!(matches!(missing, Err(FeedListError::Missing(p)) if p == "api/other.txt"));
    }
}
