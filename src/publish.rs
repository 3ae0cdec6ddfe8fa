use tracing::info;

use crate::article::Article;
use crate::error::PublishError;
use crate::store::{ObjectStore, Written, upsert};

/// Replace the JSON artifact at `path` with `articles`, creating it if needed.
pub fn publish(
    store: &dyn ObjectStore,
    path: &str,
    articles: &[Article],
) -> Result<Written, PublishError> {
    let json = serde_json::to_vec(articles)?;
    let written = upsert(store, path, |_| json)?;
    info!(path, articles = articles.len(), ?written, "published articles");
    Ok(written)
}
