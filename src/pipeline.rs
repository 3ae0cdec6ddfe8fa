use tracing::{debug, info, info_span, warn};

use crate::article::{Article, aggregate};
use crate::error::{FeedError, RunError, Stage};
use crate::extract::{ExtractOptions, Extraction, extract};
use crate::feeds::FeedList;
use crate::fetch::{FeedFetcher, parse_feed};
use crate::publish::publish;
use crate::remote_log::RemoteLog;
use crate::store::ObjectStore;
use crate::time::Clock;

pub const DEFAULT_ARTIFACT_PATH: &str = "api/rss_data.json";
pub const DEFAULT_ERROR_LOG_PATH: &str = "api/error.log";

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub artifact_path: String,
    pub error_log_path: String,
    pub extract: ExtractOptions,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            artifact_path: DEFAULT_ARTIFACT_PATH.to_string(),
            error_log_path: DEFAULT_ERROR_LOG_PATH.to_string(),
            extract: ExtractOptions { track_domain: true },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub feeds: usize,
    pub articles: usize,
    pub errors: usize,
}

/// Fetch every feed in order and return the sorted aggregate.
///
/// Per-feed problems go to `report` and never stop the loop.
pub fn collect_articles<R>(
    fetcher: &dyn FeedFetcher,
    urls: &[String],
    options: ExtractOptions,
    clock: &Clock,
    mut report: R,
) -> Vec<Article>
where
    R: FnMut(&FeedError),
{
    let mut articles = Vec::new();
    let mut reject = |err: FeedError| {
        warn!(stage = %err.stage(), error = %err, "feed error");
        report(&err);
    };

    for url in urls {
        let _span = info_span!("feed", url = %url).entered();

        let raw = match fetcher.fetch(url) {
            Ok(raw) => raw,
            Err(err) => {
                reject(err.into());
                continue;
            }
        };

        let feed = match parse_feed(&raw) {
            Ok(feed) => feed,
            Err(err) => {
                reject(err);
                continue;
            }
        };

        let Extraction { article, errors } = extract(&feed, options, clock.now());
        for err in errors {
            reject(err);
        }
        match article {
            Some(article) => {
                debug!(title = %article.title, date = %article.published_display, "latest entry");
                articles.push(article);
            }
            None => debug!("feed has no entries"),
        }
    }

    aggregate(articles)
}

/// One full run: read the feed list, collect, publish. Per-feed errors are
/// appended to the remote error log; only the feed list and the publish
/// step can fail the run.
pub fn run(
    store: &dyn ObjectStore,
    feed_list: &dyn FeedList,
    fetcher: &dyn FeedFetcher,
    settings: &RunSettings,
    clock: Clock,
) -> Result<RunSummary, RunError> {
    let log = RemoteLog::new(store, settings.error_log_path.as_str(), clock);

    let urls = feed_list.list_feeds().map_err(|err| {
        log.record(Stage::ReadFeeds, &err);
        RunError::from(err)
    })?;
    info!(feeds = urls.len(), "read feed list");

    let mut errors = 0;
    let articles = collect_articles(fetcher, &urls, settings.extract, &clock, |err| {
        errors += 1;
        log.record_feed_error(err);
    });

    publish(store, &settings.artifact_path, &articles).map_err(|err| {
        log.record(Stage::SaveData, &err);
        RunError::from(err)
    })?;

    let summary = RunSummary {
        feeds: urls.len(),
        articles: articles.len(),
        errors,
    };
    info!(?summary, "run finished");
    Ok(summary)
}
