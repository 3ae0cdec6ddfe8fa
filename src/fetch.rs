use std::time::Duration;

use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{FeedError, FetchError};
use crate::sanitize::sanitize;
use crate::time::wall_clock_utc;

/// Undecoded body of one feed.
#[derive(Debug, Clone)]
pub struct RawFeed {
    pub url: String,
    pub body: Vec<u8>,
}

/// Retrieves one feed body. A failure only concerns that feed.
pub trait FeedFetcher {
    fn fetch(&self, url: &str) -> Result<RawFeed, FetchError>;
}

/// Single GET per feed over a blocking client; no retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<RawFeed, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().map_err(transport)?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body = resp.bytes().map_err(transport)?;
        debug!(url, bytes = body.len(), "fetched feed");

        Ok(RawFeed {
            url: url.to_string(),
            body: body.to_vec(),
        })
    }
}

/// Sanitize and parse a fetched body as RSS or Atom.
pub fn parse_feed(raw: &RawFeed) -> Result<Feed, FeedError> {
    let text = sanitize(&raw.body);
    parser::Builder::new()
        .timestamp_parser(wall_clock_utc)
        .build()
        .parse(text.as_bytes())
        .map_err(|source| FeedError::Parse {
            url: raw.url.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(body: &str) -> RawFeed {
        RawFeed {
            url: "https://blog.example/feed.xml".to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn parses_after_stripping_control_bytes() {
        let body = "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>\u{1}<title>Blog\u{8}</title>\
            <link>https://blog.example/</link>\
            <item><title>Hello</title><link>https://blog.example/hello</link>\
            <pubDate>Fri, 26 Jul 2024 10:00:00 +0800</pubDate></item></channel></rss>";
        let feed = parse_feed(&raw(body)).expect("feed parses");
        assert_eq!(feed.title.map(|t| t.content).as_deref(), Some("Blog"));
        assert_eq!(feed.entries.len(), 1);
        assert!(feed.entries[0].published.is_some());
    }

    #[test]
    fn rejects_non_feed_body() {
        let err = parse_feed(&raw("<html><body>not a feed</body></html>")).unwrap_err();
        assert!(matches!(err, FeedError::Parse { .. }));
        assert!(err.to_string().starts_with("https://blog.example/feed.xml: "));
    }

    #[test]
    fn unreadable_dates_become_none() {
        let body = "<rss version=\"2.0\"><channel><title>Blog</title>\
            <item><title>Hello</title><pubDate>last tuesday</pubDate></item></channel></rss>";
        let feed = parse_feed(&raw(body)).expect("feed parses");
        assert!(feed.entries[0].published.is_none());
    }
}
