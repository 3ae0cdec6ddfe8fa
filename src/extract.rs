use chrono::{DateTime, FixedOffset};
use feed_rs::model::{Entry, Feed, Link};
use url::Url;

use crate::article::Article;
use crate::error::FeedError;
use crate::time::format_display;

/// Stand-in domain when the site link cannot be read.
pub const UNKNOWN_DOMAIN: &str = "unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub track_domain: bool,
}

/// Outcome for one parsed feed. Errors here never drop the article.
#[derive(Debug, Default)]
pub struct Extraction {
    pub article: Option<Article>,
    pub errors: Vec<FeedError>,
}

/// Build the article for a feed's latest entry (index 0, as the feed orders them).
///
/// An empty feed yields nothing and is not an error. A missing time falls
/// back to `now`; an unreadable site link falls back to [`UNKNOWN_DOMAIN`].
pub fn extract(feed: &Feed, options: ExtractOptions, now: DateTime<FixedOffset>) -> Extraction {
    let Some(entry) = feed.entries.first() else {
        return Extraction::default();
    };

    let mut errors = Vec::new();
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.clone())
        .unwrap_or_default();

    let published_display = match entry.published.or(entry.updated) {
        Some(at) => format_display(&at),
        None => {
            errors.push(FeedError::Timestamp {
                title: title.clone(),
            });
            format_display(&now)
        }
    };

    let domain_name = if options.track_domain {
        let link = site_link(feed).unwrap_or_default();
        Some(extract_domain(link).unwrap_or_else(|err| {
            errors.push(err);
            UNKNOWN_DOMAIN.to_string()
        }))
    } else {
        None
    };

    let article = Article {
        domain_name,
        source_name: feed
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        title,
        link: entry_link(entry).unwrap_or_default().to_string(),
        published_display,
    };

    Extraction {
        article: Some(article),
        errors,
    }
}

fn is_alternate(link: &Link) -> bool {
    link.rel.as_deref().is_none_or(|rel| rel == "alternate")
}

fn preferred_link(links: &[Link]) -> Option<&str> {
    links
        .iter()
        .find(|l| is_alternate(l))
        .or_else(|| links.iter().find(|l| l.rel.as_deref() != Some("self")))
        .map(|l| l.href.as_str())
}

/// Home page the feed points to (never its own `rel="self"` URL).
pub fn site_link(feed: &Feed) -> Option<&str> {
    preferred_link(&feed.links)
}

fn entry_link(entry: &Entry) -> Option<&str> {
    preferred_link(&entry.links).or_else(|| entry.links.first().map(|l| l.href.as_str()))
}

/// Reduce a site link to `scheme://host`, assuming `https` when it has no scheme.
pub fn extract_domain(link: &str) -> Result<String, FeedError> {
    let domain_error = |reason: String| FeedError::Domain {
        link: link.to_string(),
        reason,
    };

    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{link}")).map_err(|e| domain_error(e.to_string()))?
        }
        Err(e) => return Err(domain_error(e.to_string())),
    };

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(format!("{}://{}", url.scheme(), host)),
        _ => Err(domain_error("no host in link".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{RawFeed, parse_feed};
    use crate::time::parse_timestamp;

    fn now() -> DateTime<FixedOffset> {
        parse_timestamp("2024-08-01T12:00:00+08:00").unwrap()
    }

    fn feed(xml: &str) -> Feed {
        parse_feed(&RawFeed {
            url: "https://blog.example/feed".to_string(),
            body: xml.as_bytes().to_vec(),
        })
        .expect("fixture parses")
    }

    fn rss(items: &str) -> Feed {
        feed(&format!(
            "<rss version=\"2.0\"><channel><title>Road Notes</title>\
             <link>https://road.example/blog/</link>{items}</channel></rss>"
        ))
    }

    const TRACK: ExtractOptions = ExtractOptions { track_domain: true };

    #[test]
    fn empty_feed_is_skipped_silently() {
        let out = extract(&rss(""), TRACK, now());
        assert!(out.article.is_none());
        assert!(out.errors.is_empty());
    }

    #[test]
    fn takes_first_entry() {
        let out = extract(
            &rss("<item><title>Newest</title><link>https://road.example/new</link>\
                  <pubDate>Fri, 26 Jul 2024 10:00:00 +0000</pubDate></item>\
                  <item><title>Older</title><link>https://road.example/old</link>\
                  <pubDate>Sat, 27 Jul 2024 10:00:00 +0000</pubDate></item>"),
            TRACK,
            now(),
        );
        assert!(out.errors.is_empty());
        let article = out.article.unwrap();
        assert_eq!(article.source_name, "Road Notes");
        assert_eq!(article.title, "Newest");
        assert_eq!(article.link, "https://road.example/new");
        assert_eq!(article.published_display, "July 26, 2024");
        assert_eq!(article.domain_name.as_deref(), Some("https://road.example"));
    }

    #[test]
    fn unreadable_time_falls_back_to_now() {
        let out = extract(
            &rss("<item><title>Undated</title><pubDate>soon</pubDate></item>"),
            TRACK,
            now(),
        );
        let article = out.article.unwrap();
        assert_eq!(article.published_display, format_display(&now()));
        assert_eq!(out.errors.len(), 1);
        assert!(matches!(&out.errors[0], FeedError::Timestamp { title } if title == "Undated"));
    }

    #[test]
    fn falls_back_to_updated() {
        let atom = "<feed xmlns=\"http://www.w3.org/2005/Atom\"><title>Atom Blog</title>\
            <link href=\"https://atom.example/feed.xml\" rel=\"self\"/>\
            <link href=\"https://atom.example/\" rel=\"alternate\"/>\
            <id>urn:atom</id><updated>2024-07-26T00:00:00Z</updated>\
            <entry><title>Only updated</title><id>urn:1</id>\
            <link href=\"https://atom.example/1\" rel=\"alternate\"/>\
            <updated>2024-01-05T08:00:00+08:00</updated></entry></feed>";
        let out = extract(&feed(atom), TRACK, now());
        assert!(out.errors.is_empty(), "{:?}", out.errors);
        let article = out.article.unwrap();
        assert_eq!(article.published_display, "January 5, 2024");
        assert_eq!(article.link, "https://atom.example/1");
        assert_eq!(article.domain_name.as_deref(), Some("https://atom.example"));
    }

    #[test]
    fn missing_site_link_is_unknown_domain() {
        let xml = "<rss version=\"2.0\"><channel><title>No Link</title>\
            <item><title>Post</title><pubDate>Fri, 26 Jul 2024 10:00:00 GMT</pubDate></item>\
            </channel></rss>";
        let out = extract(&feed(xml), TRACK, now());
        assert_eq!(
            out.article.unwrap().domain_name.as_deref(),
            Some(UNKNOWN_DOMAIN)
        );
        assert_eq!(out.errors.len(), 1);
        assert!(matches!(out.errors[0], FeedError::Domain { .. }));
    }

    #[test]
    fn domain_tracking_off() {
        let xml = "<rss version=\"2.0\"><channel><title>No Link</title>\
            <item><title>Post</title><pubDate>Fri, 26 Jul 2024 10:00:00 GMT</pubDate></item>\
            </channel></rss>";
        let out = extract(&feed(xml), ExtractOptions::default(), now());
        assert!(out.errors.is_empty());
        assert_eq!(out.article.unwrap().domain_name, None);
    }

    #[test]
    fn domain_shapes() {
        assert_eq!(
            extract_domain("https://www.Example.com/blog?x=1").unwrap(),
            "https://www.example.com"
        );
        assert_eq!(
            extract_domain("http://example.com:8080/").unwrap(),
            "http://example.com"
        );
        assert_eq!(
            extract_domain("example.com/blog").unwrap(),
            "https://example.com"
        );
        assert!(extract_domain("").is_err());
        assert!(extract_domain("mailto:me@example.com").is_err());
    }
}
