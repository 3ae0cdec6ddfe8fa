use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time::parse_display;

/// Latest post of one feed, as published in the JSON artifact.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Article {
    /// `scheme://host` of the feed's site; only set when domain tracking is on
    #[serde(
        rename = "domainName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub domain_name: Option<String>,
    #[serde(rename = "name")]
    pub source_name: String,
    pub title: String,
    pub link: String,
    #[serde(rename = "date")]
    pub published_display: String,
}

impl Article {
    /// Day the article is sorted on. Unreadable dates sort last.
    pub fn published_on(&self) -> NaiveDate {
        parse_display(&self.published_display).unwrap_or(NaiveDate::MIN)
    }
}

/// Newest first. Articles from the same day keep feed-list order.
pub fn aggregate(mut articles: Vec<Article>) -> Vec<Article> {
    articles.sort_by_key(|a| Reverse(a.published_on()));
    articles
}
