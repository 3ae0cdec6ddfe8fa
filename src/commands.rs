use std::io::{self, Write};

use anyhow::{Context, Result};
use colored::Colorize;

use feedroll::article::Article;
use feedroll::config::{Config, FeedSource};
use feedroll::feeds::{FeedList, FileFeedList, StoreFeedList};
use feedroll::fetch::HttpFetcher;
use feedroll::pipeline::{self, RunSummary, collect_articles};
use feedroll::store::{ObjectStore, open_store};
use feedroll::time::Clock;

use tracing::warn;

use crate::{Cli, Cmd};

const CLOSING_MESSAGE: &str = "Done. Go ride a bike.";

pub fn run_command(cli: Cli, cfg: &Config) -> Result<()> {
    match cli.command {
        Some(Cmd::Preview { limit }) => {
            cmd_preview(cfg, limit)?;
        }
        Some(Cmd::Feeds) => {
            cmd_feeds(cfg)?;
        }
        Some(Cmd::Run) | None => {
            // default: full run with publishing
            cmd_run(cfg)?;
        }
    }

    Ok(())
}

fn open_configured_store(cfg: &Config) -> Result<Box<dyn ObjectStore>> {
    open_store(&cfg.store, &cfg.user_agent, cfg.store_timeout)
        .context("Failed to set up object store")
}

fn configured_feed_list<'a>(cfg: &Config, store: &'a dyn ObjectStore) -> Box<dyn FeedList + 'a> {
    match &cfg.feeds {
        FeedSource::File(path) => Box::new(FileFeedList::new(path)),
        FeedSource::Object(path) => Box::new(StoreFeedList::new(store, path.as_str())),
    }
}

fn build_fetcher(cfg: &Config) -> Result<HttpFetcher> {
    HttpFetcher::new(&cfg.user_agent, cfg.fetch_timeout).context("Failed to build HTTP client")
}

/// Fetch every feed, publish the aggregate and append errors to the remote log
fn cmd_run(cfg: &Config) -> Result<()> {
    let store = open_configured_store(cfg)?;
    let feeds = configured_feed_list(cfg, store.as_ref());
    let fetcher = build_fetcher(cfg)?;

    let summary = pipeline::run(
        store.as_ref(),
        feeds.as_ref(),
        &fetcher,
        &cfg.run_settings(),
        Clock::local(cfg.log_offset_hours),
    )?;

    report_run(&summary, &cfg.error_log_path, &mut io::stdout().lock())?;
    Ok(())
}

/// Counts go to the log; stdout only gets the closing line.
fn report_run(summary: &RunSummary, error_log_path: &str, out: &mut impl Write) -> io::Result<()> {
    if summary.errors > 0 {
        warn!(errors = summary.errors, log = error_log_path, "feed errors appended to log");
    }
    writeln!(out, "{CLOSING_MESSAGE}")
}

/// Print one article in pipe-friendly format
fn print_article_line(article: &Article) {
    let source = match &article.domain_name {
        Some(domain) => format!("{} ({})", article.source_name, domain),
        None => article.source_name.clone(),
    };

    println!(
        "{} | {} | {} | {}",
        article.published_display,
        source,
        article.title.bold(),
        article.link.blue()
    );
}

/// Same collection as `run`, but nothing leaves the terminal
fn cmd_preview(cfg: &Config, limit: Option<usize>) -> Result<()> {
    let store = open_configured_store(cfg)?;
    let urls = configured_feed_list(cfg, store.as_ref())
        .list_feeds()
        .context("Failed to read feed list")?;
    let fetcher = build_fetcher(cfg)?;
    let clock = Clock::local(cfg.log_offset_hours);

    let mut failing = 0;
    let articles = collect_articles(
        &fetcher,
        &urls,
        cfg.run_settings().extract,
        &clock,
        |err| {
            failing += 1;
            eprintln!("{} {}", format!("[{}]", err.stage()).red(), err);
        },
    );

    for article in articles.iter().take(limit.unwrap_or(usize::MAX)) {
        print_article_line(article);
    }

    if failing > 0 {
        eprintln!();
        eprintln!("Warning: {failing} error(s) while reading feeds.");
    }
    Ok(())
}

/// List configured feed URLs
fn cmd_feeds(cfg: &Config) -> Result<()> {
    let store = open_configured_store(cfg)?;
    let urls = configured_feed_list(cfg, store.as_ref())
        .list_feeds()
        .context("Failed to read feed list")?;

    if urls.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    for (i, url) in urls.iter().enumerate() {
        if url.is_empty() {
            println!("{:>3} | {}", i + 1, "(blank line)".dimmed());
        } else {
            println!("{:>3} | {}", i + 1, url);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closing_line_does_not_depend_on_the_run() {
        let mut quiet = Vec::new();
        report_run(&RunSummary::default(), "api/error.log", &mut quiet).unwrap();

        let busy = RunSummary {
            feeds: 40,
            articles: 31,
            errors: 9,
        };
        let mut noisy = Vec::new();
        report_run(&busy, "api/error.log", &mut noisy).unwrap();

        assert_eq!(quiet, noisy);
        assert_eq!(String::from_utf8(quiet).unwrap(), format!("{CLOSING_MESSAGE}\n"));
    }
}
