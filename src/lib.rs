//! # feedroll
//!
//! Reads a list of RSS/Atom feeds, keeps the latest entry of each one, sorts
//! them newest first and publishes the result as a JSON array to an object
//! store. Problems with individual feeds are appended to an error log in the
//! same store and never stop the run.
//!
//! Pipeline, one feed at a time:
//! 1. **fetch** the body ([`fetch::FeedFetcher`])
//! 2. **sanitize** control characters and **parse** with feed-rs
//! 3. **extract** the latest entry into an [`article::Article`]
//! 4. **aggregate** by date, newest first
//! 5. **publish** with create-or-update semantics ([`store::upsert`])

pub mod article;
pub mod config;
pub mod error;
pub mod extract;
pub mod feeds;
pub mod fetch;
pub mod pipeline;
pub mod publish;
pub mod remote_log;
pub mod sanitize;
pub mod store;
pub mod time;
