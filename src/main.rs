mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use feedroll::config;

use crate::commands::run_command;

/// Command-line arguments for feedroll
#[derive(Parser, Debug)]
#[command(name = "feedroll")]
#[command(about = "Publish the latest post of every feed in a blogroll as JSON")]
pub struct Cli {
    /// Config file (defaults to ~/.config/feedroll/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Cmd>,
}

/// Subcommands for feedroll
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Fetch all feeds and publish the result (default)
    Run,

    /// Fetch all feeds and print the result without writing anything
    Preview {
        /// Maximum number of articles to show
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,
    },

    /// Print the configured feed list
    Feeds,
}

fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    match std::env::var("FEEDROLL_LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = registry.with(fmt_layer.json().flatten_event(true)).try_init();
        }
        _ => {
            let _ = registry.with(fmt_layer.compact()).try_init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(cli.config.as_deref())?;

    run_command(cli, &cfg)
}
