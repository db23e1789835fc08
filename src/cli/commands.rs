//! CLI commands and argument parsing

use crate::types::PaginationMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental feed loader CLI
#[derive(Parser, Debug)]
#[command(name = "feedpager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Loader configuration file (YAML, or JSON by extension)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Page through an HTTP feed by simulated scrolling
    Fetch(FetchArgs),

    /// Print the effective loader configuration
    Config,
}

/// Arguments for `fetch`
#[derive(clap::Args, Debug, Clone)]
pub struct FetchArgs {
    /// Feed endpoint
    #[arg(long)]
    pub url: String,

    /// Pagination mode (overrides the config file)
    #[arg(long)]
    pub mode: Option<PaginationMode>,

    /// Maximum pages to load
    #[arg(long, default_value = "10")]
    pub pages: usize,

    /// Dot path to the records array
    #[arg(long)]
    pub records_path: Option<String>,

    /// Dot path to the next cursor
    #[arg(long)]
    pub cursor_path: Option<String>,

    /// Query parameter carrying the cursor
    #[arg(long, default_value = "cursor")]
    pub cursor_param: String,

    /// Query parameter carrying the page number
    #[arg(long, default_value = "page")]
    pub page_param: String,

    /// Minimum interval between fetches in milliseconds (overrides the config file)
    #[arg(long)]
    pub rate_limit_ms: Option<u64>,

    /// Extra request header, `NAME=VALUE` (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Probe this URL for connectivity instead of assuming online
    #[arg(long)]
    pub probe_url: Option<String>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
