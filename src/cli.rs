//! Command-line interface definitions for News Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every credential and delivery option can also be provided through an
//! environment variable (or a `.env` file, loaded before parsing).

use crate::models::Category;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the News Digest application.
///
/// Values given here override anything read from the `--config` file.
///
/// # Examples
///
/// ```sh
/// # Fetch, summarize and email with credentials from the environment
/// news_digest
///
/// # Only technology and science, printed instead of sent
/// news_digest --categories technology,science --dry-run
///
/// # Use the built-in sample articles and keep a JSON copy of the digest
/// news_digest --fallback --preview-json ./previews
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// NewsData.io API key
    #[arg(long, env = "NEWSDATA_API_KEY", hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Gemini API key; the extractive summarizer is used without it
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// SMTP submission host
    #[arg(long, env = "EMAIL_HOST")]
    pub email_host: Option<String>,

    /// SMTP submission port
    #[arg(long, env = "EMAIL_PORT")]
    pub email_port: Option<u16>,

    /// SMTP login, also used as the sender address
    #[arg(long, env = "EMAIL_USER")]
    pub email_user: Option<String>,

    /// SMTP password (for Gmail, an app password)
    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    pub email_password: Option<String>,

    /// Address the digest is sent to
    #[arg(short, long, env = "RECIPIENT_EMAIL")]
    pub recipient: Option<String>,

    /// Comma-separated categories to fetch
    #[arg(long, env = "DIGEST_CATEGORIES", value_enum, value_delimiter = ',')]
    pub categories: Option<Vec<Category>>,

    /// Articles requested per category
    #[arg(short = 'n', long, env = "ARTICLES_PER_CATEGORY")]
    pub articles_per_category: Option<usize>,

    /// Skip the news API and use the built-in sample articles
    #[arg(long)]
    pub fallback: bool,

    /// Print the digest to stdout instead of emailing it
    #[arg(long)]
    pub dry_run: bool,

    /// Directory to write the summarized digest to as JSON
    #[arg(long)]
    pub preview_json: Option<String>,
}

impl Cli {
    /// Accept `NEWS_API_KEY` as a second name for the NewsData key.
    pub fn resolve_aliases(mut self) -> Self {
        if self.news_api_key.is_none() {
            self.news_api_key = std::env::var("NEWS_API_KEY").ok();
        }
        self
    }
}
