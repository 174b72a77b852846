//! # News Digest
//!
//! Fetches the latest articles for a handful of news categories, condenses
//! each into a short summary, and emails the result as a plain-text digest.
//!
//! ## Features
//!
//! - Fetches categorized English news from the NewsData.io API
//! - Summarizes with Gemini when a key is configured, otherwise with a local
//!   extractive heuristic
//! - Falls back to a small built-in article set when no live news arrives
//! - Delivers over authenticated SMTP (Gmail by default)
//! - Optional dry run and JSON preview of the summarized digest
//!
//! ## Usage
//!
//! ```sh
//! NEWSDATA_API_KEY=... EMAIL_USER=... EMAIL_PASSWORD=... RECIPIENT_EMAIL=... news_digest
//! news_digest --dry-run --categories technology,science
//! ```
//!
//! ## Architecture
//!
//! The application is a linear pipeline, run once per invocation:
//! 1. **Fetching**: One request per category, failures reduce that category to nothing
//! 2. **Fallback**: Built-in articles replace an entirely empty result
//! 3. **Summarizing**: Every article gets a 2-3 sentence synopsis
//! 4. **Composing**: Categories and articles are rendered into the email body
//! 5. **Sending**: One SMTP submission to the configured recipient
//!
//! Scheduling (e.g. a daily cron entry) is left to the host.

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod delivery;
mod models;
mod outputs;
mod pipeline;
mod sources;
mod summarizer;
mod utils;

use cli::Cli;
use config::AppConfig;
use delivery::DigestMailer;
use outputs::json;
use pipeline::{DigestBot, PreparedDigest};
use sources::newsdata::NewsFetcher;
use summarizer::Summarizer;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // .env first so RUST_LOG and credentials from it are visible below
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!(error = %e, "Failed to load .env file"),
    }

    // Parse CLI and assemble configuration
    let args = Cli::parse().resolve_aliases();
    let config = AppConfig::from_cli(&args)?;
    debug!(
        categories = ?config.news.categories,
        articles_per_category = config.news.articles_per_category,
        smtp_host = %config.mail.host,
        smtp_port = config.mail.port,
        "Configuration assembled"
    );

    let today = Local::now().date_naive();

    // ---- Build components ----
    let fetcher = NewsFetcher::new(&config.news)?;
    let summarizer = Summarizer::initialize(&config.summarizer).await;
    info!(generative = summarizer.is_generative(), "Summarizer ready");
    let mailer = DigestMailer::new(config.mail.clone());
    if !mailer.is_configured() && !args.dry_run {
        warn!("Email credentials not configured; the digest cannot be sent");
    }
    let bot = DigestBot::new(fetcher, summarizer, mailer, config.mail.recipient.clone());

    // ---- Run ----
    let outcome: Result<PreparedDigest, pipeline::RunError> = if args.dry_run {
        bot.prepare_digest(args.fallback, today).await.inspect(|prepared| {
            println!("Subject: {}\n\n{}", prepared.message.subject, prepared.message.body);
        })
    } else {
        bot.run_digest(args.fallback, today).await.map(|report| {
            info!(delivery = %report.delivery, "Digest delivered");
            report.prepared
        })
    };

    let prepared = match outcome {
        Ok(prepared) => prepared,
        Err(e) => {
            error!(error = %e, elapsed_ms = start_time.elapsed().as_millis() as u64, "Digest run failed");
            return Ok(ExitCode::FAILURE);
        }
    };

    for failure in &prepared.fetch_failures {
        warn!(category = %failure.category, reason = %failure.message, "Category was skipped");
    }

    // ---- JSON preview ----
    if let Some(dir) = &args.preview_json {
        if let Err(e) = json::write_digest_preview(&prepared.digest, dir, today).await {
            error!(path = %dir, error = %e, "Failed to write digest preview");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        used_fallback = prepared.used_fallback,
        articles = models::total_articles(&prepared.digest),
        "Execution complete"
    );

    Ok(ExitCode::SUCCESS)
}
