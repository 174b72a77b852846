//! The digest run: fetch, summarize, compose, send.
//!
//! ```text
//! START → FETCH → (CHECK_EMPTY → FALLBACK?) → SUMMARIZE → COMPOSE → SEND → END
//! ```
//!
//! Each stage hands an explicit result to the next. Fetch and summarization
//! problems never end a run; only an empty digest (even after substituting
//! the built-in fallback set), a missing recipient, or a delivery failure do.

use crate::delivery::{DeliveryError, DigestSender};
use crate::models::{CategoryDigest, DigestMessage, total_articles};
use crate::outputs::digest::compose_digest;
use crate::sources::{CategoryFailure, NewsSource, fallback_news};
use crate::summarizer::Summarizer;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// Why a run ended without delivering a digest.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no articles available from API or fallback")]
    NoArticles,
    #[error("no recipient email address configured")]
    MissingRecipient,
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// A summarized, composed digest that has not been sent yet.
#[derive(Debug, Clone)]
pub struct PreparedDigest {
    /// Non-empty categories with every article summarized.
    pub digest: CategoryDigest,
    pub message: DigestMessage,
    /// Whether the built-in fallback articles replaced live news.
    pub used_fallback: bool,
    /// Categories that failed to fetch, with diagnostics.
    pub fetch_failures: Vec<CategoryFailure>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub prepared: PreparedDigest,
    /// Acknowledgment text from delivery.
    pub delivery: String,
}

/// Runs the digest pipeline against one news source and one sender.
pub struct DigestBot<N, M> {
    news: N,
    summarizer: Summarizer,
    mailer: M,
    recipient: Option<String>,
    fallback: fn() -> CategoryDigest,
}

impl<N, M> DigestBot<N, M>
where
    N: NewsSource,
    M: DigestSender,
{
    pub fn new(news: N, summarizer: Summarizer, mailer: M, recipient: Option<String>) -> Self {
        Self {
            news,
            summarizer,
            mailer,
            recipient,
            fallback: fallback_news,
        }
    }

    /// Fetch (or substitute), summarize and compose, without sending.
    ///
    /// With `use_fallback` the news source is skipped entirely.
    #[instrument(level = "info", skip(self))]
    pub async fn prepare_digest(
        &self,
        use_fallback: bool,
        date: NaiveDate,
    ) -> Result<PreparedDigest, RunError> {
        let (mut news, fetch_failures) = if use_fallback {
            warn!("Using fallback news data");
            ((self.fallback)(), Vec::new())
        } else {
            info!("Fetching news from all categories");
            let report = self.news.fetch_all_news().await;
            (report.digest, report.failures)
        };

        let mut used_fallback = use_fallback;
        let mut total = total_articles(&news);
        if total == 0 && !use_fallback {
            warn!("No articles fetched from API; trying fallback data");
            news = (self.fallback)();
            total = total_articles(&news);
            used_fallback = true;
        }
        if total == 0 {
            error!("No articles available from API or fallback");
            return Err(RunError::NoArticles);
        }

        info!(total, "Summarizing articles");
        let mut summarized = CategoryDigest::new();
        for (category, mut articles) in news.into_iter().filter(|(_, a)| !a.is_empty()) {
            self.summarizer.summarize_articles(&mut articles).await;
            info!(%category, count = articles.len(), "Summarized category");
            summarized.insert(category, articles);
        }

        let message = compose_digest(&summarized, date);
        Ok(PreparedDigest {
            digest: summarized,
            message,
            used_fallback,
            fetch_failures,
        })
    }

    /// Run the whole pipeline and deliver the digest.
    #[instrument(level = "info", skip(self))]
    pub async fn run_digest(
        &self,
        use_fallback: bool,
        date: NaiveDate,
    ) -> Result<RunReport, RunError> {
        info!("Starting news digest run");
        let recipient = self
            .recipient
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(RunError::MissingRecipient)?;

        let prepared = self.prepare_digest(use_fallback, date).await?;

        info!(to = %recipient, "Sending email digest");
        let delivery = self.mailer.send(&prepared.message, recipient).await?;
        info!("Digest run completed successfully");
        Ok(RunReport { prepared, delivery })
    }
}
