//! Article summarization with a guaranteed local fallback.
//!
//! A [`Summarizer`] runs in one of two modes, chosen once by
//! [`Summarizer::initialize`]:
//!
//! - **Generative**: Gemini writes a 2-3 sentence summary. Any failure on a
//!   single call degrades that call to the extractive path.
//! - **Extractive**: the first few sentences of the cleaned text are kept.
//!
//! If initialization fails (no key, model listing failed, no compatible
//! model) the instance stays extractive for its whole lifetime.

use crate::api::GeminiClient;
use crate::config::{SummarizerConfig, usable_secret};
use crate::models::Article;
use crate::utils::{take_chars, truncate_chars};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Characters of cleaned text sent to the generative service.
pub const MAX_PROMPT_CHARS: usize = 4000;

/// Length kept when the text is too short to pick sentences from.
pub const SHORT_TEXT_CHARS: usize = 150;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("valid URL regex"));
static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,!?-]").expect("valid allowlist regex"));
static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("valid sentence regex"));

/// Which summarization path a [`Summarizer`] uses.
#[derive(Debug, Clone)]
pub enum SummaryMode {
    Generative { client: GeminiClient, model: String },
    Extractive,
}

/// Produces short synopses for articles. Never fails.
#[derive(Debug, Clone)]
pub struct Summarizer {
    mode: SummaryMode,
    max_sentences: usize,
}

impl Summarizer {
    /// A summarizer that only ever uses the local heuristic.
    pub fn extractive(max_sentences: usize) -> Self {
        Self {
            mode: SummaryMode::Extractive,
            max_sentences,
        }
    }

    /// Set up the generative backend if possible, else fall back to extractive.
    ///
    /// This is the only place the backend is probed; a failure here is final
    /// for this instance.
    #[instrument(level = "info", skip_all)]
    pub async fn initialize(config: &SummarizerConfig) -> Self {
        let Some(api_key) = usable_secret(config.api_key.as_deref()) else {
            info!("Gemini API key not found or is a placeholder; using extractive summaries");
            return Self::extractive(config.max_sentences);
        };

        let client = match GeminiClient::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.timeout_secs),
        ) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Gemini setup failed; using extractive summaries");
                return Self::extractive(config.max_sentences);
            }
        };

        let available = match client.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!(error = %e, "Error listing Gemini models; using extractive summaries");
                return Self::extractive(config.max_sentences);
            }
        };

        match select_model(&available, &config.preferred_models) {
            Some(model) => {
                info!(%model, "Gemini summarization initialized");
                Self {
                    mode: SummaryMode::Generative { client, model },
                    max_sentences: config.max_sentences,
                }
            }
            None => {
                warn!(
                    preferred = ?config.preferred_models,
                    "No compatible Gemini models found; using extractive summaries"
                );
                Self::extractive(config.max_sentences)
            }
        }
    }

    pub fn is_generative(&self) -> bool {
        matches!(self.mode, SummaryMode::Generative { .. })
    }

    /// Summarize raw text.
    pub async fn summarize(&self, text: &str) -> String {
        match &self.mode {
            SummaryMode::Generative { client, model } => {
                let cleaned = clean_text(text);
                let prompt = summary_prompt(take_chars(&cleaned, MAX_PROMPT_CHARS));
                match client.generate(model, &prompt).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!(error = %e, "Gemini summarization error; using extractive summary");
                        simple_summarize(text, self.max_sentences)
                    }
                }
            }
            SummaryMode::Extractive => simple_summarize(text, self.max_sentences),
        }
    }

    /// Summarize one article from its title, description and content.
    pub async fn summarize_article(&self, article: &mut Article) {
        let text = format!(
            "{}. {}. {}",
            article.title, article.description, article.content
        );
        article.summary = Some(self.summarize(&text).await);
    }

    /// Summarize every article in order, setting each `summary`.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn summarize_articles(&self, articles: &mut [Article]) {
        let total = articles.len();
        for (i, article) in articles.iter_mut().enumerate() {
            debug!(index = i + 1, total, title = %article.title, "Summarizing article");
            self.summarize_article(article).await;
        }
    }
}

fn summary_prompt(text: &str) -> String {
    format!("Create a concise 2-3 sentence summary of this news article:\n\n{text}\n\nSummary:")
}

/// Pick the first preferred model the service offers.
///
/// Listings use qualified names (`models/gemini-pro`); preferences may be
/// given either way.
fn select_model(available: &[String], preferred: &[String]) -> Option<String> {
    preferred.iter().find_map(|wanted| {
        let bare = wanted.trim_start_matches("models/");
        available
            .iter()
            .find(|name| name.trim_start_matches("models/") == bare)
            .cloned()
    })
}

/// Normalize text before summarizing.
///
/// Collapses whitespace, removes URLs, and drops every character other than
/// word characters, whitespace and `. , ! ? -`.
pub fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_urls = URL_RE.replace_all(&collapsed, "");
    let allowed = DISALLOWED_RE.replace_all(&without_urls, "");
    allowed.trim().to_string()
}

/// Extractive summary: the first `max_sentences` sentences of the cleaned text.
///
/// When the text has no more than `max_sentences` sentences it is returned
/// cleaned, cut to 150 characters plus `...` if longer.
pub fn simple_summarize(text: &str, max_sentences: usize) -> String {
    let cleaned = clean_text(text);
    let sentences: Vec<&str> = SENTENCE_END_RE
        .split(&cleaned)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.len() > max_sentences {
        format!("{}.", sentences[..max_sentences].join(". "))
    } else {
        truncate_chars(&cleaned, SHORT_TEXT_CHARS)
    }
}
