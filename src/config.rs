//! Runtime configuration assembled once at startup.
//!
//! Values are layered from lowest to highest precedence:
//!
//! 1. Built-in defaults (Gmail SMTP, five categories, three articles each)
//! 2. An optional YAML file passed with `--config`
//! 3. Environment variables and command-line flags (see [`crate::cli::Cli`])
//!
//! Credentials that are missing or still hold a placeholder value are not
//! errors: the component that needs them degrades instead (see [`usable_secret`]).
//!
//! # Example file
//!
//! ```yaml
//! news:
//!   categories: [technology, science]
//!   articles_per_category: 5
//! summarizer:
//!   preferred_models: [gemini-1.5-flash]
//! mail:
//!   host: smtp.example.org
//!   port: 587
//!   recipient: reader@example.org
//! ```

use crate::cli::Cli;
use crate::models::Category;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// NewsData.io latest-news endpoint.
pub const DEFAULT_NEWS_URL: &str = "https://newsdata.io/api/1/news";

/// Gemini REST API root.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default SMTP submission host.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Articles requested per category unless configured otherwise.
pub const DEFAULT_ARTICLES_PER_CATEGORY: usize = 3;

/// Timeout applied to every outbound call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Sentences kept by the extractive summarizer.
pub const DEFAULT_MAX_SENTENCES: usize = 2;

/// Gemini models tried in order during summarizer initialization.
pub const DEFAULT_PREFERRED_MODELS: &[&str] = &["gemini-1.5-flash", "gemini-pro", "gemini-1.0-pro"];

/// Errors that prevent a configuration from being assembled.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration, one section per component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub news: NewsConfig,
    pub summarizer: SummarizerConfig,
    pub mail: MailConfig,
}

/// Settings for the NewsData.io fetcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub categories: Vec<Category>,
    pub articles_per_category: usize,
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_NEWS_URL.to_string(),
            categories: Category::defaults(),
            articles_per_category: DEFAULT_ARTICLES_PER_CATEGORY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Settings for the summarizer and its optional Gemini backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub preferred_models: Vec<String>,
    pub max_sentences: usize,
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_URL.to_string(),
            preferred_models: DEFAULT_PREFERRED_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            max_sentences: DEFAULT_MAX_SENTENCES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Settings for SMTP delivery.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub recipient: Option<String>,
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMTP_HOST.to_string(),
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            recipient: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Return the trimmed value unless it is blank or a `your_...` template value.
pub fn configured_value(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    if value.is_empty() || value.starts_with("your_") {
        None
    } else {
        Some(value)
    }
}

/// Return the trimmed API key if it looks like a real credential.
///
/// On top of [`configured_value`], keys containing `example` are sample
/// values copied from documentation.
pub fn usable_secret(value: Option<&str>) -> Option<&str> {
    configured_value(value).filter(|v| !v.to_ascii_lowercase().contains("example"))
}

impl AppConfig {
    /// Load configuration from an optional YAML file, falling back to defaults.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration file");
        Ok(config)
    }

    /// Parse configuration from YAML text; missing keys take their defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Build the final configuration: file (if any) overlaid with CLI/env values.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::load(cli.config.as_deref())?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Overlay every value the CLI (or its environment fallbacks) supplied.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(key) = &cli.news_api_key {
            self.news.api_key = Some(key.clone());
        }
        if let Some(categories) = &cli.categories {
            self.news.categories = categories.clone();
        }
        if let Some(count) = cli.articles_per_category {
            self.news.articles_per_category = count;
        }
        if let Some(key) = &cli.gemini_api_key {
            self.summarizer.api_key = Some(key.clone());
        }
        if let Some(host) = &cli.email_host {
            self.mail.host = host.clone();
        }
        if let Some(port) = cli.email_port {
            self.mail.port = port;
        }
        if let Some(user) = &cli.email_user {
            self.mail.username = Some(user.clone());
        }
        if let Some(password) = &cli.email_password {
            self.mail.password = Some(password.clone());
        }
        if let Some(recipient) = &cli.recipient {
            self.mail.recipient = Some(recipient.clone());
        }

        let mut seen = Vec::with_capacity(self.news.categories.len());
        self.news.categories.retain(|c| {
            if seen.contains(c) {
                false
            } else {
                seen.push(*c);
                true
            }
        });
    }

    /// Reject values no component could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.news.categories.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one news category is required".to_string(),
            ));
        }
        if self.news.articles_per_category == 0 {
            return Err(ConfigError::Invalid(
                "articles_per_category must be at least 1".to_string(),
            ));
        }
        if self.summarizer.max_sentences == 0 {
            return Err(ConfigError::Invalid(
                "summarizer.max_sentences must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.news.base_url)
            .map_err(|e| ConfigError::Invalid(format!("news.base_url: {e}")))?;
        url::Url::parse(&self.summarizer.base_url)
            .map_err(|e| ConfigError::Invalid(format!("summarizer.base_url: {e}")))?;
        Ok(())
    }
}
