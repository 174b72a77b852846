//! NewsData.io latest-news client.
//!
//! Fetches up to `size` English articles per category from the
//! [NewsData.io](https://newsdata.io) `/api/1/news` endpoint and normalizes
//! them into [`Article`]s.
//!
//! # Failure Policy
//!
//! Every expected failure (missing key, 401, 429, other HTTP errors, an API
//! `status` other than `"success"`, transport errors, malformed JSON) is a
//! [`FetchError`] scoped to one category. [`NewsFetcher::fetch_all_news`]
//! turns each of them into an empty list plus a diagnostic.

use crate::config::{NewsConfig, usable_secret};
use crate::models::{Article, Category, CategoryDigest};
use crate::sources::{CategoryFailure, FetchReport, NewsSource};
use crate::utils::{truncate_chars, truncate_for_log};
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use scraper::Html;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Characters of article content kept before the ellipsis.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// Why a category fetch produced no articles.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no usable NewsData.io API key configured")]
    MissingApiKey,
    #[error("401 Unauthorized: check the NewsData.io API key")]
    Unauthorized,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("HTTP {0}")]
    Http(StatusCode),
    #[error("API error: {0}")]
    Api(String),
    #[error("network error: {0}")]
    Network(reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

// The request URL carries the API key in its query string.
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.without_url())
    }
}

/// Top-level NewsData.io response envelope.
#[derive(Debug, Deserialize)]
struct NewsDataResponse {
    status: String,
    #[serde(default)]
    results: Option<NewsDataResults>,
    #[serde(default)]
    message: Option<String>,
}

/// `results` is an article array on success and an error object otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NewsDataResults {
    Articles(Vec<RawArticle>),
    Error {
        #[serde(default)]
        message: Option<String>,
    },
}

/// An article exactly as NewsData.io returns it; any field may be null.
#[derive(Debug, Default, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    source_id: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    category: Option<Vec<String>>,
}

/// Client for the NewsData.io API, configured once per run.
#[derive(Debug, Clone)]
pub struct NewsFetcher {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    categories: Vec<Category>,
    articles_per_category: usize,
}

impl NewsFetcher {
    /// Build a fetcher from configuration.
    ///
    /// A missing or placeholder key is logged here once; each fetch then
    /// short-circuits without touching the network.
    pub fn new(config: &NewsConfig) -> Result<Self, reqwest::Error> {
        let api_key = usable_secret(config.api_key.as_deref()).map(str::to_string);
        if api_key.is_none() {
            warn!("Invalid or missing NewsData.io API key; get one at https://newsdata.io/pricing");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            categories: config.categories.clone(),
            articles_per_category: config.articles_per_category,
        })
    }

    /// Fetch up to `max_results` articles for one category.
    #[instrument(level = "info", skip_all, fields(category = %category, max_results = max_results))]
    pub async fn fetch_news_by_category(
        &self,
        category: Category,
        max_results: usize,
    ) -> Result<Vec<Article>, FetchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(FetchError::MissingApiKey);
        };

        debug!(url = %self.base_url, "Requesting category news");
        let size = max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("apikey", api_key),
                ("category", category.as_str()),
                ("language", "en"),
                ("size", size.as_str()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(FetchError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimited),
            status if !status.is_success() => return Err(FetchError::Http(status)),
            _ => {}
        }

        let body = response.text().await?;
        let parsed: NewsDataResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(body = %truncate_for_log(&body, 300), "Unparseable NewsData response");
            e
        })?;

        if parsed.status != "success" {
            let message = match parsed.results {
                Some(NewsDataResults::Error { message: Some(m) }) => m,
                _ => parsed.message.unwrap_or_else(|| "Unknown error".to_string()),
            };
            return Err(FetchError::Api(message));
        }

        let raw = match parsed.results {
            Some(NewsDataResults::Articles(raw)) => raw,
            _ => Vec::new(),
        };
        info!(count = raw.len(), "Found category articles");
        Ok(process_articles(raw))
    }
}

impl NewsSource for NewsFetcher {
    #[instrument(level = "info", skip_all, fields(categories = self.categories.len()))]
    async fn fetch_all_news(&self) -> FetchReport {
        let per_category = self.articles_per_category;
        let outcomes: Vec<(Category, Result<Vec<Article>, FetchError>)> =
            stream::iter(self.categories.clone())
                .then(move |category| async move {
                    let result = self.fetch_news_by_category(category, per_category).await;
                    (category, result)
                })
                .collect()
                .await;

        let mut digest = CategoryDigest::new();
        let mut failures = Vec::new();
        for (category, result) in outcomes {
            match result {
                Ok(articles) => {
                    digest.insert(category, articles);
                }
                Err(e) => {
                    warn!(%category, error = %e, "Category fetch failed; continuing without it");
                    failures.push(CategoryFailure {
                        category,
                        message: e.to_string(),
                    });
                    digest.insert(category, Vec::new());
                }
            }
        }

        let report = FetchReport { digest, failures };
        info!(
            total = report.total(),
            failed = report.failures.len(),
            "Fetched news for all categories"
        );
        report
    }
}

/// Normalize raw API articles, dropping any without a title.
fn process_articles(raw: Vec<RawArticle>) -> Vec<Article> {
    raw.into_iter().filter_map(normalize_article).collect()
}

fn normalize_article(raw: RawArticle) -> Option<Article> {
    let title = raw.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return None;
    }

    let description = strip_markup(raw.description.as_deref().unwrap_or_default());
    let content = strip_markup(raw.content.as_deref().unwrap_or_default());

    Some(Article {
        title: title.to_string(),
        description: description.trim().to_string(),
        content: truncate_chars(content.trim(), MAX_CONTENT_CHARS),
        source: raw
            .source_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        url: raw.link.unwrap_or_default(),
        published_at: raw.pub_date.unwrap_or_default(),
        category: raw
            .category
            .and_then(|c| c.into_iter().next())
            .unwrap_or_else(|| "general".to_string()),
        summary: None,
    })
}

/// Reduce an HTML fragment to its text; plain text passes through untouched.
fn strip_markup(s: &str) -> String {
    if !s.contains('<') {
        return s.to_string();
    }
    let fragment = Html::parse_fragment(s);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String, api_key: Option<&str>) -> NewsConfig {
        NewsConfig {
            api_key: api_key.map(str::to_string),
            base_url,
            categories: vec![Category::Technology, Category::Science],
            articles_per_category: 3,
            timeout_secs: 5,
        }
    }

    fn raw(title: Option<&str>) -> RawArticle {
        RawArticle {
            title: title.map(str::to_string),
            ..RawArticle::default()
        }
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let article = normalize_article(raw(Some("  Headline  "))).unwrap();
        assert_eq!(article.title, "Headline");
        assert_eq!(article.source, "Unknown");
        assert_eq!(article.category, "general");
        assert_eq!(article.description, "");
        assert_eq!(article.content, "");
        assert_eq!(article.url, "");
        assert!(article.summary.is_none());
    }

    #[test]
    fn test_normalize_maps_source_fields() {
        let article = normalize_article(RawArticle {
            title: Some("Markets rally".to_string()),
            description: Some("  Stocks up.  ".to_string()),
            content: Some("Body".to_string()),
            source_id: Some("reuters".to_string()),
            link: Some("https://news.test/markets".to_string()),
            pub_date: Some("2024-01-15 08:00:00".to_string()),
            category: Some(vec!["business".to_string(), "top".to_string()]),
        })
        .unwrap();

        assert_eq!(article.description, "Stocks up.");
        assert_eq!(article.source, "reuters");
        assert_eq!(article.url, "https://news.test/markets");
        assert_eq!(article.published_at, "2024-01-15 08:00:00");
        assert_eq!(article.category, "business");
    }

    #[test]
    fn test_titleless_articles_are_dropped() {
        let articles = process_articles(vec![
            raw(None),
            raw(Some("")),
            raw(Some("   ")),
            raw(Some("Kept")),
        ]);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Kept");
    }

    #[test]
    fn test_long_content_is_truncated() {
        let mut article = raw(Some("Long"));
        article.content = Some("c".repeat(2500));
        let article = normalize_article(article).unwrap();

        assert_eq!(article.content.chars().count(), MAX_CONTENT_CHARS + 3);
        assert_eq!(&article.content[..MAX_CONTENT_CHARS], "c".repeat(1000));
        assert!(article.content.ends_with("..."));
    }

    #[test]
    fn test_content_at_limit_is_untouched() {
        let mut article = raw(Some("Exact"));
        article.content = Some("c".repeat(MAX_CONTENT_CHARS));
        let article = normalize_article(article).unwrap();
        assert_eq!(article.content.len(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("plain text"), "plain text");
        assert_eq!(
            strip_markup("<p>Rates <b>hold</b> steady</p>"),
            "Rates hold steady"
        );
    }

    #[test]
    fn test_results_error_object_parses() {
        let parsed: NewsDataResponse = serde_json::from_value(json!({
            "status": "error",
            "results": {"message": "API key is invalid", "code": "Unauthorized"}
        }))
        .unwrap();
        assert!(matches!(
            parsed.results,
            Some(NewsDataResults::Error { message: Some(_) })
        ));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/1/news"))
            .and(query_param("apikey", "pub_live_key_123"))
            .and(query_param("category", "technology"))
            .and(query_param("language", "en"))
            .and(query_param("size", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "totalResults": 2,
                "results": [
                    {
                        "title": "Chip sales climb",
                        "description": "Demand rises.",
                        "content": null,
                        "source_id": "techwire",
                        "link": "https://news.test/chips",
                        "pubDate": "2024-01-15 07:00:00",
                        "category": ["technology"]
                    },
                    {"title": null, "description": "orphan"}
                ]
            })))
            .mount(&server)
            .await;

        let fetcher = NewsFetcher::new(&config(
            format!("{}/api/1/news", server.uri()),
            Some("pub_live_key_123"),
        ))
        .unwrap();
        let articles = fetcher
            .fetch_news_by_category(Category::Technology, 3)
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Chip sales climb");
        assert_eq!(articles[0].source, "techwire");
        assert_eq!(articles[0].content, "");
    }

    #[tokio::test]
    async fn test_fetch_classifies_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("category", "technology"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("category", "science"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("category", "health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher =
            NewsFetcher::new(&config(server.uri(), Some("pub_live_key_123"))).unwrap();

        let err = fetcher
            .fetch_news_by_category(Category::Technology, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unauthorized));

        let err = fetcher
            .fetch_news_by_category(Category::Science, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::RateLimited));

        let err = fetcher
            .fetch_news_by_category(Category::Health, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Http(StatusCode::SERVICE_UNAVAILABLE)));
    }

    #[tokio::test]
    async fn test_fetch_api_reported_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "error",
                "results": {"message": "Daily limit reached", "code": "RateLimitExceeded"}
            })))
            .mount(&server)
            .await;

        let fetcher =
            NewsFetcher::new(&config(server.uri(), Some("pub_live_key_123"))).unwrap();
        let err = fetcher
            .fetch_news_by_category(Category::Business, 3)
            .await
            .unwrap_err();

        match err {
            FetchError::Api(message) => assert_eq!(message, "Daily limit reached"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let fetcher =
            NewsFetcher::new(&config(server.uri(), Some("pub_live_key_123"))).unwrap();
        let err = fetcher
            .fetch_news_by_category(Category::Business, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = NewsFetcher::new(&config(server.uri(), Some("your_api_key"))).unwrap();
        let report = fetcher.fetch_all_news().await;

        assert_eq!(report.total(), 0);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].message.contains("API key"));
        assert_eq!(report.digest.len(), 2);
        assert!(report.digest.values().all(Vec::is_empty));
    }

    #[tokio::test]
    async fn test_fetch_all_isolates_category_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("category", "technology"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "results": [
                    {"title": "One", "source_id": "a"},
                    {"title": "Two", "source_id": "b"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("category", "science"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let fetcher =
            NewsFetcher::new(&config(server.uri(), Some("pub_live_key_123"))).unwrap();
        let report = fetcher.fetch_all_news().await;

        assert_eq!(report.total(), 2);
        let titles: Vec<&str> = report.digest[&Category::Technology]
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(titles, vec!["One", "Two"]);
        assert!(report.digest[&Category::Science].is_empty());
        assert_eq!(
            report.failures,
            vec![CategoryFailure {
                category: Category::Science,
                message: "rate limit exceeded".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_network_failure_does_not_expose_api_key() {
        // Nothing listens on port 1.
        let fetcher = NewsFetcher::new(&config(
            "http://127.0.0.1:1/api/1/news".to_string(),
            Some("pub_live_key_123"),
        ))
        .unwrap();
        let report = fetcher.fetch_all_news().await;

        assert_eq!(report.failures.len(), 2);
        for failure in &report.failures {
            assert!(failure.message.starts_with("network error"), "{}", failure.message);
            assert!(!failure.message.contains("pub_live_key_123"), "{}", failure.message);
            assert!(!failure.message.contains("apikey="), "{}", failure.message);
        }
    }
}
