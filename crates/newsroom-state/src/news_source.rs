//! News source contract and its HTTP client.

use crate::model::ArticleSource;
use crate::{StateError, StateResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

/// One article record as returned by the news source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticlesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

/// Fetches article lists.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_articles(&self, url: &str) -> StateResult<Vec<Article>>;
}

/// Top-headlines URL for a country and category.
pub fn headlines_url(base: &str, country: &str, category: &str) -> StateResult<Url> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .append_pair("country", country)
        .append_pair("category", category);
    Ok(url)
}

/// News API client. The key, when set, goes in the `X-Api-Key` header.
#[derive(Clone)]
pub struct NewsApiClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
}

impl NewsApiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn fetch_articles(&self, url: &str) -> StateResult<Vec<Article>> {
        let mut request = self.http_client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            error!("News source request failed: {} - {}", status, message);
            return Err(StateError::NewsSource { status, message });
        }

        let body: ArticlesResponse = response.json().await?;
        debug!(count = body.articles.len(), "Fetched articles");
        Ok(body.articles)
    }
}

impl std::fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("has_api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}
