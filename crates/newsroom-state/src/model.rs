//! Domain records as stored remotely and held in the read model.

use crate::news_source::Article;
use crate::slug::slugify;
use document_store::{Document, DocumentResult};
use newsroom_auth::gravatar_url;
use serde::{Deserialize, Serialize};

/// Publisher of an article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// A news headline, keyed by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headline {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "urlToImage", alias = "imageUrl", default)]
    pub image_url: String,
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(default)]
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Present only once the comment thread has been loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl Headline {
    /// Build a headline from a news-source record, slugging the title and
    /// substituting `default_image` for a missing image.
    pub fn from_article(article: Article, default_image: &str) -> Self {
        let image_url = article
            .url_to_image
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| default_image.to_string());

        Self {
            slug: slugify(&article.title),
            title: article.title,
            url: article.url,
            image_url,
            source: article.source,
            published_at: article.published_at,
            author: article.author,
            description: article.description,
            content: article.content,
            comments: None,
        }
    }

    /// Copy without the comment thread, as persisted under `headlines/{slug}`.
    pub fn without_comments(&self) -> Self {
        Self {
            comments: None,
            ..self.clone()
        }
    }
}

/// A comment on one headline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub author_ref: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl Comment {
    pub fn new(id: impl Into<String>, body: impl Into<String>, author_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            author_ref: author_ref.into(),
            likes: 0,
            published_at: None,
        }
    }
}

/// A signed-in reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub avatar: String,
}

impl User {
    /// User with a generated avatar.
    pub fn derive(email: &str) -> Self {
        Self {
            email: email.to_string(),
            avatar: gravatar_url(email),
        }
    }
}

/// A headline saved to a user's reading feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Headline title the entry is keyed by.
    pub key: String,
    pub headline: Headline,
}

impl FeedEntry {
    /// Document id for a feed key: the title itself, with only `%` and the
    /// path separator `/` escaped. Transport encoding is the store's job.
    pub fn document_id(key: &str) -> String {
        key.replace('%', "%25").replace('/', "%2F")
    }

    /// Inverse of [`FeedEntry::document_id`].
    pub fn key_from_document_id(id: &str) -> String {
        id.replace("%2F", "/").replace("%25", "%")
    }

    pub(crate) fn from_document(doc: &Document) -> DocumentResult<Self> {
        let headline: Headline = doc.decode()?;
        let key = Self::key_from_document_id(&doc.id);
        Ok(Self { key, headline })
    }
}
