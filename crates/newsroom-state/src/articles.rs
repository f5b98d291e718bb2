//! Article cache: headline list and the selected headline.

use crate::comments::{comments_collection, comments_from_snapshot, order_by_likes};
use crate::model::Headline;
use crate::news_source::headlines_url;
use crate::read_model::LoadingGuard;
use crate::subscriptions::SubscriptionKind;
use crate::{NewsroomStore, StateResult};
use document_store::{CollectionPath, DocumentPath};
use tracing::{debug, info, warn};
use url::Url;

pub(crate) fn headline_path(slug: &str) -> StateResult<DocumentPath> {
    Ok(CollectionPath::new("headlines")?.doc(slug)?)
}

impl NewsroomStore {
    /// News-source URL for a country and category.
    pub fn headlines_url(&self, country: &str, category: &str) -> StateResult<Url> {
        headlines_url(&self.inner.settings.news_api_url, country, category)
    }

    /// Fetch the headline list and replace the cached one.
    ///
    /// On failure the cached list is left as it was.
    pub async fn load_headlines(&self, source_url: &str) -> StateResult<Vec<Headline>> {
        let inner = &self.inner;
        let _loading = LoadingGuard::new(&inner.state);

        let articles = inner.news.fetch_articles(source_url).await.map_err(|e| {
            warn!(url = source_url, error = %e, "Failed to load headlines");
            e
        })?;

        let default_image = &inner.settings.default_image_url;
        let headlines: Vec<Headline> = articles
            .into_iter()
            .map(|article| Headline::from_article(article, default_image))
            .collect();

        inner.state.send_modify(|s| s.headlines = headlines.clone());
        info!(count = headlines.len(), "Headlines loaded");
        Ok(headlines)
    }

    /// Publish a cached headline as the current one without a remote call.
    pub fn select_headline(&self, slug: &str) -> Option<Headline> {
        let inner = &self.inner;
        let headline = inner
            .state
            .borrow()
            .headlines
            .iter()
            .find(|h| h.slug == slug)
            .cloned()?;

        inner.subscriptions.cancel_unless(SubscriptionKind::Comments, slug);
        inner.state.send_modify(|s| s.headline = Some(headline.clone()));
        Some(headline)
    }

    /// Load a stored headline with its comments, ranked by likes.
    ///
    /// A missing headline returns `Ok(None)` and leaves the selection alone.
    pub async fn load_headline(&self, slug: &str) -> StateResult<Option<Headline>> {
        let inner = &self.inner;
        let path = headline_path(slug)?;

        let Some(doc) = inner.documents.get(&path).await.map_err(|e| {
            warn!(slug, error = %e, "Failed to read headline");
            e
        })?
        else {
            debug!(slug, "Headline not stored");
            return Ok(None);
        };
        let mut headline: Headline = doc.decode()?;

        let snapshot = inner
            .documents
            .query(&comments_collection(slug)?, Some(&order_by_likes()))
            .await
            .map_err(|e| {
                warn!(slug, error = %e, "Failed to read comments");
                e
            })?;
        headline.comments = if snapshot.is_empty() {
            None
        } else {
            Some(comments_from_snapshot(slug, &snapshot))
        };

        inner.subscriptions.cancel_unless(SubscriptionKind::Comments, slug);
        inner.state.send_modify(|s| s.headline = Some(headline.clone()));
        debug!(slug, comments = snapshot.len(), "Headline loaded");
        Ok(Some(headline))
    }

    /// Persist a headline unless one with the same slug already exists.
    ///
    /// Returns whether the document was created. The existence check and the
    /// write are separate calls, so two concurrent saves may both write.
    pub async fn save_headline(&self, headline: &Headline) -> StateResult<bool> {
        let documents = &self.inner.documents;
        let path = headline_path(&headline.slug)?;

        if documents.get(&path).await?.is_some() {
            debug!(slug = %headline.slug, "Headline already stored");
            return Ok(false);
        }

        let body = serde_json::to_value(headline.without_comments())?;
        documents.set(&path, body).await.map_err(|e| {
            warn!(slug = %headline.slug, error = %e, "Failed to save headline");
            e
        })?;
        info!(slug = %headline.slug, "Headline saved");
        Ok(true)
    }

    /// Clear the current headline and stop watching its comments.
    pub fn close_headline(&self) {
        let inner = &self.inner;
        inner.subscriptions.cancel(SubscriptionKind::Comments);
        inner.state.send_modify(|s| s.headline = None);
    }
}
