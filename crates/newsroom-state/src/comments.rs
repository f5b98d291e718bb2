//! Comment synchronization for the selected headline.

use crate::model::Comment;
use crate::read_model::{AppState, LoadingGuard};
use crate::store::StoreInner;
use crate::subscriptions::SubscriptionKind;
use crate::{NewsroomStore, StateError, StateResult};
use document_store::{CollectionPath, OrderBy, QuerySnapshot, SnapshotStream};
use serde_json::{Map, Value};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub(crate) fn comments_collection(slug: &str) -> StateResult<CollectionPath> {
    Ok(CollectionPath::new("headlines")?
        .doc(slug)?
        .collection("comments")?)
}

pub(crate) fn order_by_likes() -> OrderBy {
    OrderBy::desc("likes")
}

/// Decode a ranked snapshot. Documents that do not decode are skipped.
pub(crate) fn comments_from_snapshot(slug: &str, snapshot: &QuerySnapshot) -> Vec<Comment> {
    snapshot
        .iter()
        .filter_map(|doc| match doc.decode::<Comment>() {
            Ok(mut comment) => {
                if comment.id.is_empty() {
                    comment.id = doc.id.clone();
                }
                Some(comment)
            }
            Err(e) => {
                warn!(slug, id = %doc.id, error = %e, "Skipping malformed comment");
                None
            }
        })
        .collect()
}

/// Replace the selected headline's comments if it is still `slug`.
fn publish_comments(state: &watch::Sender<AppState>, slug: &str, comments: Vec<Comment>) -> bool {
    state.send_if_modified(|s| match s.headline.as_mut() {
        Some(headline) if headline.slug == slug => {
            headline.comments = Some(comments);
            true
        }
        _ => false,
    })
}

async fn run_comment_subscription(store: Weak<StoreInner>, slug: String, mut stream: SnapshotStream) {
    while let Some(snapshot) = stream.next().await {
        let Some(inner) = store.upgrade() else {
            break;
        };
        let comments = comments_from_snapshot(&slug, &snapshot);
        let count = comments.len();
        if publish_comments(&inner.state, &slug, comments) {
            debug!(slug = %slug, count, "Comment snapshot applied");
        } else {
            debug!(slug = %slug, "Comment snapshot for unselected headline ignored");
        }
    }
    debug!(slug = %slug, "Comment subscription ended");
}

impl NewsroomStore {
    fn current_slug(&self) -> StateResult<String> {
        self.inner
            .state
            .borrow()
            .headline_slug()
            .map(str::to_string)
            .ok_or(StateError::NoHeadlineSelected)
    }

    /// Upsert a comment on the current headline, then republish the ranked
    /// thread.
    pub async fn send_comment(&self, comment: &Comment) -> StateResult<Vec<Comment>> {
        let slug = self.current_slug()?;
        let inner = &self.inner;
        let _loading = LoadingGuard::new(&inner.state);

        let collection = comments_collection(&slug)?;
        let path = collection.doc(comment.id.as_str())?;
        inner
            .documents
            .set(&path, serde_json::to_value(comment)?)
            .await
            .map_err(|e| {
                warn!(slug = %slug, id = %comment.id, error = %e, "Failed to send comment");
                e
            })?;

        let snapshot = inner
            .documents
            .query(&collection, Some(&order_by_likes()))
            .await?;
        let comments = comments_from_snapshot(&slug, &snapshot);
        publish_comments(&inner.state, &slug, comments.clone());

        info!(slug = %slug, id = %comment.id, "Comment sent");
        Ok(comments)
    }

    /// Add one like to a comment on the current headline and re-arm the
    /// ranked comment subscription.
    ///
    /// Returns the new count, or `None` if the comment does not exist. The
    /// read and the write are separate calls, so concurrent likes can be lost.
    pub async fn like_comment(&self, comment_id: &str) -> StateResult<Option<u64>> {
        let slug = self.current_slug()?;
        let documents = &self.inner.documents;
        let path = comments_collection(&slug)?.doc(comment_id)?;

        let likes = match documents.get(&path).await? {
            Some(doc) => {
                let likes = doc.get("likes").and_then(Value::as_u64).unwrap_or(0) + 1;
                let mut fields = Map::new();
                fields.insert("likes".to_string(), Value::from(likes));
                documents.update(&path, fields).await.map_err(|e| {
                    warn!(slug = %slug, id = comment_id, error = %e, "Failed to like comment");
                    e
                })?;
                debug!(slug = %slug, id = comment_id, likes, "Comment liked");
                Some(likes)
            }
            None => {
                debug!(slug = %slug, id = comment_id, "Liked comment does not exist");
                None
            }
        };

        self.watch_comments(&slug).await?;
        Ok(likes)
    }

    /// Arm the live comment subscription for `slug`.
    ///
    /// Each snapshot replaces the selected headline's comments, provided the
    /// selection is still `slug`.
    pub async fn watch_comments(&self, slug: &str) -> StateResult<()> {
        let inner = &self.inner;
        let stream = inner
            .documents
            .subscribe(&comments_collection(slug)?, Some(order_by_likes()))
            .await
            .map_err(|e| {
                warn!(slug, error = %e, "Failed to subscribe to comments");
                e
            })?;

        let task = tokio::spawn(run_comment_subscription(
            Arc::downgrade(inner),
            slug.to_string(),
            stream,
        ));
        inner.subscriptions.arm(SubscriptionKind::Comments, slug, task);
        Ok(())
    }
}
