//! Per-user reading feed.

use crate::model::{FeedEntry, Headline, User};
use crate::store::StoreInner;
use crate::subscriptions::SubscriptionKind;
use crate::{NewsroomStore, StateError, StateResult};
use document_store::{CollectionPath, QuerySnapshot, SnapshotStream};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

pub(crate) fn feed_collection(email: &str) -> StateResult<CollectionPath> {
    Ok(CollectionPath::new("users")?.doc(email)?.collection("feed")?)
}

fn entries_from_snapshot(email: &str, snapshot: &QuerySnapshot) -> Vec<FeedEntry> {
    snapshot
        .iter()
        .filter_map(|doc| match FeedEntry::from_document(doc) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(user = email, id = %doc.id, error = %e, "Skipping malformed feed entry");
                None
            }
        })
        .collect()
}

async fn run_feed_subscription(store: Weak<StoreInner>, email: String, mut stream: SnapshotStream) {
    while let Some(snapshot) = stream.next().await {
        let Some(inner) = store.upgrade() else {
            break;
        };
        let entries = entries_from_snapshot(&email, &snapshot);
        let count = entries.len();
        let applied = inner.state.send_if_modified(|s| {
            let current = s.user.as_ref().is_some_and(|u| u.email == email);
            if current {
                s.feed = entries;
            }
            current
        });
        debug!(user = %email, count, applied, "Feed snapshot received");
    }
    debug!(user = %email, "Feed subscription ended");
}

impl NewsroomStore {
    fn current_user(&self) -> StateResult<User> {
        self.inner
            .state
            .borrow()
            .user
            .clone()
            .ok_or(StateError::NotLoggedIn)
    }

    /// Arm the live feed subscription for the signed-in user. No-op when
    /// signed out.
    pub async fn load_user_feed(&self) -> StateResult<()> {
        let Ok(user) = self.current_user() else {
            debug!("No user, feed not loaded");
            return Ok(());
        };
        let inner = &self.inner;

        let stream = inner
            .documents
            .subscribe(&feed_collection(&user.email)?, None)
            .await
            .map_err(|e| {
                warn!(user = %user.email, error = %e, "Failed to subscribe to feed");
                e
            })?;

        let task = tokio::spawn(run_feed_subscription(
            Arc::downgrade(inner),
            user.email.clone(),
            stream,
        ));
        inner
            .subscriptions
            .arm(SubscriptionKind::Feed, user.email.as_str(), task);
        Ok(())
    }

    /// Save a headline to the signed-in user's feed, keyed by title.
    pub async fn add_headline_to_feed(&self, headline: &Headline) -> StateResult<()> {
        let user = self.current_user()?;
        let path = feed_collection(&user.email)?.doc(FeedEntry::document_id(&headline.title))?;

        self.inner
            .documents
            .set(&path, serde_json::to_value(headline)?)
            .await
            .map_err(|e| {
                warn!(user = %user.email, title = %headline.title, error = %e, "Failed to add feed entry");
                e
            })?;
        info!(user = %user.email, title = %headline.title, "Headline added to feed");
        Ok(())
    }

    /// Remove a feed entry by title. Removing an absent entry succeeds.
    pub async fn remove_headline_from_feed(&self, key: &str) -> StateResult<()> {
        let user = self.current_user()?;
        let path = feed_collection(&user.email)?.doc(FeedEntry::document_id(key))?;

        self.inner.documents.delete(&path).await.map_err(|e| {
            warn!(user = %user.email, key, error = %e, "Failed to remove feed entry");
            e
        })?;
        info!(user = %user.email, key, "Headline removed from feed");
        Ok(())
    }
}
