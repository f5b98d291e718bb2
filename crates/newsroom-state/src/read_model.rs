//! The read model published to callers.

use crate::model::{FeedEntry, Headline, User};
use chrono::{DateTime, Utc};
use newsroom_auth::AuthState;
use tokio::sync::watch;

/// Everything the presentation layer reads.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Most recently fetched headline list.
    pub headlines: Vec<Headline>,
    /// Currently selected headline, with comments once loaded.
    pub headline: Option<Headline>,
    /// True while any loading-tracked operation is in flight.
    pub loading: bool,
    pub token: Option<String>,
    pub user: Option<User>,
    pub expires_at: Option<DateTime<Utc>>,
    pub feed: Vec<FeedEntry>,
    pub auth: AuthState,
    in_flight: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            headlines: Vec::new(),
            headline: None,
            loading: false,
            token: None,
            user: None,
            expires_at: None,
            feed: Vec::new(),
            auth: AuthState::LoggedOut,
            in_flight: 0,
        }
    }
}

impl AppState {
    /// A token is held and has not expired at `now`.
    pub fn has_valid_session_at(&self, now: DateTime<Utc>) -> bool {
        let has_token = self.token.as_deref().is_some_and(|t| !t.is_empty());
        let unexpired = self.expires_at.is_some_and(|at| now < at);
        has_token && unexpired
    }

    /// Slug of the selected headline.
    pub fn headline_slug(&self) -> Option<&str> {
        self.headline.as_ref().map(|h| h.slug.as_str())
    }

    /// Drop token, user, expiry and feed.
    pub(crate) fn clear_session(&mut self) {
        self.token = None;
        self.user = None;
        self.expires_at = None;
        self.feed.clear();
    }
}

/// Marks one operation as in flight until dropped.
///
/// Loading stays true while any guard is alive, so overlapping operations do
/// not clear each other's flag.
pub(crate) struct LoadingGuard<'a> {
    state: &'a watch::Sender<AppState>,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn new(state: &'a watch::Sender<AppState>) -> Self {
        state.send_modify(|s| {
            s.in_flight += 1;
            s.loading = true;
        });
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            s.loading = s.in_flight > 0;
        });
    }
}
