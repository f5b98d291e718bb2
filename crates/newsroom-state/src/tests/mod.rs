//! Scenario tests for the newsroom store.
//!
//! - `articles.rs` - headline list, selection, save and load by slug
//! - `comments.rs` - sending, liking and live re-ranking of comments
//! - `feed.rs`     - feed subscription and add/remove
//! - `session.rs`  - authentication, restore, logout and expiry

mod articles;
mod session;

use crate::model::ArticleSource;
use crate::news_source::{Article, NewsSource};
use crate::read_model::AppState;
use crate::{NewsroomStore, StateError, StateResult, StoreSettings};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use document_store::InMemoryDocumentStore;
use newsroom_auth::{AuthAction, AuthError, AuthResult, IdentityGrant, IdentityProvider};
use newsroom_storage::MemoryStorage;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub(crate) const PLACEHOLDER: &str = "https://img.example.com/placeholder.png";

/// News source that serves a fixed article list.
#[derive(Default)]
pub(crate) struct ScriptedNews {
    articles: Mutex<Vec<Article>>,
    fail: AtomicBool,
    requests: Mutex<Vec<String>>,
}

impl ScriptedNews {
    pub(crate) fn serve(&self, articles: Vec<Article>) {
        *self.articles.lock().unwrap() = articles;
    }

    pub(crate) fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsSource for ScriptedNews {
    async fn fetch_articles(&self, url: &str) -> StateResult<Vec<Article>> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(StateError::NewsSource {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(self.articles.lock().unwrap().clone())
    }
}

/// Identity provider accepting any password except `wrong`.
pub(crate) struct ScriptedIdentity {
    lifetime: Mutex<Duration>,
    calls: AtomicUsize,
}

impl Default for ScriptedIdentity {
    fn default() -> Self {
        Self {
            lifetime: Mutex::new(Duration::hours(1)),
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedIdentity {
    pub(crate) fn set_lifetime(&self, lifetime: Duration) {
        *self.lifetime.lock().unwrap() = lifetime;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn authenticate(
        &self,
        action: AuthAction,
        email: &str,
        password: &str,
    ) -> AuthResult<IdentityGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if password == "wrong" {
            return Err(AuthError::InvalidCredentials("INVALID_PASSWORD".to_string()));
        }
        Ok(IdentityGrant {
            id_token: format!("{action}-token-{email}"),
            email: email.to_string(),
            expires_at: Utc::now() + *self.lifetime.lock().unwrap(),
        })
    }
}

pub(crate) struct Harness {
    pub store: NewsroomStore,
    pub documents: Arc<InMemoryDocumentStore>,
    pub storage: Arc<MemoryStorage>,
    pub news: Arc<ScriptedNews>,
    pub identity: Arc<ScriptedIdentity>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()))
    }

    /// Harness over an existing storage backend, as after a restart.
    pub(crate) fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        let documents = Arc::new(InMemoryDocumentStore::new());
        let news = Arc::new(ScriptedNews::default());
        let identity = Arc::new(ScriptedIdentity::default());
        let settings = StoreSettings {
            default_image_url: PLACEHOLDER.to_string(),
            news_api_url: "https://news.example.com/v2/top-headlines".to_string(),
        };
        let store = NewsroomStore::new(
            settings,
            documents.clone(),
            news.clone(),
            identity.clone(),
            Box::new(storage.clone()),
        );
        Self {
            store,
            documents,
            storage,
            news,
            identity,
        }
    }

    pub(crate) async fn login(&self, email: &str) {
        self.store
            .authenticate_user(AuthAction::Register, email, "secret")
            .await
            .unwrap();
    }
}

pub(crate) fn article(title: &str) -> Article {
    Article {
        title: title.to_string(),
        url: format!("https://news.example.com/{}", title.len()),
        url_to_image: Some("https://img.example.com/story.jpg".to_string()),
        source: ArticleSource {
            id: Some("example".to_string()),
            name: "Example News".to_string(),
        },
        published_at: "2024-05-01T12:00:00Z".to_string(),
        author: Some("Staff".to_string()),
        description: None,
        content: None,
    }
}

/// Wait until the published state satisfies `pred`.
pub(crate) async fn wait_for<F>(rx: &mut watch::Receiver<AppState>, pred: F) -> AppState
where
    F: Fn(&AppState) -> bool,
{
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    loop {
        {
            let state = rx.borrow_and_update();
            if pred(&state) {
                return state.clone();
            }
        }
        tokio::time::timeout_at(deadline, rx.changed())
            .await
            .expect("timed out waiting for state")
            .expect("store dropped");
    }
}
