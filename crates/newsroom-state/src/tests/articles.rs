//! Headline list, selection, persistence.

use super::{article, wait_for, Harness, PLACEHOLDER};
use crate::news_source::{Article, NewsSource};
use crate::{Comment, NewsroomStore, StateError, StateResult, StoreSettings, SubscriptionKind};
use async_trait::async_trait;
use document_store::{CollectionPath, DocumentStore, InMemoryDocumentStore};
use newsroom_storage::MemoryStorage;
use std::sync::Arc;
use tokio::sync::Notify;

/// News source that blocks until released.
struct GatedNews {
    release: Notify,
}

#[async_trait]
impl NewsSource for GatedNews {
    async fn fetch_articles(&self, _url: &str) -> StateResult<Vec<Article>> {
        self.release.notified().await;
        Ok(vec![article("Gated")])
    }
}

#[tokio::test]
async fn load_headlines_slugs_and_defaults_image() {
    let h = Harness::new();
    let mut hello = article("Hello, World!");
    hello.url_to_image = None;
    h.news.serve(vec![hello]);

    let headlines = h
        .store
        .load_headlines("https://news.example.com/v2/top-headlines")
        .await
        .unwrap();

    assert_eq!(headlines.len(), 1);
    assert_eq!(headlines[0].slug, "hello-world");
    assert_eq!(headlines[0].image_url, PLACEHOLDER);

    let state = h.store.state();
    assert_eq!(state.headlines, headlines);
    assert!(!state.loading);
    assert_eq!(
        h.news.requests(),
        vec!["https://news.example.com/v2/top-headlines".to_string()]
    );
}

#[tokio::test]
async fn load_headlines_failure_keeps_list_and_clears_loading() {
    let h = Harness::new();
    h.news.serve(vec![article("First story")]);
    h.store.load_headlines("u").await.unwrap();

    h.news.fail(true);
    let err = h.store.load_headlines("u").await.unwrap_err();
    assert!(err.is_transient());

    let state = h.store.state();
    assert_eq!(state.headlines.len(), 1);
    assert!(!state.loading);
    // No retry
    assert_eq!(h.news.requests().len(), 2);
}

#[tokio::test]
async fn loading_flag_is_visible_while_fetching() {
    let news = Arc::new(GatedNews {
        release: Notify::new(),
    });
    let store = NewsroomStore::new(
        StoreSettings::default(),
        Arc::new(InMemoryDocumentStore::new()),
        news.clone(),
        Arc::new(super::ScriptedIdentity::default()),
        Box::new(MemoryStorage::new()),
    );
    let mut rx = store.subscribe_state();

    let loader = store.clone();
    let pending = tokio::spawn(async move { loader.load_headlines("u").await });

    wait_for(&mut rx, |s| s.loading).await;
    news.release.notify_one();
    pending.await.unwrap().unwrap();

    let state = wait_for(&mut rx, |s| !s.loading).await;
    assert_eq!(state.headlines.len(), 1);
}

#[test]
fn headlines_url_uses_configured_base() {
    let h = Harness::new();
    let url = h.store.headlines_url("de", "technology").unwrap();
    assert_eq!(
        url.as_str(),
        "https://news.example.com/v2/top-headlines?country=de&category=technology"
    );
}

#[tokio::test]
async fn select_headline_uses_cached_list() {
    let h = Harness::new();
    h.news.serve(vec![article("Alpha"), article("Beta")]);
    h.store.load_headlines("u").await.unwrap();

    let selected = h.store.select_headline("beta").unwrap();
    assert_eq!(selected.title, "Beta");
    assert_eq!(h.store.state().headline_slug(), Some("beta"));

    assert!(h.store.select_headline("gamma").is_none());
    assert_eq!(h.store.state().headline_slug(), Some("beta"));
}

#[tokio::test]
async fn save_then_load_round_trips_fields() {
    let h = Harness::new();
    h.news.serve(vec![article("Saved story")]);
    let headline = h.store.load_headlines("u").await.unwrap().remove(0);

    assert!(h.store.save_headline(&headline).await.unwrap());
    let loaded = h
        .store
        .load_headline(&headline.slug)
        .await
        .unwrap()
        .expect("stored headline");

    assert_eq!(loaded, headline);
    assert!(loaded.comments.is_none());
    assert_eq!(h.store.state().headline, Some(headline));
}

#[tokio::test]
async fn save_headline_is_first_writer_wins() {
    let h = Harness::new();
    h.news.serve(vec![article("Same title")]);
    let original = h.store.load_headlines("u").await.unwrap().remove(0);
    assert!(h.store.save_headline(&original).await.unwrap());

    let mut rival = original.clone();
    rival.url = "https://elsewhere.example.com".to_string();
    assert!(!h.store.save_headline(&rival).await.unwrap());

    let loaded = h.store.load_headline(&original.slug).await.unwrap().unwrap();
    assert_eq!(loaded.url, original.url);
}

#[tokio::test]
async fn load_missing_headline_leaves_selection() {
    let h = Harness::new();
    h.news.serve(vec![article("Kept")]);
    h.store.load_headlines("u").await.unwrap();
    h.store.select_headline("kept").unwrap();

    assert!(h.store.load_headline("nope").await.unwrap().is_none());
    assert_eq!(h.store.state().headline_slug(), Some("kept"));
}

#[tokio::test]
async fn load_headline_ranks_comments() {
    let h = Harness::new();
    h.news.serve(vec![article("Ranked")]);
    let headline = h.store.load_headlines("u").await.unwrap().remove(0);
    h.store.save_headline(&headline).await.unwrap();

    let comments = CollectionPath::parse("headlines/ranked/comments").unwrap();
    for (id, likes) in [("low", 1), ("high", 9), ("mid", 4)] {
        let comment = Comment {
            likes,
            ..Comment::new(id, format!("{id} body"), "a@b.com")
        };
        h.documents
            .set(&comments.doc(id).unwrap(), serde_json::to_value(&comment).unwrap())
            .await
            .unwrap();
    }

    let loaded = h.store.load_headline("ranked").await.unwrap().unwrap();
    let ids: Vec<_> = loaded
        .comments
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["high", "mid", "low"]);
}

#[tokio::test]
async fn selecting_another_headline_cancels_comment_watch() {
    let h = Harness::new();
    h.news.serve(vec![article("First"), article("Second")]);
    h.store.load_headlines("u").await.unwrap();
    h.store.select_headline("first").unwrap();
    h.store.watch_comments("first").await.unwrap();

    let mut rx = h.store.subscribe_state();
    wait_for(&mut rx, |s| {
        s.headline.as_ref().is_some_and(|hl| hl.comments.is_some())
    })
    .await;
    assert_eq!(
        h.store.active_subscription(SubscriptionKind::Comments),
        Some("first".to_string())
    );

    h.store.select_headline("second").unwrap();
    assert!(h
        .store
        .active_subscription(SubscriptionKind::Comments)
        .is_none());
}

#[tokio::test]
async fn close_headline_clears_selection() {
    let h = Harness::new();
    h.news.serve(vec![article("Closing")]);
    h.store.load_headlines("u").await.unwrap();
    h.store.select_headline("closing").unwrap();
    h.store.watch_comments("closing").await.unwrap();

    h.store.close_headline();
    let state = h.store.state();
    assert!(state.headline.is_none());
    assert!(h
        .store
        .active_subscription(SubscriptionKind::Comments)
        .is_none());
}

#[tokio::test]
async fn store_outage_surfaces_as_transient_error() {
    let h = Harness::new();
    h.documents.set_unavailable(true);

    let err = h.store.load_headline("any").await.unwrap_err();
    assert!(matches!(err, StateError::Document(_)));
    assert!(err.is_transient());
    assert!(h.store.state().headline.is_none());
}
