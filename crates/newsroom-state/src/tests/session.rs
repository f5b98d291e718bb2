//! Authentication, restore, logout and expiry.

use super::{wait_for, Harness, ScriptedIdentity};
use crate::{AuthAction, AuthState, NewsroomStore, StateError, StoreSettings, User};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use document_store::{CollectionPath, DocumentPath, DocumentStore, InMemoryDocumentStore};
use newsroom_auth::{gravatar_url, AuthError, AuthResult, IdentityGrant, IdentityProvider};
use newsroom_storage::{
    LocalStorage, MemoryStorage, SessionVault, StorageError, StorageKeys, StorageResult,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;

fn user_doc(email: &str) -> DocumentPath {
    DocumentPath::parse(&format!("users/{email}")).unwrap()
}

#[tokio::test]
async fn register_publishes_user_and_arms_timer() {
    let h = Harness::new();

    let user = h
        .store
        .authenticate_user(AuthAction::Register, "a@b.com", "x")
        .await
        .unwrap();

    assert_eq!(user.email, "a@b.com");
    assert!(!user.avatar.is_empty());
    assert_eq!(user.avatar, gravatar_url("a@b.com"));

    let state = h.store.state();
    assert_eq!(state.user, Some(user.clone()));
    assert_eq!(state.token.as_deref(), Some("register-token-a@b.com"));
    assert_eq!(state.auth, AuthState::LoggedIn);
    assert!(!state.loading);
    assert!(h.store.is_authenticated());
    assert!(h.store.inner.timer.is_armed());

    let stored = h.documents.get(&user_doc("a@b.com")).await.unwrap().unwrap();
    assert_eq!(stored.decode::<User>().unwrap(), user);

    assert_eq!(
        h.storage.get(StorageKeys::JWT).unwrap().as_deref(),
        Some("register-token-a@b.com")
    );
    assert_eq!(h.storage.get(StorageKeys::USER).unwrap().as_deref(), Some("a@b.com"));
    assert!(h.storage.get(StorageKeys::EXPIRES_IN).unwrap().is_some());
}

#[tokio::test]
async fn login_reads_stored_user() {
    let h = Harness::new();
    h.documents
        .set(
            &user_doc("reader@example.com"),
            json!({ "email": "reader@example.com", "avatar": "https://img.example.com/me.png" }),
        )
        .await
        .unwrap();

    let user = h
        .store
        .authenticate_user(AuthAction::Login, "reader@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(user.avatar, "https://img.example.com/me.png");
}

#[tokio::test]
async fn login_without_user_record_derives_one() {
    let h = Harness::new();

    let user = h
        .store
        .authenticate_user(AuthAction::Login, " new@example.com ", "secret")
        .await
        .unwrap();

    assert_eq!(user, User::derive("new@example.com"));
    assert!(h
        .documents
        .get(&user_doc("new@example.com"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn failed_authentication_publishes_nothing() {
    let h = Harness::new();

    let err = h
        .store
        .authenticate_user(AuthAction::Login, "a@b.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StateError::Auth(AuthError::InvalidCredentials(_))
    ));

    let state = h.store.state();
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    assert!(!state.loading);
    assert_eq!(state.auth, AuthState::LoggedOut);
    assert_eq!(h.store.auth_state(), AuthState::LoggedOut);
    assert!(!h.store.inner.timer.is_armed());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn failed_reauthentication_ends_previous_session() {
    let h = Harness::new();
    h.login("a@b.com").await;

    let result = h
        .store
        .authenticate_user(AuthAction::Login, "a@b.com", "wrong")
        .await;
    assert!(result.is_err());

    let state = h.store.state();
    assert!(state.token.is_none());
    assert_eq!(state.auth, AuthState::LoggedOut);
    assert!(h.storage.is_empty());
    assert!(!h.store.inner.timer.is_armed());
}

/// Storage whose deletes always fail.
struct StuckStorage(MemoryStorage);

impl LocalStorage for StuckStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.0.set(key, value)
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.0.get(key)
    }

    fn delete(&self, _key: &str) -> StorageResult<bool> {
        Err(StorageError::Backend("read-only".to_string()))
    }
}

#[tokio::test]
async fn failed_reauthentication_reports_provider_error_when_storage_is_stuck() {
    let store = NewsroomStore::new(
        StoreSettings::default(),
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(super::ScriptedNews::default()),
        Arc::new(ScriptedIdentity::default()),
        Box::new(StuckStorage(MemoryStorage::new())),
    );
    store
        .authenticate_user(AuthAction::Register, "a@b.com", "secret")
        .await
        .unwrap();

    let err = store
        .authenticate_user(AuthAction::Login, "a@b.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StateError::Auth(AuthError::InvalidCredentials(_))
    ));

    let state = store.state();
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    assert_eq!(state.auth, AuthState::LoggedOut);
    assert!(!store.inner.timer.is_armed());
}

#[tokio::test]
async fn logout_clears_everything() {
    let h = Harness::new();
    h.login("a@b.com").await;

    h.store.logout_user().unwrap();

    let state = h.store.state();
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    assert!(state.expires_at.is_none());
    assert!(state.feed.is_empty());
    assert_eq!(state.auth, AuthState::LoggedOut);
    assert!(!h.store.is_authenticated());
    assert!(!h.store.inner.timer.is_armed());
    assert!(h.storage.is_empty());

    // Logging out twice is fine
    h.store.logout_user().unwrap();
}

#[tokio::test(start_paused = true)]
async fn session_expires_on_its_own() {
    let h = Harness::new();
    h.identity.set_lifetime(Duration::seconds(60));
    h.login("a@b.com").await;
    assert!(h.store.is_authenticated());

    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
    assert_eq!(h.store.auth_state(), AuthState::LoggedIn);

    tokio::time::sleep(std::time::Duration::from_secs(31)).await;
    let state = h.store.state();
    assert!(state.token.is_none());
    assert!(state.user.is_none());
    assert_eq!(state.auth, AuthState::LoggedOut);
    assert!(h.storage.is_empty());
}

#[tokio::test(start_paused = true)]
async fn reauthentication_rearms_timer() {
    let h = Harness::new();
    h.identity.set_lifetime(Duration::seconds(60));
    h.login("a@b.com").await;

    tokio::time::sleep(std::time::Duration::from_secs(40)).await;
    h.identity.set_lifetime(Duration::seconds(600));
    h.login("a@b.com").await;

    // Past the first expiry, inside the second
    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    assert_eq!(h.store.auth_state(), AuthState::LoggedIn);
    assert!(h.store.state().token.is_some());
    assert_eq!(h.identity.calls(), 2);
}

#[tokio::test]
async fn restore_from_durable_storage() {
    let storage = Arc::new(MemoryStorage::new());
    {
        let h = Harness::with_storage(storage.clone());
        h.login("a@b.com").await;
    }

    let restarted = Harness::with_storage(storage);
    assert!(restarted.store.restore_session().unwrap());

    let state = restarted.store.state();
    assert_eq!(state.token.as_deref(), Some("register-token-a@b.com"));
    assert_eq!(state.user, Some(User::derive("a@b.com")));
    assert_eq!(state.auth, AuthState::LoggedIn);
    assert!(restarted.store.is_authenticated());
    assert!(restarted.store.inner.timer.is_armed());
    // Restoring makes no remote calls
    assert_eq!(restarted.identity.calls(), 0);
}

#[tokio::test]
async fn restore_clears_expired_record() {
    let storage = Arc::new(MemoryStorage::new());
    SessionVault::new(Box::new(storage.clone()))
        .save("old-token", Utc::now() - Duration::minutes(1), "a@b.com", "avatar")
        .unwrap();

    let h = Harness::with_storage(storage);
    assert!(!h.store.restore_session().unwrap());
    assert!(h.store.state().token.is_none());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn restore_clears_tokenless_record() {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(StorageKeys::JWT, "").unwrap();
    storage
        .set(
            StorageKeys::EXPIRES_IN,
            &(Utc::now() + Duration::hours(1)).timestamp_millis().to_string(),
        )
        .unwrap();

    let h = Harness::with_storage(storage);
    assert!(!h.store.restore_session().unwrap());
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn restore_keeps_live_session_without_record() {
    let h = Harness::new();
    h.login("a@b.com").await;
    h.storage.delete(StorageKeys::JWT).unwrap();

    assert!(h.store.restore_session().unwrap());
    assert!(h.store.is_authenticated());
    assert_eq!(
        h.store.state().token.as_deref(),
        Some("register-token-a@b.com")
    );
}

#[tokio::test]
async fn restore_ignores_stale_record_while_live() {
    let h = Harness::new();
    h.login("a@b.com").await;
    SessionVault::new(Box::new(h.storage.clone()))
        .save("old-token", Utc::now() - Duration::minutes(1), "a@b.com", "avatar")
        .unwrap();

    assert!(h.store.restore_session().unwrap());

    let state = h.store.state();
    assert_eq!(state.token.as_deref(), Some("register-token-a@b.com"));
    assert_eq!(state.auth, AuthState::LoggedIn);
    assert!(h.store.inner.timer.is_armed());
    assert_eq!(
        h.storage.get(StorageKeys::JWT).unwrap().as_deref(),
        Some("old-token")
    );
}

#[tokio::test]
async fn restore_without_record_does_nothing() {
    let h = Harness::new();
    assert!(!h.store.restore_session().unwrap());
    assert_eq!(h.store.auth_state(), AuthState::LoggedOut);
}

/// Identity provider that answers only when released.
struct GatedIdentity {
    release: Notify,
    inner: ScriptedIdentity,
}

#[async_trait]
impl IdentityProvider for GatedIdentity {
    async fn authenticate(
        &self,
        action: AuthAction,
        email: &str,
        password: &str,
    ) -> AuthResult<IdentityGrant> {
        self.release.notified().await;
        self.inner.authenticate(action, email, password).await
    }
}

#[tokio::test]
async fn logout_during_login_wins() {
    let identity = Arc::new(GatedIdentity {
        release: Notify::new(),
        inner: ScriptedIdentity::default(),
    });
    let storage = Arc::new(MemoryStorage::new());
    let store = NewsroomStore::new(
        StoreSettings::default(),
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(super::ScriptedNews::default()),
        identity.clone(),
        Box::new(storage.clone()),
    );
    let mut rx = store.subscribe_state();

    let pending = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .authenticate_user(AuthAction::Login, "a@b.com", "secret")
                .await
        })
    };
    wait_for(&mut rx, |s| s.auth == AuthState::Authenticating).await;

    // A second attempt while one is in flight is rejected
    let err = store
        .authenticate_user(AuthAction::Login, "a@b.com", "secret")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StateError::Auth(AuthError::InvalidStateTransition(_))
    ));

    store.logout_user().unwrap();
    identity.release.notify_one();

    let result = pending.await.unwrap();
    assert!(result.is_err());
    let state = store.state();
    assert!(state.token.is_none());
    assert_eq!(state.auth, AuthState::LoggedOut);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn email_case_and_whitespace_share_one_user() {
    let h = Harness::new();
    let registered = h
        .store
        .authenticate_user(AuthAction::Register, "Reader@Example.com ", "secret")
        .await
        .unwrap();
    assert_eq!(registered.email, "reader@example.com");
    h.store.logout_user().unwrap();

    let logged_in = h
        .store
        .authenticate_user(AuthAction::Login, "  reader@EXAMPLE.com", "secret")
        .await
        .unwrap();
    assert_eq!(logged_in, registered);

    let users = CollectionPath::new("users").unwrap();
    assert_eq!(h.documents.document_count(&users), 1);
    assert!(h
        .documents
        .get(&user_doc("Reader@Example.com"))
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        h.store.state().token.as_deref(),
        Some("login-token-reader@example.com")
    );
    assert_eq!(
        h.storage.get(StorageKeys::USER).unwrap().as_deref(),
        Some("reader@example.com")
    );
}
