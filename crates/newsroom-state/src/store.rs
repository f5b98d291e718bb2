//! The state container.
//!
//! # Mutation rules
//!
//! - Every mutation is a single `send_modify`/`send_if_modified` on the
//!   watch channel; readers never observe half an update
//! - Remote reads and writes happen outside the channel; read-then-write
//!   sequences are not atomic
//! - Background tasks (subscriptions, session timer) hold a `Weak` back
//!   reference and stop once the store is dropped

use crate::news_source::NewsSource;
use crate::read_model::AppState;
use crate::subscriptions::{SubscriptionKind, Subscriptions};
use crate::timer::SessionTimer;
use document_store::DocumentStore;
use newsroom_auth::{AuthError, AuthMachine, AuthMachineInput, AuthState, IdentityProvider};
use newsroom_config_and_utils::{Config, DEFAULT_IMAGE_URL, DEFAULT_NEWS_API_URL};
use newsroom_storage::{LocalStorage, SessionVault};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

/// Store-level settings taken from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Image used when an article has none.
    pub default_image_url: String,
    /// Base URL for [`crate::NewsroomStore::headlines_url`].
    pub news_api_url: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            default_image_url: DEFAULT_IMAGE_URL.to_string(),
            news_api_url: DEFAULT_NEWS_API_URL.to_string(),
        }
    }
}

impl From<&Config> for StoreSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_image_url: config.default_image_url.clone(),
            news_api_url: config.news_api_url.clone(),
        }
    }
}

pub(crate) struct StoreInner {
    pub(crate) state: watch::Sender<AppState>,
    pub(crate) documents: Arc<dyn DocumentStore>,
    pub(crate) news: Arc<dyn NewsSource>,
    pub(crate) identity: Arc<dyn IdentityProvider>,
    pub(crate) vault: SessionVault,
    pub(crate) settings: StoreSettings,
    fsm: Mutex<AuthMachine>,
    pub(crate) subscriptions: Subscriptions,
    pub(crate) timer: SessionTimer,
}

impl StoreInner {
    /// Feed the auth FSM one input.
    ///
    /// The new state is not published here; callers fold it into the same
    /// `send_modify` as the data it accompanies.
    pub(crate) fn transition(&self, input: &AuthMachineInput) -> Result<AuthState, AuthError> {
        let mut fsm = self.fsm.lock().unwrap_or_else(|e| e.into_inner());
        let old_state = AuthState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = AuthState::from(fsm.state());
        if old_state != new_state {
            debug!(from = %old_state, to = %new_state, input = ?input, "Auth state transition");
        }
        Ok(new_state)
    }

    pub(crate) fn auth_state(&self) -> AuthState {
        let fsm = self.fsm.lock().unwrap_or_else(|e| e.into_inner());
        AuthState::from(fsm.state())
    }
}

/// Application state container.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct NewsroomStore {
    pub(crate) inner: Arc<StoreInner>,
}

impl NewsroomStore {
    /// Create a store over its collaborators.
    ///
    /// `storage` is where the session record is mirrored for restart survival.
    pub fn new(
        settings: StoreSettings,
        documents: Arc<dyn DocumentStore>,
        news: Arc<dyn NewsSource>,
        identity: Arc<dyn IdentityProvider>,
        storage: Box<dyn LocalStorage>,
    ) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            inner: Arc::new(StoreInner {
                state,
                documents,
                news,
                identity,
                vault: SessionVault::new(storage),
                settings,
                fsm: Mutex::new(AuthMachine::new()),
                subscriptions: Subscriptions::default(),
                timer: SessionTimer::default(),
            }),
        }
    }

    /// Snapshot of the current read model.
    pub fn state(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<AppState> {
        self.inner.state.subscribe()
    }

    /// Id currently watched by the `kind` subscription, if one is running.
    pub fn active_subscription(&self, kind: SubscriptionKind) -> Option<String> {
        self.inner.subscriptions.target(kind)
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }
}

impl std::fmt::Debug for NewsroomStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsroomStore")
            .field("auth", &self.inner.auth_state())
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}
