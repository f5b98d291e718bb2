//! Session lifecycle: authentication, restore, logout and expiry.

use crate::model::User;
use crate::read_model::LoadingGuard;
use crate::store::StoreInner;
use crate::subscriptions::SubscriptionKind;
use crate::{NewsroomStore, StateResult};
use chrono::{DateTime, Utc};
use document_store::{CollectionPath, DocumentPath};
use newsroom_auth::{normalize_email, AuthAction, AuthMachineInput, AuthState, IdentityGrant};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

fn user_path(email: &str) -> StateResult<DocumentPath> {
    Ok(CollectionPath::new("users")?.doc(email)?)
}

impl StoreInner {
    /// Tear the session down: timer, feed subscription, cached session data
    /// and the durable record. Memory is always cleared, even when the
    /// storage backend fails.
    pub(crate) fn end_session(&self, input: &AuthMachineInput) -> StateResult<()> {
        if let Err(e) = self.transition(input) {
            debug!(error = %e, "No session to end");
        }
        self.timer.cancel();
        self.subscriptions.cancel(SubscriptionKind::Feed);

        let auth = self.auth_state();
        self.state.send_modify(|s| {
            s.clear_session();
            s.auth = auth;
        });

        self.vault.clear().map_err(|e| {
            warn!(error = %e, "Failed to clear stored session");
            e
        })?;
        Ok(())
    }
}

impl NewsroomStore {
    /// Register or log in through the identity provider and start a session.
    ///
    /// The email is trimmed and lowercased before use; it keys the user
    /// record, the feed and the stored session. Registration stores a new
    /// user record. Login reads the stored record and creates it if missing. On failure nothing is published; a failed
    /// re-authentication ends the previous session.
    pub async fn authenticate_user(
        &self,
        action: AuthAction,
        email: &str,
        password: &str,
    ) -> StateResult<User> {
        let inner = &self.inner;
        let email = normalize_email(email);
        let email = email.as_str();
        let previous = inner.auth_state();

        let auth = inner.transition(&AuthMachineInput::LoginAttempt)?;
        inner.state.send_modify(|s| s.auth = auth);
        let _loading = LoadingGuard::new(&inner.state);

        match self.exchange_credentials(action, email, password).await {
            Ok((grant, user)) => self.begin_session(grant, user),
            Err(e) => {
                warn!(action = %action, email, error = %e, "Authentication failed");
                if inner.transition(&AuthMachineInput::AuthFailed).is_ok() {
                    if previous.is_authenticated() {
                        // The FSM already left LoggedIn; finish the teardown.
                        let ended = inner.end_session(&AuthMachineInput::LogoutRequested);
                        if let Err(clear_err) = ended {
                            warn!(error = %clear_err, "Previous session left storage uncleared");
                        }
                    } else {
                        inner.state.send_modify(|s| s.auth = AuthState::LoggedOut);
                    }
                }
                Err(e)
            }
        }
    }

    async fn exchange_credentials(
        &self,
        action: AuthAction,
        email: &str,
        password: &str,
    ) -> StateResult<(IdentityGrant, User)> {
        let grant = self
            .inner
            .identity
            .authenticate(action, email, password)
            .await?;

        let user = match action {
            AuthAction::Register => self.store_user(User::derive(email)).await?,
            AuthAction::Login => match self.fetch_user(email).await? {
                Some(user) => user,
                None => {
                    debug!(email, "No stored user record, deriving one");
                    self.store_user(User::derive(email)).await?
                }
            },
        };
        Ok((grant, user))
    }

    async fn fetch_user(&self, email: &str) -> StateResult<Option<User>> {
        let doc = self.inner.documents.get(&user_path(email)?).await?;
        Ok(doc.map(|doc| doc.decode::<User>()).transpose()?)
    }

    async fn store_user(&self, user: User) -> StateResult<User> {
        let path = user_path(&user.email)?;
        self.inner
            .documents
            .set(&path, serde_json::to_value(&user)?)
            .await?;
        debug!(email = %user.email, "User record stored");
        Ok(user)
    }

    fn begin_session(&self, grant: IdentityGrant, user: User) -> StateResult<User> {
        let inner = &self.inner;
        // Fails if a logout landed while the provider was answering.
        let auth = inner.transition(&AuthMachineInput::AuthSucceeded)?;

        inner
            .subscriptions
            .cancel_unless(SubscriptionKind::Feed, &user.email);
        inner.state.send_modify(|s| {
            if s.user.as_ref().map(|u| &u.email) != Some(&user.email) {
                s.feed.clear();
            }
            s.token = Some(grant.id_token.clone());
            s.user = Some(user.clone());
            s.expires_at = Some(grant.expires_at);
            s.auth = auth;
        });

        if let Err(e) = inner
            .vault
            .save(&grant.id_token, grant.expires_at, &user.email, &user.avatar)
        {
            warn!(error = %e, "Failed to persist session record");
        }
        self.arm_session_timer(grant.expires_at);

        info!(email = %user.email, expires_at = %grant.expires_at, "Session started");
        Ok(user)
    }

    /// Schedule logout at `expires_at`, replacing any pending schedule.
    fn arm_session_timer(&self, expires_at: DateTime<Utc>) {
        let remaining = (expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let store = Arc::downgrade(&self.inner);

        self.inner.timer.arm(remaining, async move {
            let Some(inner) = store.upgrade() else {
                return;
            };
            // A newer session owns the timer now.
            if inner.state.borrow().expires_at != Some(expires_at) {
                return;
            }
            info!("Session expired");
            if let Err(e) = inner.end_session(&AuthMachineInput::SessionExpired) {
                warn!(error = %e, "Session expiry left storage uncleared");
            }
        });
    }

    /// Restore a session from durable storage.
    ///
    /// Returns whether a session is active afterwards. A live session wins
    /// over whatever is stored. An expired or token-less record is cleared
    /// from memory and storage. No remote call.
    pub fn restore_session(&self) -> StateResult<bool> {
        let inner = &self.inner;
        if inner.auth_state().is_authenticated() {
            debug!("Session already active");
            return Ok(true);
        }

        let Some(record) = inner.vault.load()? else {
            debug!("No stored session");
            return Ok(false);
        };
        if record.is_expired_at(Utc::now()) {
            info!(email = %record.user, "Stored session expired");
            inner.end_session(&AuthMachineInput::SessionExpired)?;
            return Ok(false);
        }

        let auth = inner.transition(&AuthMachineInput::SessionRestored)?;
        let user = if record.avatar.is_empty() {
            User::derive(&record.user)
        } else {
            User {
                email: record.user.clone(),
                avatar: record.avatar.clone(),
            }
        };
        let expires_at = record.expires_at();

        inner
            .subscriptions
            .cancel_unless(SubscriptionKind::Feed, &user.email);
        inner.state.send_modify(|s| {
            s.token = Some(record.jwt.clone());
            s.user = Some(user.clone());
            s.expires_at = Some(expires_at);
            s.auth = auth;
        });
        self.arm_session_timer(expires_at);

        info!(email = %user.email, expires_at = %expires_at, "Session restored");
        Ok(true)
    }

    /// End the session: token, user, feed cache, feed subscription, timer and
    /// the durable record are all cleared.
    pub fn logout_user(&self) -> StateResult<()> {
        self.inner.end_session(&AuthMachineInput::LogoutRequested)?;
        info!("Logged out");
        Ok(())
    }

    /// A session is published and has not expired.
    pub fn is_authenticated(&self) -> bool {
        self.inner.auth_state().is_authenticated()
            && self.inner.state.borrow().has_valid_session_at(Utc::now())
    }

    pub fn auth_state(&self) -> AuthState {
        self.inner.auth_state()
    }
}
