//! Identity provider contract and HTTP client.

use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use url::Url;

/// Which identity endpoint to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    Register,
    Login,
}

impl AuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthAction::Register => "register",
            AuthAction::Login => "login",
        }
    }
}

impl fmt::Display for AuthAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthAction {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "register" | "signup" => Ok(AuthAction::Register),
            "login" | "signin" => Ok(AuthAction::Login),
            other => Err(AuthError::InvalidResponse(format!(
                "unknown auth action `{other}`"
            ))),
        }
    }
}

/// Session issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityGrant {
    pub id_token: String,
    pub email: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

/// Exchanges email/password for a session token.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(
        &self,
        action: AuthAction,
        email: &str,
        password: &str,
    ) -> AuthResult<IdentityGrant>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    #[serde(default)]
    email: Option<String>,
    expires_in: Value,
}

/// Parse `expiresIn`, which providers send as seconds in a string or number.
fn parse_expires_in(raw: &Value) -> AuthResult<Duration> {
    let seconds = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => Ok(Duration::milliseconds((s * 1000.0) as i64)),
        _ => Err(AuthError::InvalidResponse(format!(
            "expiresIn is not a number of seconds: {raw}"
        ))),
    }
}

impl IdentityGrant {
    /// Normalize a provider response body issued at `now`.
    ///
    /// The requested email stands in when the provider omits it.
    fn from_response(body: &str, requested_email: &str, now: DateTime<Utc>) -> AuthResult<Self> {
        let response: AuthResponse = serde_json::from_str(body)?;
        if response.id_token.is_empty() {
            return Err(AuthError::InvalidResponse("empty idToken".to_string()));
        }
        let lifetime = parse_expires_in(&response.expires_in)?;

        Ok(Self {
            id_token: response.id_token,
            email: response
                .email
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| requested_email.to_string()),
            expires_at: now + lifetime,
        })
    }
}

/// Provider error bodies look like `{"error": {"message": "EMAIL_EXISTS"}}`.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// HTTP identity provider posting to `{base}/{action}/`.
#[derive(Clone)]
pub struct HttpIdentityClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpIdentityClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Parse the base URL and build a client.
    pub fn parse(base_url: &str) -> AuthResult<Self> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    fn endpoint(&self, action: AuthAction) -> AuthResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}/", base, action))?)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityClient {
    async fn authenticate(
        &self,
        action: AuthAction,
        email: &str,
        password: &str,
    ) -> AuthResult<IdentityGrant> {
        let url = self.endpoint(action)?;
        debug!(action = %action, email, "Calling identity provider");

        let response = self
            .http_client
            .post(url)
            .json(&AuthRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = provider_message(&body);
            warn!(action = %action, status = status.as_u16(), message = %message, "Identity request rejected");
            return Err(match status.as_u16() {
                400 | 401 | 403 => AuthError::InvalidCredentials(message),
                status => AuthError::Provider { status, message },
            });
        }

        IdentityGrant::from_response(&body, email, Utc::now())
    }
}

impl fmt::Debug for HttpIdentityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpIdentityClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
