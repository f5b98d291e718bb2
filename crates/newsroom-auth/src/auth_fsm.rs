//! Authentication state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!             SessionRestored
//!   ┌──────────────────────────────────────┐
//!   │                                      ▼
//! ┌─────────────────┐  LoginAttempt  ┌─────────────────┐
//! │    LoggedOut    │ ─────────────► │ Authenticating  │
//! │    (initial)    │ ◄───────────── │                 │
//! └─────────────────┘  AuthFailed /  └────────┬────────┘
//!   ▲                  LogoutRequested        │ AuthSucceeded
//!   │                                         ▼
//!   │  LogoutRequested / SessionExpired ┌─────────────────┐
//!   └────────────────────────────────── │    LoggedIn     │
//!                                       └────────┬────────┘
//!                                                │ LoginAttempt
//!                                                ▼
//!                                          Authenticating
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub auth_machine(LoggedOut)

    LoggedOut => {
        LoginAttempt => Authenticating,
        SessionRestored => LoggedIn
    },
    Authenticating => {
        AuthSucceeded => LoggedIn,
        AuthFailed => LoggedOut,
        LogoutRequested => LoggedOut
    },
    LoggedIn => {
        // Re-authentication replaces the current session
        LoginAttempt => Authenticating,
        LogoutRequested => LoggedOut,
        SessionExpired => LoggedOut
    }
}

pub use auth_machine::Input as AuthMachineInput;
pub use auth_machine::State as AuthMachineState;
pub use auth_machine::StateMachine as AuthMachine;

/// Authentication state for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No session.
    LoggedOut,
    /// Waiting on the identity provider.
    Authenticating,
    /// Session published and timer armed.
    LoggedIn,
}

impl AuthState {
    /// Returns true if the user has a live session (LoggedIn state only).
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::LoggedIn)
    }

    /// Returns true while a login or registration is in flight.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthState::Authenticating)
    }
}

impl From<&AuthMachineState> for AuthState {
    fn from(state: &AuthMachineState) -> Self {
        match state {
            AuthMachineState::LoggedOut => AuthState::LoggedOut,
            AuthMachineState::Authenticating => AuthState::Authenticating,
            AuthMachineState::LoggedIn => AuthState::LoggedIn,
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AuthState::LoggedOut => "logged out",
            AuthState::Authenticating => "authenticating",
            AuthState::LoggedIn => "logged in",
        };
        f.write_str(label)
    }
}
