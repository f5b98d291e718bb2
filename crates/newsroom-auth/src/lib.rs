//! Authentication for the newsroom client.
//!
//! This crate provides:
//! - Explicit FSM-based auth state management
//! - The identity provider contract and its HTTP client
//! - Avatar derivation for newly registered users

mod auth_fsm;
mod avatar;
mod error;
mod identity;

pub use auth_fsm::auth_machine;
pub use auth_fsm::{AuthMachine, AuthMachineInput, AuthMachineState, AuthState};
pub use avatar::{gravatar_url, normalize_email};
pub use error::{AuthError, AuthResult};
pub use identity::{AuthAction, HttpIdentityClient, IdentityGrant, IdentityProvider};
