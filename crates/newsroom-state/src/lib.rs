//! # Newsroom State
//!
//! Client-side state layer for the newsroom reader: fetched headlines, the
//! selected headline and its comment thread, the signed-in user's reading
//! feed, and the authentication session.
//!
//! ## Architecture
//!
//! ```text
//! intent ─► NewsroomStore operation ─► remote call ─► normalize ─► AppState
//!                                                                    ▲
//! live subscription task (comments / feed) ─► snapshot ─────────────┘
//! session timer ─► logout ──────────────────────────────────────────┘
//! ```
//!
//! - [`AppState`] is the single read model, published through a
//!   `tokio::sync::watch` channel
//! - At most one live subscription per kind; arming a kind replaces it
//! - Comment threads are always ranked by likes, descending
//! - Writes are not transactional: read-then-write sequences can interleave
//!
//! ## Crate Structure
//!
//! - [`slug`] - Title to slug normalization
//! - [`model`] - Headlines, comments, users, feed entries
//! - [`news_source`] - The [`NewsSource`] trait and [`NewsApiClient`]
//! - [`read_model`] - [`AppState`]
//! - [`store`] - [`NewsroomStore`] and its settings
//! - `articles`, `comments`, `feed`, `session` - Store operations

mod articles;
mod comments;
mod error;
mod feed;
pub mod model;
pub mod news_source;
pub mod read_model;
mod session;
pub mod slug;
pub mod store;
mod subscriptions;
mod timer;

#[cfg(test)]
mod tests;

pub use error::{StateError, StateResult};
pub use model::{ArticleSource, Comment, FeedEntry, Headline, User};
pub use news_source::{headlines_url, Article, NewsApiClient, NewsSource};
pub use newsroom_auth::{AuthAction, AuthState};
pub use read_model::AppState;
pub use slug::slugify;
pub use store::{NewsroomStore, StoreSettings};
pub use subscriptions::SubscriptionKind;
