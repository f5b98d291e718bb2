//! Configuration, paths, errors, and logging shared by the newsroom crates.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_CATEGORY, DEFAULT_COUNTRY, DEFAULT_IDENTITY_URL, DEFAULT_IMAGE_URL,
    DEFAULT_LOG_LEVEL, DEFAULT_NEWS_API_URL, DEFAULT_POLL_INTERVAL_MS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
