//! Driving port for anonymous share resolution.

use async_trait::async_trait;

use crate::domain::{Error, SharedLesson};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShareQuery: Send + Sync {
    /// Resolve a token. Unknown tokens are not found; lapsed ones are gone.
    async fn get_share(&self, token: &str) -> Result<SharedLesson, Error>;
}
