//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters hand over the authorization code returned by the OAuth
//! provider and receive the upserted user, without knowing how the identity
//! was verified or where users are stored.

use async_trait::async_trait;

use crate::domain::{Error, User};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Exchange `code` for an identity and return the matching user,
    /// creating one on first login.
    async fn login_with_code(&self, code: &str) -> Result<User, Error>;
}
