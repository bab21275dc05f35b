//! Port abstraction for the external OAuth identity provider.
//!
//! Adapters exchange an authorization code for the identity the provider
//! asserts. The network exchange itself lives outside this crate; the
//! server wires a fixture in development and an unconfigured provider
//! otherwise.

use async_trait::async_trait;

use crate::domain::ExternalIdentity;

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// No provider is configured for this deployment.
        NotConfigured => "identity provider is not configured",
        /// The provider refused the authorization code.
        Rejected { message: String } => "authorization code rejected: {message}",
        /// The provider could not be reached.
        Transport { message: String } => "identity provider transport failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for the asserted identity.
    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, IdentityProviderError>;
}

/// Development provider that treats an email-shaped code as the identity.
///
/// `"ada@example.edu"` logs in as that address; any other code is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityProvider;

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, IdentityProviderError> {
        let email = code.trim();
        if !email.contains('@') {
            return Err(IdentityProviderError::rejected("unknown development code"));
        }
        let local_part = email.split('@').next().unwrap_or_default();
        Ok(ExternalIdentity {
            email: Some(email.to_owned()),
            full_name: Some(local_part.to_owned()).filter(|name| !name.is_empty()),
            picture: None,
            subject: format!("dev:{email}"),
        })
    }
}

/// Provider used when no OAuth client is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredIdentityProvider;

#[async_trait]
impl IdentityProvider for UnconfiguredIdentityProvider {
    async fn exchange_code(&self, _code: &str) -> Result<ExternalIdentity, IdentityProviderError> {
        Err(IdentityProviderError::not_configured())
    }
}
