//! Port abstraction for share link persistence.

use async_trait::async_trait;

use crate::domain::{NewEvent, NewShare, Share};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by share repository adapters.
    pub enum ShareRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "share repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "share repository query failed: {message}",
        /// The generated token collided with an existing share.
        DuplicateToken => "share token already exists",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Insert a share and its `lesson_shared` event in one transaction.
    async fn create_share(
        &self,
        share: &NewShare,
        event: &NewEvent,
    ) -> Result<Share, ShareRepositoryError>;

    /// Look up a share by token, regardless of tenant or expiry.
    async fn find_by_token(&self, token: &str) -> Result<Option<Share>, ShareRepositoryError>;
}

/// Share store used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureShareRepository;

#[async_trait]
impl ShareRepository for FixtureShareRepository {
    async fn create_share(
        &self,
        _share: &NewShare,
        _event: &NewEvent,
    ) -> Result<Share, ShareRepositoryError> {
        Err(ShareRepositoryError::connection("database not configured"))
    }

    async fn find_by_token(&self, _token: &str) -> Result<Option<Share>, ShareRepositoryError> {
        Ok(None)
    }
}
