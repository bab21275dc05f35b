//! Port abstraction for LMS connections and push records.

use async_trait::async_trait;

use crate::domain::{LmsConnection, LmsPush, NewEvent, NewLmsConnection, NewLmsPush, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by LMS repository adapters.
    pub enum LmsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "lms repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "lms repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LmsRepository: Send + Sync {
    /// Store a new set of provider tokens.
    async fn insert_connection(
        &self,
        connection: &NewLmsConnection,
    ) -> Result<LmsConnection, LmsRepositoryError>;

    /// Most recently created connection for the user and provider.
    async fn latest_connection(
        &self,
        user_id: &UserId,
        provider: &str,
    ) -> Result<Option<LmsConnection>, LmsRepositoryError>;

    /// Record a push and its `lms_push` event in one transaction.
    async fn insert_push(
        &self,
        push: &NewLmsPush,
        event: &NewEvent,
    ) -> Result<LmsPush, LmsRepositoryError>;
}

/// LMS store used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLmsRepository;

#[async_trait]
impl LmsRepository for FixtureLmsRepository {
    async fn insert_connection(
        &self,
        _connection: &NewLmsConnection,
    ) -> Result<LmsConnection, LmsRepositoryError> {
        Err(LmsRepositoryError::connection("database not configured"))
    }

    async fn latest_connection(
        &self,
        _user_id: &UserId,
        _provider: &str,
    ) -> Result<Option<LmsConnection>, LmsRepositoryError> {
        Ok(None)
    }

    async fn insert_push(
        &self,
        _push: &NewLmsPush,
        _event: &NewEvent,
    ) -> Result<LmsPush, LmsRepositoryError> {
        Err(LmsRepositoryError::connection("database not configured"))
    }
}
