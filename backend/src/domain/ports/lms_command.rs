//! Driving port for learning-management-system integration.

use async_trait::async_trait;

use crate::domain::{ConnectRequest, Error, LmsConnection, LmsPush, PushRequest, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LmsCommand: Send + Sync {
    /// Store Google Classroom tokens for the actor.
    async fn connect_google_classroom(
        &self,
        actor: &User,
        request: ConnectRequest,
    ) -> Result<LmsConnection, Error>;

    /// Post a lesson to a course as an assignment.
    async fn push_google_classroom(
        &self,
        actor: &User,
        request: PushRequest,
    ) -> Result<LmsPush, Error>;
}
