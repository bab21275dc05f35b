//! Driving port for creating share links.

use async_trait::async_trait;

use crate::domain::{Error, LessonId, ShareLink, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShareCommand: Send + Sync {
    /// Share the lesson's latest version. `None` creates a non-expiring link.
    async fn create_share(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        ttl_hours: Option<u32>,
    ) -> Result<ShareLink, Error>;
}
