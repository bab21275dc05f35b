//! Share link creation and resolution.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::port_error_mapping::{map_lesson_error, map_share_error};
use crate::domain::ports::{
    LessonRepository, ShareCommand, ShareQuery, ShareRepository, ShareRepositoryError,
};
use crate::domain::{
    Error, LessonId, NewEvent, NewShare, ShareLink, SharedLesson, User, actions,
    generate_share_token, share_expiry, share_url,
};

/// Attempts made before a token collision is reported.
const TOKEN_ATTEMPTS: usize = 3;

/// Share service implementing [`ShareCommand`] and [`ShareQuery`].
#[derive(Clone)]
pub struct ShareService<L, S> {
    lessons: Arc<L>,
    shares: Arc<S>,
    frontend_url: String,
    clock: Arc<dyn Clock>,
}

impl<L, S> ShareService<L, S> {
    pub fn new(
        lessons: Arc<L>,
        shares: Arc<S>,
        frontend_url: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lessons,
            shares,
            frontend_url: frontend_url.into(),
            clock,
        }
    }
}

#[async_trait]
impl<L, S> ShareCommand for ShareService<L, S>
where
    L: LessonRepository,
    S: ShareRepository,
{
    async fn create_share(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        ttl_hours: Option<u32>,
    ) -> Result<ShareLink, Error> {
        let detail = self
            .lessons
            .find_lesson(&actor.tenant_id, lesson_id)
            .await
            .map_err(map_lesson_error)?
            .ok_or_else(|| Error::not_found("Lesson not found"))?;
        let version = detail
            .latest_version()
            .ok_or_else(|| Error::invalid_request("Lesson has no versions"))?;

        let now = self.clock.utc();
        let expires_at = share_expiry(now, ttl_hours);
        for _ in 0..TOKEN_ATTEMPTS {
            let token = generate_share_token();
            let share = NewShare {
                tenant_id: actor.tenant_id,
                lesson_id: *lesson_id,
                lesson_version_id: version.id,
                token: token.clone(),
                created_by_user_id: Some(actor.id),
                expires_at,
            };
            let event = NewEvent::new(actor.tenant_id, Some(actor.id), actions::LESSON_SHARED, now)
                .with("lesson_id", lesson_id.to_string())
                .with("token", token.clone());
            match self.shares.create_share(&share, &event).await {
                Ok(stored) => {
                    info!(lesson_id = %lesson_id, version_no = version.version_no, "lesson shared");
                    return Ok(ShareLink {
                        url: share_url(&self.frontend_url, &stored.token),
                        token: stored.token,
                        expires_at: stored.expires_at,
                    });
                }
                Err(ShareRepositoryError::DuplicateToken) => {
                    warn!(lesson_id = %lesson_id, "share token collision; retrying");
                }
                Err(err) => return Err(map_share_error(err)),
            }
        }
        Err(map_share_error(ShareRepositoryError::duplicate_token()))
    }
}

#[async_trait]
impl<L, S> ShareQuery for ShareService<L, S>
where
    L: LessonRepository,
    S: ShareRepository,
{
    async fn get_share(&self, token: &str) -> Result<SharedLesson, Error> {
        let share = self
            .shares
            .find_by_token(token)
            .await
            .map_err(map_share_error)?
            .ok_or_else(|| Error::not_found("Share not found"))?;
        if share.is_expired(self.clock.utc()) {
            return Err(Error::gone("Share expired"));
        }
        let lesson_version = self
            .lessons
            .find_version(&share.lesson_version_id)
            .await
            .map_err(map_lesson_error)?
            .ok_or_else(|| Error::not_found("Share not found"))?;
        Ok(SharedLesson {
            lesson_id: share.lesson_id,
            lesson_version,
            expires_at: share.expires_at,
        })
    }
}
