//! Lesson versioning service.
//!
//! Implements [`LessonCommand`] and [`LessonQuery`] over a
//! [`LessonRepository`]. Versions are append-only: edits and
//! differentiation add a version, restores only move the current pointer.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    DifferentiateRequest, LessonCommand, LessonQuery, LessonRepository, NewLesson,
    NewVersionRequest, RestoreOutcome, VersionAppend,
};
use crate::domain::port_error_mapping::map_lesson_error;
use crate::domain::{
    Error, Lesson, LessonDetail, LessonFilters, LessonHeader, LessonId, LessonVersion, NewEvent,
    RestoredVersion, User, VersionDraft, actions, differentiate_content,
};

/// Lesson service implementing the lesson driving ports.
#[derive(Clone)]
pub struct LessonService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> LessonService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

impl<R> LessonService<R>
where
    R: LessonRepository,
{
    async fn load(&self, actor: &User, lesson_id: &LessonId) -> Result<LessonDetail, Error> {
        self.repo
            .find_lesson(&actor.tenant_id, lesson_id)
            .await
            .map_err(map_lesson_error)?
            .ok_or_else(|| Error::not_found("Lesson not found"))
    }
}

#[async_trait]
impl<R> LessonCommand for LessonService<R>
where
    R: LessonRepository,
{
    async fn create_lesson(
        &self,
        actor: &User,
        header: LessonHeader,
        first_version: VersionDraft,
    ) -> Result<LessonDetail, Error> {
        let now = self.clock.utc();
        let lesson_id = LessonId::random();
        let lesson = NewLesson {
            lesson_id,
            tenant_id: actor.tenant_id,
            owner_user_id: actor.id,
            header,
            first_version,
            standard_ids: Vec::new(),
            created_at: now,
        };
        let event = NewEvent::new(actor.tenant_id, Some(actor.id), actions::LESSON_CREATED, now)
            .with("lesson_id", lesson_id.to_string());

        let detail = self
            .repo
            .create_lesson(&lesson, &event)
            .await
            .map_err(map_lesson_error)?;
        info!(lesson_id = %detail.lesson.id, tenant_id = %actor.tenant_id, "lesson created");
        Ok(detail)
    }

    async fn create_version(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        request: NewVersionRequest,
    ) -> Result<LessonVersion, Error> {
        let append = VersionAppend {
            tenant_id: actor.tenant_id,
            lesson_id: *lesson_id,
            created_by_user_id: Some(actor.id),
            draft: request.draft,
            status: request.status,
            created_at: self.clock.utc(),
        };
        let version = self
            .repo
            .append_version(&append, None)
            .await
            .map_err(map_lesson_error)?;
        info!(lesson_id = %lesson_id, version_no = version.version_no, "lesson version created");
        Ok(version)
    }

    async fn restore_version(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        version_no: u32,
    ) -> Result<RestoredVersion, Error> {
        let outcome = self
            .repo
            .restore_version(&actor.tenant_id, lesson_id, version_no)
            .await
            .map_err(map_lesson_error)?;
        match outcome {
            RestoreOutcome::Restored(restored) => {
                info!(lesson_id = %lesson_id, version_no, "lesson version restored");
                Ok(restored)
            }
            RestoreOutcome::LessonMissing => Err(Error::not_found("Lesson not found")),
            RestoreOutcome::VersionMissing => Err(Error::not_found("Version not found")),
        }
    }

    async fn differentiate(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        request: DifferentiateRequest,
    ) -> Result<LessonVersion, Error> {
        let detail = self.load(actor, lesson_id).await?;
        let base = detail
            .latest_version()
            .ok_or_else(|| Error::invalid_request("Lesson has no versions"))?;
        let content = differentiate_content(
            &base.content,
            request.audience,
            request.notes.as_deref(),
        );

        let now = self.clock.utc();
        let event = NewEvent::new(
            actor.tenant_id,
            Some(actor.id),
            actions::LESSON_DIFFERENTIATED,
            now,
        )
        .with("lesson_id", lesson_id.to_string())
        .with("audience", request.audience.as_str());
        let append = VersionAppend {
            tenant_id: actor.tenant_id,
            lesson_id: *lesson_id,
            created_by_user_id: Some(actor.id),
            draft: VersionDraft::from_content(content),
            status: None,
            created_at: now,
        };

        let version = self
            .repo
            .append_version(&append, Some(&event))
            .await
            .map_err(map_lesson_error)?;
        info!(
            lesson_id = %lesson_id,
            audience = %request.audience,
            version_no = version.version_no,
            "lesson differentiated"
        );
        Ok(version)
    }
}

#[async_trait]
impl<R> LessonQuery for LessonService<R>
where
    R: LessonRepository,
{
    async fn list_lessons(
        &self,
        actor: &User,
        filters: LessonFilters,
    ) -> Result<Vec<Lesson>, Error> {
        self.repo
            .list_lessons(&actor.tenant_id, &filters)
            .await
            .map_err(map_lesson_error)
    }

    async fn get_lesson(&self, actor: &User, lesson_id: &LessonId) -> Result<LessonDetail, Error> {
        self.load(actor, lesson_id).await
    }
}

#[cfg(test)]
#[path = "lesson_service_tests.rs"]
mod tests;
