//! Driving port for lesson mutations.
//!
//! Every operation acts on behalf of an authenticated [`User`] and is scoped
//! to that user's tenant; lessons from other tenants are reported as not
//! found.

use async_trait::async_trait;

use crate::domain::{
    Audience, Error, LessonDetail, LessonHeader, LessonId, LessonStatus, LessonVersion,
    RestoredVersion, User, VersionDraft,
};

/// Content for a version appended by a teacher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewVersionRequest {
    pub draft: VersionDraft,
    /// Replaces the lesson status when present.
    pub status: Option<LessonStatus>,
}

/// Audience adaptation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifferentiateRequest {
    pub audience: Audience,
    pub notes: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LessonCommand: Send + Sync {
    /// Create a lesson with version #1 as its current version.
    async fn create_lesson(
        &self,
        actor: &User,
        header: LessonHeader,
        first_version: VersionDraft,
    ) -> Result<LessonDetail, Error>;

    /// Append a version and make it current.
    async fn create_version(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        request: NewVersionRequest,
    ) -> Result<LessonVersion, Error>;

    /// Point the lesson at an existing version.
    async fn restore_version(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        version_no: u32,
    ) -> Result<RestoredVersion, Error>;

    /// Append an audience-adapted copy of the latest version.
    async fn differentiate(
        &self,
        actor: &User,
        lesson_id: &LessonId,
        request: DifferentiateRequest,
    ) -> Result<LessonVersion, Error>;
}
