//! Driving port for lesson reads.

use async_trait::async_trait;

use crate::domain::{Error, Lesson, LessonDetail, LessonFilters, LessonId, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LessonQuery: Send + Sync {
    /// Tenant lessons matching `filters`, most recently updated first.
    async fn list_lessons(
        &self,
        actor: &User,
        filters: LessonFilters,
    ) -> Result<Vec<Lesson>, Error>;

    /// A lesson with every version, ascending by version number.
    async fn get_lesson(&self, actor: &User, lesson_id: &LessonId) -> Result<LessonDetail, Error>;
}
