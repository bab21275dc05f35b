//! Google Classroom connection storage and stubbed assignment posting.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use mockable::Clock;
use serde_json::{Map, Value};
use tracing::info;

use crate::domain::port_error_mapping::{map_lesson_error, map_lms_error};
use crate::domain::ports::{LessonRepository, LmsCommand, LmsRepository};
use crate::domain::{
    ConnectRequest, DEFAULT_TOKEN_TTL_SECONDS, Error, GOOGLE_CLASSROOM, LmsConnection, LmsPush,
    NewEvent, NewLmsPush, PUSH_STATUS_POSTED, PushRequest, User, actions, mock_assignment_id,
};

/// LMS service implementing [`LmsCommand`].
#[derive(Clone)]
pub struct LmsService<L, R> {
    lessons: Arc<L>,
    lms: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<L, R> LmsService<L, R> {
    pub fn new(lessons: Arc<L>, lms: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            lessons,
            lms,
            clock,
        }
    }
}

#[async_trait]
impl<L, R> LmsCommand for LmsService<L, R>
where
    L: LessonRepository,
    R: LmsRepository,
{
    async fn connect_google_classroom(
        &self,
        actor: &User,
        mut request: ConnectRequest,
    ) -> Result<LmsConnection, Error> {
        if request.access_token.trim().is_empty() {
            return Err(Error::invalid_request("accessToken must not be empty"));
        }
        let expires_in = request.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECONDS);
        if expires_in < 0 {
            return Err(Error::invalid_request("expiresIn must not be negative"));
        }
        request.expires_in = Some(expires_in);

        let record = request.into_new_connection(actor.tenant_id, actor.id, self.clock.utc());
        let connection = self
            .lms
            .insert_connection(&record)
            .await
            .map_err(map_lms_error)?;
        info!(user_id = %actor.id, provider = GOOGLE_CLASSROOM, "lms connection stored");
        Ok(connection)
    }

    async fn push_google_classroom(
        &self,
        actor: &User,
        request: PushRequest,
    ) -> Result<LmsPush, Error> {
        let connection = self
            .lms
            .latest_connection(&actor.id, GOOGLE_CLASSROOM)
            .await
            .map_err(map_lms_error)?
            .ok_or_else(|| {
                Error::invalid_request("No Google Classroom connection found for user")
            })?;
        let lesson = self
            .lessons
            .find_header(&actor.tenant_id, &request.lesson_id)
            .await
            .map_err(map_lesson_error)?
            .ok_or_else(|| Error::not_found("Lesson not found"))?;

        let now = self.clock.utc();
        let mut metadata = Map::new();
        metadata.insert("title".to_owned(), Value::from(lesson.title.clone()));
        metadata.insert(
            "posted_at".to_owned(),
            Value::from(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        let push = NewLmsPush {
            tenant_id: actor.tenant_id,
            connection_id: connection.id,
            lesson_id: lesson.id,
            lesson_version_id: lesson.current_version_id,
            course_id: request.course_id.clone(),
            topic_id: request.topic_id,
            due_date: request.due_date,
            status: PUSH_STATUS_POSTED.to_owned(),
            external_assignment_id: Some(mock_assignment_id()),
            metadata,
        };
        let event = NewEvent::new(actor.tenant_id, Some(actor.id), actions::LMS_PUSH, now)
            .with("lesson_id", lesson.id.to_string())
            .with("course_id", request.course_id);

        let stored = self
            .lms
            .insert_push(&push, &event)
            .await
            .map_err(map_lms_error)?;
        info!(lesson_id = %lesson.id, course_id = %stored.course_id, "lesson pushed to classroom");
        Ok(stored)
    }
}
