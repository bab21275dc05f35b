//! Translation of driven-port failures into domain [`Error`] values.
//!
//! Connection failures surface as `503`, query failures as `500`. Messages
//! of internal errors are redacted at the HTTP boundary, so the adapter
//! detail kept here only reaches logs.

use tracing::debug;

use super::Error;
use super::ports::{
    EventRepositoryError, GenerationJobRepositoryError, IdentityProviderError,
    LessonRepositoryError, LmsRepositoryError, ShareRepositoryError, StandardsRepositoryError,
    UserPersistenceError,
};

fn unavailable(repository: &str, message: &str) -> Error {
    debug!(repository, detail = message, "repository unavailable");
    Error::service_unavailable(format!("{repository} repository unavailable: {message}"))
}

fn failed(repository: &str, message: &str) -> Error {
    Error::internal(format!("{repository} repository error: {message}"))
}

pub(crate) fn map_lesson_error(error: LessonRepositoryError) -> Error {
    match error {
        LessonRepositoryError::Connection { message } => unavailable("lesson", &message),
        LessonRepositoryError::Query { message } => failed("lesson", &message),
        LessonRepositoryError::LessonNotFound => Error::not_found("Lesson not found"),
        LessonRepositoryError::Conflict { message } => {
            Error::conflict(format!("concurrent lesson update: {message}"))
        }
    }
}

pub(crate) fn map_standards_error(error: StandardsRepositoryError) -> Error {
    match error {
        StandardsRepositoryError::Connection { message } => unavailable("standards", &message),
        StandardsRepositoryError::Query { message } => failed("standards", &message),
    }
}

pub(crate) fn map_event_error(error: EventRepositoryError) -> Error {
    match error {
        EventRepositoryError::Connection { message } => unavailable("event", &message),
        EventRepositoryError::Query { message } => failed("event", &message),
    }
}

pub(crate) fn map_job_error(error: GenerationJobRepositoryError) -> Error {
    match error {
        GenerationJobRepositoryError::Connection { message } => {
            unavailable("generation job", &message)
        }
        GenerationJobRepositoryError::Query { message } => failed("generation job", &message),
        GenerationJobRepositoryError::AlreadyFinished { job_id } => {
            Error::conflict(format!("generation job {job_id} already finished"))
        }
    }
}

pub(crate) fn map_share_error(error: ShareRepositoryError) -> Error {
    match error {
        ShareRepositoryError::Connection { message } => unavailable("share", &message),
        ShareRepositoryError::Query { message } => failed("share", &message),
        ShareRepositoryError::DuplicateToken => Error::conflict("share token collision"),
    }
}

pub(crate) fn map_lms_error(error: LmsRepositoryError) -> Error {
    match error {
        LmsRepositoryError::Connection { message } => unavailable("lms", &message),
        LmsRepositoryError::Query { message } => failed("lms", &message),
    }
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => unavailable("user", &message),
        UserPersistenceError::Query { message } => failed("user", &message),
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict(format!("user with email {email} already exists"))
        }
    }
}

pub(crate) fn map_identity_error(error: IdentityProviderError) -> Error {
    match error {
        IdentityProviderError::NotConfigured => {
            Error::service_unavailable("OAuth provider not configured")
        }
        IdentityProviderError::Rejected { message } => {
            debug!(detail = %message, "authorization code rejected");
            Error::unauthorized("Invalid authorization code")
        }
        IdentityProviderError::Transport { message } => unavailable("identity provider", &message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(LessonRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(LessonRepositoryError::query("syntax"), ErrorCode::InternalError)]
    #[case(LessonRepositoryError::lesson_not_found(), ErrorCode::NotFound)]
    #[case(LessonRepositoryError::conflict("version 3"), ErrorCode::Conflict)]
    fn lesson_errors_map_to_codes(#[case] error: LessonRepositoryError, #[case] code: ErrorCode) {
        assert_eq!(map_lesson_error(error).code(), code);
    }

    #[rstest]
    fn duplicate_email_is_conflict() {
        let error = map_user_error(UserPersistenceError::duplicate_email("ada@example.edu"));
        assert_eq!(error.code(), ErrorCode::Conflict);
        assert!(error.message().contains("ada@example.edu"));
    }

    #[rstest]
    fn finished_job_is_conflict() {
        let error = map_job_error(GenerationJobRepositoryError::already_finished("job-1"));
        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[case(IdentityProviderError::not_configured(), ErrorCode::ServiceUnavailable)]
    #[case(IdentityProviderError::rejected("bad code"), ErrorCode::Unauthorized)]
    #[case(IdentityProviderError::transport("timeout"), ErrorCode::ServiceUnavailable)]
    fn identity_errors_map_to_codes(#[case] error: IdentityProviderError, #[case] code: ErrorCode) {
        assert_eq!(map_identity_error(error).code(), code);
    }
}
