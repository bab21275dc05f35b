//! Lesson API handlers.
//!
//! ```text
//! GET  /api/v1/lessons?subject=Science&gradeLevel=5&tags=water,cycle
//! POST /api/v1/lessons
//! GET  /api/v1/lessons/{lesson_id}
//! POST /api/v1/lessons/{lesson_id}/versions
//! POST /api/v1/lessons/{lesson_id}/restore/{version_no}
//! POST /api/v1/lessons/{lesson_id}/differentiate {"audience":"ELL"}
//! GET  /api/v1/lessons/{lesson_id}/export?format=pdf
//! ```

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, post, web};

use crate::domain::ports::{DifferentiateRequest, NewVersionRequest};
use crate::domain::{
    Error, ExportArtifact, ExportFormat, LessonFilters, LessonId, UnsupportedFormatError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_user;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error, parse_id};

pub use super::lessons_dto::*;

fn lesson_id(raw: &str) -> Result<LessonId, Error> {
    parse_id(raw, FieldName::new("lessonId"))
}

/// List lessons in the caller's tenant, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/v1/lessons",
    params(
        ("subject" = Option<String>, Query, description = "Exact subject"),
        ("gradeLevel" = Option<String>, Query, description = "Exact grade level"),
        ("tags" = Option<String>, Query, description = "Comma-separated tags; all must match")
    ),
    responses(
        (status = 200, description = "Lessons", body = [LessonSummaryResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["lessons"],
    operation_id = "listLessons"
)]
#[get("/lessons")]
pub async fn list_lessons(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<LessonListQuery>,
) -> ApiResult<web::Json<Vec<LessonSummaryResponse>>> {
    let user = current_user(&state, &session).await?;
    let lessons = state
        .lessons_query
        .list_lessons(&user, LessonFilters::from(query.into_inner()))
        .await?;
    Ok(web::Json(
        lessons.into_iter().map(LessonSummaryResponse::from).collect(),
    ))
}

/// Create a lesson together with its first version.
#[utoipa::path(
    post,
    path = "/api/v1/lessons",
    request_body = CreateLessonBody,
    responses(
        (status = 201, description = "Lesson created", body = LessonDetailResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["lessons"],
    operation_id = "createLesson"
)]
#[post("/lessons")]
pub async fn create_lesson(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateLessonBody>,
) -> ApiResult<HttpResponse> {
    let user = current_user(&state, &session).await?;
    let (header, first_version) = payload.into_inner().into_parts()?;
    let detail = state
        .lessons
        .create_lesson(&user, header, first_version)
        .await?;
    Ok(HttpResponse::Created().json(LessonDetailResponse::from(detail)))
}

/// Fetch a lesson with all of its versions.
#[utoipa::path(
    get,
    path = "/api/v1/lessons/{lesson_id}",
    params(("lesson_id" = String, Path, description = "Lesson identifier")),
    responses(
        (status = 200, description = "Lesson", body = LessonDetailResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Lesson not found", body = ErrorSchema)
    ),
    tags = ["lessons"],
    operation_id = "getLesson"
)]
#[get("/lessons/{lesson_id}")]
pub async fn get_lesson(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<LessonPath>,
) -> ApiResult<web::Json<LessonDetailResponse>> {
    let user = current_user(&state, &session).await?;
    let id = lesson_id(&path.lesson_id)?;
    let detail = state.lessons_query.get_lesson(&user, &id).await?;
    Ok(web::Json(LessonDetailResponse::from(detail)))
}

/// Append a version and make it current.
#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/versions",
    params(("lesson_id" = String, Path, description = "Lesson identifier")),
    request_body = NewVersionBody,
    responses(
        (status = 201, description = "Version created", body = LessonVersionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Lesson not found", body = ErrorSchema),
        (status = 409, description = "Concurrent version write", body = ErrorSchema)
    ),
    tags = ["lessons"],
    operation_id = "createLessonVersion"
)]
#[post("/lessons/{lesson_id}/versions")]
pub async fn create_version(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<LessonPath>,
    payload: web::Json<NewVersionBody>,
) -> ApiResult<HttpResponse> {
    let user = current_user(&state, &session).await?;
    let id = lesson_id(&path.lesson_id)?;
    let request = NewVersionRequest::try_from(payload.into_inner())?;
    let version = state.lessons.create_version(&user, &id, request).await?;
    Ok(HttpResponse::Created().json(LessonVersionResponse::from(version)))
}

/// Point the lesson at an existing version.
#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/restore/{version_no}",
    params(
        ("lesson_id" = String, Path, description = "Lesson identifier"),
        ("version_no" = u32, Path, description = "Version number to restore")
    ),
    responses(
        (status = 200, description = "Pointer moved", body = RestoreResponse),
        (status = 404, description = "Lesson or version not found", body = ErrorSchema)
    ),
    tags = ["lessons"],
    operation_id = "restoreLessonVersion"
)]
#[post("/lessons/{lesson_id}/restore/{version_no}")]
pub async fn restore_version(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<RestorePath>,
) -> ApiResult<web::Json<RestoreResponse>> {
    let user = current_user(&state, &session).await?;
    let id = lesson_id(&path.lesson_id)?;
    let restored = state
        .lessons
        .restore_version(&user, &id, path.version_no)
        .await?;
    Ok(web::Json(RestoreResponse::from(restored)))
}

/// Derive a version adapted for an audience from the latest version.
#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/differentiate",
    params(("lesson_id" = String, Path, description = "Lesson identifier")),
    request_body = DifferentiateBody,
    responses(
        (status = 201, description = "Differentiated version", body = LessonVersionResponse),
        (status = 400, description = "Unknown audience or lesson has no versions", body = ErrorSchema),
        (status = 404, description = "Lesson not found", body = ErrorSchema)
    ),
    tags = ["lessons"],
    operation_id = "differentiateLesson"
)]
#[post("/lessons/{lesson_id}/differentiate")]
pub async fn differentiate_lesson(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<LessonPath>,
    payload: web::Json<DifferentiateBody>,
) -> ApiResult<HttpResponse> {
    let user = current_user(&state, &session).await?;
    let id = lesson_id(&path.lesson_id)?;
    let body = payload.into_inner();
    let request = DifferentiateRequest {
        audience: body.audience()?,
        notes: body.notes,
    };
    let version = state.lessons.differentiate(&user, &id, request).await?;
    Ok(HttpResponse::Created().json(LessonVersionResponse::from(version)))
}

/// Export the latest version as PDF, DOCX, or a Google Docs payload.
#[utoipa::path(
    get,
    path = "/api/v1/lessons/{lesson_id}/export",
    params(
        ("lesson_id" = String, Path, description = "Lesson identifier"),
        ("format" = String, Query, description = "pdf, docx, or gdoc")
    ),
    responses(
        (status = 200, description = "Exported document or Google Docs payload"),
        (status = 400, description = "Unsupported format or no versions", body = ErrorSchema),
        (status = 404, description = "Lesson not found", body = ErrorSchema)
    ),
    tags = ["lessons"],
    operation_id = "exportLesson"
)]
#[get("/lessons/{lesson_id}/export")]
pub async fn export_lesson(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<LessonPath>,
    query: web::Query<ExportQuery>,
) -> ApiResult<HttpResponse> {
    let user = current_user(&state, &session).await?;
    let id = lesson_id(&path.lesson_id)?;
    let field = FieldName::new("format");
    let raw = query.into_inner().format.unwrap_or_default();
    let format: ExportFormat = raw
        .parse()
        .map_err(|err: UnsupportedFormatError| invalid_value_error(field, err.to_string(), &raw))?;
    let artifact = state.exports.export_lesson(&user, &id, format).await?;
    Ok(artifact_response(artifact))
}

fn artifact_response(artifact: ExportArtifact) -> HttpResponse {
    match artifact {
        ExportArtifact::File {
            content_type,
            filename,
            bytes,
        } => HttpResponse::Ok()
            .content_type(content_type)
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(filename)],
            })
            .body(bytes),
        ExportArtifact::Json(payload) => HttpResponse::Ok().json(payload),
    }
}

#[cfg(test)]
#[path = "lessons_tests.rs"]
mod tests;
