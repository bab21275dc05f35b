//! Google Classroom integration handlers.
//!
//! ```text
//! POST /api/v1/lms/google-classroom/connect {"accessToken":"ya29...","expiresIn":3600}
//! POST /api/v1/lms/google-classroom/push {"lessonId":"...","courseId":"c-101"}
//! ```
//!
//! No classroom API is called; pushes are recorded with a synthesised
//! assignment id.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::domain::{ConnectRequest, Error, LmsConnection, LmsPush, PushRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_user;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, out_of_range_error, parse_id, parse_optional_rfc3339_timestamp, require_text,
};

/// Request body for the connect endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectBody {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds; defaults to 3600.
    pub expires_in: Option<i64>,
    #[schema(value_type = Option<Object>)]
    pub profile: Option<Map<String, Value>>,
}

impl TryFrom<ConnectBody> for ConnectRequest {
    type Error = Error;

    fn try_from(body: ConnectBody) -> Result<Self, Self::Error> {
        let access_token = require_text(body.access_token, FieldName::new("accessToken"))?;
        if body.expires_in.is_some_and(|seconds| seconds < 0) {
            return Err(out_of_range_error(
                FieldName::new("expiresIn"),
                "expiresIn must not be negative",
            ));
        }
        Ok(Self {
            access_token,
            refresh_token: body.refresh_token,
            expires_in: body.expires_in,
            profile: body.profile,
        })
    }
}

/// Request body for the push endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushBody {
    pub lesson_id: Option<String>,
    pub course_id: Option<String>,
    pub topic_id: Option<String>,
    /// RFC 3339 timestamp.
    pub due_date: Option<String>,
}

impl TryFrom<PushBody> for PushRequest {
    type Error = Error;

    fn try_from(body: PushBody) -> Result<Self, Self::Error> {
        let lesson_field = FieldName::new("lessonId");
        let lesson_id = require_text(body.lesson_id, lesson_field)?;
        Ok(Self {
            lesson_id: parse_id(&lesson_id, lesson_field)?,
            course_id: require_text(body.course_id, FieldName::new("courseId"))?,
            topic_id: body.topic_id,
            due_date: parse_optional_rfc3339_timestamp(body.due_date, FieldName::new("dueDate"))?,
        })
    }
}

/// Stored connection summary; tokens are never echoed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    pub id: String,
    #[schema(example = "google_classroom")]
    pub provider: String,
    pub created_at: String,
    pub expires_at: Option<String>,
    #[schema(value_type = Object)]
    pub profile: Map<String, Value>,
}

impl From<LmsConnection> for ConnectionResponse {
    fn from(connection: LmsConnection) -> Self {
        Self {
            profile: connection.profile(),
            id: connection.id.to_string(),
            provider: connection.provider,
            created_at: connection.created_at.to_rfc3339(),
            expires_at: connection.expires_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Recorded assignment push.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    pub id: String,
    #[schema(example = "posted")]
    pub status: String,
    pub external_assignment_id: Option<String>,
    pub created_at: String,
}

impl From<LmsPush> for PushResponse {
    fn from(push: LmsPush) -> Self {
        Self {
            id: push.id.to_string(),
            status: push.status,
            external_assignment_id: push.external_assignment_id,
            created_at: push.created_at.to_rfc3339(),
        }
    }
}

/// Store Google Classroom tokens for the caller.
#[utoipa::path(
    post,
    path = "/api/v1/lms/google-classroom/connect",
    request_body = ConnectBody,
    responses(
        (status = 201, description = "Connection stored", body = ConnectionResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["lms"],
    operation_id = "connectGoogleClassroom"
)]
#[post("/lms/google-classroom/connect")]
pub async fn connect_google_classroom(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ConnectBody>,
) -> ApiResult<HttpResponse> {
    let user = current_user(&state, &session).await?;
    let request = ConnectRequest::try_from(payload.into_inner())?;
    let connection = state.lms.connect_google_classroom(&user, request).await?;
    Ok(HttpResponse::Created().json(ConnectionResponse::from(connection)))
}

/// Post a lesson to a course as an assignment.
#[utoipa::path(
    post,
    path = "/api/v1/lms/google-classroom/push",
    request_body = PushBody,
    responses(
        (status = 201, description = "Assignment recorded", body = PushResponse),
        (status = 400, description = "Invalid request or no connection", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Lesson not found", body = ErrorSchema)
    ),
    tags = ["lms"],
    operation_id = "pushGoogleClassroom"
)]
#[post("/lms/google-classroom/push")]
pub async fn push_google_classroom(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PushBody>,
) -> ApiResult<HttpResponse> {
    let user = current_user(&state, &session).await?;
    let request = PushRequest::try_from(payload.into_inner())?;
    let push = state.lms.push_google_classroom(&user, request).await?;
    Ok(HttpResponse::Created().json(PushResponse::from(push)))
}
