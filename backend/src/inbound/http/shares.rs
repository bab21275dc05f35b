//! Share link handlers.
//!
//! ```text
//! POST /api/v1/lessons/{lesson_id}/share {"expiresInHours":24}
//! GET  /api/v1/shares/{token}
//! ```
//!
//! The body is optional. `expiresInHours` defaults to 72 when absent; an
//! explicit `null` creates a link that never expires. A body that is present
//! but malformed is rejected. Resolving a share needs no session.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::domain::{DEFAULT_SHARE_TTL_HOURS, Error, LessonId, ShareLink, SharedLesson};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_user;
use crate::inbound::http::lessons_dto::{LessonPath, LessonVersionResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, out_of_range_error, parse_id};

#[derive(Debug, Deserialize)]
pub(super) struct SharePath {
    pub(super) token: String,
}

/// Request body for `POST /api/v1/lessons/{lesson_id}/share`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareBody {
    /// Hours until expiry (at least 1). Defaults to 72; `null` never expires.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<u32>, example = 72)]
    pub expires_in_hours: Option<Option<i64>>,
}

// Distinguishes an explicit `null` from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

impl CreateShareBody {
    /// Parse an optional JSON body; an empty body means every default.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, Error> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(raw)
            .map_err(|err| Error::invalid_request(format!("Invalid JSON body: {err}")))
    }

    /// Resolve the requested lifetime; `None` means the link never expires.
    pub fn ttl_hours(&self) -> Result<Option<u32>, Error> {
        match self.expires_in_hours {
            None => Ok(Some(DEFAULT_SHARE_TTL_HOURS)),
            Some(None) => Ok(None),
            Some(Some(hours)) => u32::try_from(hours)
                .ok()
                .filter(|hours| *hours >= 1)
                .map(Some)
                .ok_or_else(|| {
                    out_of_range_error(
                        FieldName::new("expiresInHours"),
                        "expiresInHours must be at least 1",
                    )
                }),
        }
    }
}

/// A freshly created share link.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    #[schema(example = "Qm3xY8kT2pLr")]
    pub token: String,
    #[schema(example = "https://app.example.edu/share/Qm3xY8kT2pLr")]
    pub url: String,
    pub expires_at: Option<String>,
}

impl From<ShareLink> for ShareLinkResponse {
    fn from(link: ShareLink) -> Self {
        Self {
            token: link.token,
            url: link.url,
            expires_at: link.expires_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// The snapshot an anonymous viewer receives.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharedLessonResponse {
    pub lesson_id: String,
    pub lesson_version: LessonVersionResponse,
    pub expires_at: Option<String>,
}

impl From<SharedLesson> for SharedLessonResponse {
    fn from(shared: SharedLesson) -> Self {
        Self {
            lesson_id: shared.lesson_id.to_string(),
            lesson_version: shared.lesson_version.into(),
            expires_at: shared.expires_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Share the lesson's latest version through an unguessable token.
#[utoipa::path(
    post,
    path = "/api/v1/lessons/{lesson_id}/share",
    params(("lesson_id" = String, Path, description = "Lesson identifier")),
    request_body = CreateShareBody,
    responses(
        (status = 201, description = "Share created", body = ShareLinkResponse),
        (status = 400, description = "Invalid lifetime or lesson has no versions", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Lesson not found", body = ErrorSchema)
    ),
    tags = ["shares"],
    operation_id = "createShare"
)]
#[post("/lessons/{lesson_id}/share")]
pub async fn create_share(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<LessonPath>,
    payload: web::Bytes,
) -> ApiResult<HttpResponse> {
    let user = current_user(&state, &session).await?;
    let lesson_id: LessonId = parse_id(&path.lesson_id, FieldName::new("lessonId"))?;
    let ttl_hours = CreateShareBody::from_bytes(&payload)?.ttl_hours()?;
    let link = state
        .shares
        .create_share(&user, &lesson_id, ttl_hours)
        .await?;
    Ok(HttpResponse::Created().json(ShareLinkResponse::from(link)))
}

/// Resolve a share token without authentication.
#[utoipa::path(
    get,
    path = "/api/v1/shares/{token}",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Shared lesson version", body = SharedLessonResponse),
        (status = 404, description = "Share not found", body = ErrorSchema),
        (status = 410, description = "Share expired", body = ErrorSchema)
    ),
    tags = ["shares"],
    operation_id = "getShare",
    security([])
)]
#[get("/shares/{token}")]
pub async fn get_share(
    state: web::Data<HttpState>,
    path: web::Path<SharePath>,
) -> ApiResult<web::Json<SharedLessonResponse>> {
    let shared = state.shares_query.get_share(&path.token).await?;
    Ok(web::Json(SharedLessonResponse::from(shared)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TenantId;
    use crate::inbound::http::auth::callback;
    use crate::inbound::http::test_utils::{MockPorts, login_cookie, test_session_middleware};
    use crate::test_support::fixtures;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::{Duration, Utc};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(test_session_middleware())
            .service(
                web::scope("/api/v1")
                    .service(callback)
                    .service(create_share)
                    .service(get_share),
            )
    }

    #[rstest]
    #[case::absent(json!({}), Some(72))]
    #[case::explicit(json!({ "expiresInHours": 24 }), Some(24))]
    #[case::never(json!({ "expiresInHours": null }), None)]
    fn lifetime_defaults_and_null(#[case] raw: Value, #[case] expected: Option<u32>) {
        let body: CreateShareBody = serde_json::from_value(raw).expect("body");
        assert_eq!(body.ttl_hours().expect("valid"), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    fn lifetime_must_be_positive(#[case] hours: i64) {
        let body: CreateShareBody =
            serde_json::from_value(json!({ "expiresInHours": hours })).expect("body");
        let err = body.ttl_hours().expect_err("rejected");
        assert_eq!(
            err.details().and_then(|d| d.get("code")).and_then(Value::as_str),
            Some("out_of_range")
        );
    }

    #[actix_web::test]
    async fn create_share_uses_the_default_lifetime_without_a_body() {
        let user = fixtures::teacher(TenantId::random());
        let mut ports = MockPorts::default().signed_in_as(&user);
        let expires_at = Utc::now() + Duration::hours(72);
        ports
            .shares
            .expect_create_share()
            .withf(|_, _, ttl| *ttl == Some(72))
            .times(1)
            .returning(move |_, _, _| {
                Ok(ShareLink {
                    token: "Qm3xY8kT2pLr".to_owned(),
                    url: "http://localhost:3000/share/Qm3xY8kT2pLr".to_owned(),
                    expires_at: Some(expires_at),
                })
            });
        let app = actix_test::init_service(test_app(ports.into_state())).await;
        let cookie = login_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/lessons/{}/share", LessonId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["token"], "Qm3xY8kT2pLr");
        assert_eq!(body["expiresAt"], json!(expires_at.to_rfc3339()));
    }

    #[rstest]
    #[case::empty(b"".as_slice(), Some(72))]
    #[case::blank(b" \n".as_slice(), Some(72))]
    #[case::object(br#"{"expiresInHours":6}"#.as_slice(), Some(6))]
    fn optional_body_parses_to_a_lifetime(#[case] raw: &[u8], #[case] expected: Option<u32>) {
        let body = CreateShareBody::from_bytes(raw).expect("body parses");
        assert_eq!(body.ttl_hours().expect("valid"), expected);
    }

    #[rstest]
    #[case::string_hours(r#"{"expiresInHours":"abc"}"#)]
    #[case::fractional_hours(r#"{"expiresInHours":1.5}"#)]
    #[case::not_json("{not json")]
    #[actix_web::test]
    async fn malformed_bodies_are_rejected_before_sharing(#[case] raw: &'static str) {
        let user = fixtures::teacher(TenantId::random());
        let mut ports = MockPorts::default().signed_in_as(&user);
        ports.shares.expect_create_share().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;
        let cookie = login_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/lessons/{}/share", LessonId::random()))
                .cookie(cookie)
                .insert_header(("content-type", "application/json"))
                .set_payload(raw)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["code"], "invalid_request");
    }

    #[actix_web::test]
    async fn shares_resolve_without_a_session() {
        let lesson_id = LessonId::random();
        let version = fixtures::version(lesson_id, 2, Utc::now());
        let mut ports = MockPorts::default();
        ports
            .shares_query
            .expect_get_share()
            .withf(|token| token == "Qm3xY8kT2pLr")
            .times(1)
            .returning(move |_| {
                Ok(SharedLesson {
                    lesson_id,
                    lesson_version: version.clone(),
                    expires_at: None,
                })
            });
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/shares/Qm3xY8kT2pLr")
                .to_request(),
        )
        .await;
        assert_eq!(body["lessonId"], json!(lesson_id.to_string()));
        assert_eq!(body["lessonVersion"]["versionNo"], 2);
        assert_eq!(body["expiresAt"], Value::Null);
    }

    #[rstest]
    #[case::unknown(Error::not_found("Share not found"), StatusCode::NOT_FOUND)]
    #[case::expired(Error::gone("Share expired"), StatusCode::GONE)]
    #[actix_web::test]
    async fn unresolvable_shares_map_to_status(#[case] err: Error, #[case] status: StatusCode) {
        let mut ports = MockPorts::default();
        ports
            .shares_query
            .expect_get_share()
            .returning(move |_| Err(err.clone()));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/shares/abc").to_request(),
        )
        .await;
        assert_eq!(res.status(), status);
    }
}
