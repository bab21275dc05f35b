//! Lesson generation handler.
//!
//! ```text
//! POST /api/v1/gen-jobs {"subject":"Science","gradeLevel":"5","topic":"Water Cycle",
//!                        "durationMinutes":45,"teachingStyle":"Inquiry"}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::GenerationOutcome;
use crate::domain::{
    Error, GenerationInput, GenerationInputError, GenerationJob, Standard,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_user;
use crate::inbound::http::lessons::LessonDetailResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, out_of_range_error};

/// Request body for `POST /api/v1/gen-jobs`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequestBody {
    #[schema(example = "Science")]
    pub subject: Option<String>,
    #[schema(example = "5")]
    pub grade_level: Option<String>,
    #[schema(example = "Water Cycle")]
    pub topic: Option<String>,
    /// Between 5 and 180.
    #[schema(example = 45)]
    pub duration_minutes: Option<u32>,
    #[schema(example = "Inquiry")]
    pub teaching_style: Option<String>,
    #[serde(default)]
    pub focus_keywords: Vec<String>,
    /// Explicit standard codes; suggestions are used when absent or empty.
    pub standard_codes: Option<Vec<String>>,
}

impl TryFrom<GenerationRequestBody> for GenerationInput {
    type Error = Error;

    fn try_from(body: GenerationRequestBody) -> Result<Self, Self::Error> {
        let duration_minutes = body
            .duration_minutes
            .ok_or_else(|| missing_field_error(FieldName::new("durationMinutes")))?;
        let input = Self {
            subject: body.subject.unwrap_or_default().trim().to_owned(),
            grade_level: body.grade_level.unwrap_or_default().trim().to_owned(),
            topic: body.topic.unwrap_or_default().trim().to_owned(),
            duration_minutes,
            teaching_style: body.teaching_style.unwrap_or_default().trim().to_owned(),
            focus_keywords: body.focus_keywords,
            standard_codes: body.standard_codes,
        };
        input.validate().map_err(map_input_error)?;
        Ok(input)
    }
}

fn map_input_error(err: GenerationInputError) -> Error {
    let field = FieldName::new(err.field());
    match err {
        GenerationInputError::Blank { .. } => missing_field_error(field),
        GenerationInputError::DurationOutOfRange { .. } => out_of_range_error(field, err.to_string()),
    }
}

/// Generation job audit record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJobResponse {
    pub id: String,
    #[schema(example = "completed")]
    pub status: String,
    pub lesson_id: Option<String>,
    pub lesson_version_id: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl From<GenerationJob> for GenerationJobResponse {
    fn from(job: GenerationJob) -> Self {
        Self {
            id: job.id.to_string(),
            status: job.status.as_str().to_owned(),
            lesson_id: job.lesson_id.map(|id| id.to_string()),
            lesson_version_id: job.lesson_version_id.map(|id| id.to_string()),
            created_at: job.created_at.to_rfc3339(),
            completed_at: job.completed_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Curriculum standard aligned to a lesson version.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StandardResponse {
    pub id: String,
    pub framework_id: String,
    #[schema(example = "NGSS.5-ESS2-1")]
    pub code: String,
    pub grade_band: Option<String>,
    pub subject: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl From<Standard> for StandardResponse {
    fn from(standard: Standard) -> Self {
        Self {
            id: standard.id.to_string(),
            framework_id: standard.framework_id.to_string(),
            code: standard.code,
            grade_band: standard.grade_band,
            subject: standard.subject,
            description: standard.description,
            tags: standard.tags,
        }
    }
}

/// Result of a successful generation.
#[derive(Debug, Serialize, ToSchema)]
pub struct GenerationResponse {
    pub job: GenerationJobResponse,
    pub lesson: LessonDetailResponse,
    pub standards: Vec<StandardResponse>,
}

impl From<GenerationOutcome> for GenerationResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        Self {
            job: outcome.job.into(),
            lesson: outcome.lesson.into(),
            standards: outcome
                .standards
                .into_iter()
                .map(StandardResponse::from)
                .collect(),
        }
    }
}

/// Generate a lesson, align standards, and persist it as version #1.
///
/// Provider failures never surface here; the deterministic template
/// generator fills in.
#[utoipa::path(
    post,
    path = "/api/v1/gen-jobs",
    request_body = GenerationRequestBody,
    responses(
        (status = 201, description = "Lesson generated", body = GenerationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["generation"],
    operation_id = "generateLesson"
)]
#[post("/gen-jobs")]
pub async fn generate_lesson(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<GenerationRequestBody>,
) -> ApiResult<HttpResponse> {
    let user = current_user(&state, &session).await?;
    let input = GenerationInput::try_from(payload.into_inner())?;
    let outcome = state.generation.generate_lesson(&user, input).await?;
    Ok(HttpResponse::Created().json(GenerationResponse::from(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        FrameworkId, GenerationJobId, JobStatus, LessonDetail, StandardId, TenantId,
    };
    use crate::inbound::http::auth::callback;
    use crate::inbound::http::test_utils::{MockPorts, login_cookie, test_session_middleware};
    use crate::test_support::fixtures;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::{Map, Value, json};

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
                    .service(generate_lesson),
            )
    }

    fn request_body() -> Value {
        json!({
            "subject": "Science",
            "gradeLevel": "5",
            "topic": "Water Cycle",
            "durationMinutes": 45,
            "teachingStyle": "Inquiry",
            "focusKeywords": ["evaporation"]
        })
    }

    fn outcome(user: &crate::domain::User) -> GenerationOutcome {
        let lesson = fixtures::lesson(user.tenant_id, "Water Cycle");
        let version = fixtures::version(lesson.id, 1, Utc::now());
        let job = GenerationJob {
            id: GenerationJobId::random(),
            tenant_id: user.tenant_id,
            user_id: user.id,
            status: JobStatus::Completed,
            prompt_payload: json!({}),
            result_payload: Some(json!({ "title": "Water Cycle" })),
            error_message: None,
            lesson_id: Some(lesson.id),
            lesson_version_id: Some(version.id),
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };
        let standard = Standard {
            id: StandardId::random(),
            framework_id: FrameworkId::random(),
            code: "NGSS.5-ESS2-1".to_owned(),
            grade_band: Some("5".to_owned()),
            subject: "Science".to_owned(),
            description: "Water cycle processes".to_owned(),
            tags: vec!["water".to_owned()],
            metadata: Map::new(),
        };
        GenerationOutcome {
            job,
            lesson: LessonDetail {
                lesson,
                versions: vec![version],
            },
            standards: vec![standard],
        }
    }

    #[actix_web::test]
    async fn generation_returns_job_lesson_and_standards() {
        let user = fixtures::teacher(TenantId::random());
        let mut ports = MockPorts::default().signed_in_as(&user);
        let produced = outcome(&user);
        ports
            .generation
            .expect_generate_lesson()
            .withf(|_, input| {
                let mut expected = fixtures::water_cycle_input();
                expected.focus_keywords = vec!["evaporation".to_owned()];
                *input == expected
            })
            .times(1)
            .returning(move |_, _| Ok(produced.clone()));
        let app = actix_test::init_service(test_app(ports.into_state())).await;
        let cookie = login_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/gen-jobs")
                .cookie(cookie)
                .set_json(request_body())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["job"]["status"], "completed");
        assert_eq!(body["lesson"]["title"], "Water Cycle");
        assert_eq!(body["standards"][0]["code"], "NGSS.5-ESS2-1");
    }

    #[rstest]
    #[case::short("durationMinutes", json!(4), "out_of_range")]
    #[case::long("durationMinutes", json!(181), "out_of_range")]
    #[case::blank_topic("topic", json!("  "), "missing_field")]
    #[case::blank_style("teachingStyle", json!(""), "missing_field")]
    #[case::missing_duration("durationMinutes", Value::Null, "missing_field")]
    #[actix_web::test]
    async fn invalid_requests_never_reach_the_generator(
        #[case] field: &str,
        #[case] value: Value,
        #[case] code: &str,
    ) {
        let user = fixtures::teacher(TenantId::random());
        let app =
            actix_test::init_service(test_app(MockPorts::default().signed_in_as(&user).into_state()))
                .await;
        let cookie = login_cookie(&app).await;
        let mut body = request_body();
        body[field] = value;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/gen-jobs")
                .cookie(cookie)
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }
}
