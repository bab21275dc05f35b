//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint in the inbound layer together with
//! the request and response DTOs, the domain error wrappers
//! ([`ErrorSchema`], [`ErrorCodeSchema`]), and the session cookie security
//! scheme.
//!
//! The generated document is served by Swagger UI in debug builds and written
//! out by `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::analytics::{AnalyticsSummaryResponse, RebuildResponse};
use crate::inbound::http::auth::{CallbackRequest, LogoutResponse, SessionStatusResponse};
use crate::inbound::http::generation::{
    GenerationJobResponse, GenerationRequestBody, GenerationResponse, StandardResponse,
};
use crate::inbound::http::health::VersionResponse;
use crate::inbound::http::lessons::{
    BlockDto, CreateLessonBody, DifferentiateBody, DifferentiationDto, FlowStepDto,
    LessonBlockResponse, LessonDetailResponse, LessonSummaryResponse, LessonVersionResponse,
    MaterialDto, NewVersionBody, RestoreResponse, TypedNoteDto, VersionFields,
};
use crate::inbound::http::lms::{ConnectBody, ConnectionResponse, PushBody, PushResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::shares::{CreateShareBody, ShareLinkResponse, SharedLessonResponse};
use crate::inbound::http::users::{InviteUserBody, ProfileBody, UpdateUserBody, UserResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/callback.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Lesson planner API",
        description = "Multi-tenant lesson planning: versioned lessons, AI generation, \
                       exports, shares, analytics, and LMS pushes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::callback,
        crate::inbound::http::auth::session_status,
        crate::inbound::http::auth::logout,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::invite_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::get_me,
        crate::inbound::http::users::update_me,
        crate::inbound::http::lessons::list_lessons,
        crate::inbound::http::lessons::create_lesson,
        crate::inbound::http::lessons::get_lesson,
        crate::inbound::http::lessons::create_version,
        crate::inbound::http::lessons::restore_version,
        crate::inbound::http::lessons::differentiate_lesson,
        crate::inbound::http::lessons::export_lesson,
        crate::inbound::http::generation::generate_lesson,
        crate::inbound::http::shares::create_share,
        crate::inbound::http::shares::get_share,
        crate::inbound::http::analytics::summary,
        crate::inbound::http::analytics::rebuild,
        crate::inbound::http::lms::connect_google_classroom,
        crate::inbound::http::lms::push_google_classroom,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::http::health::version,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CallbackRequest,
        SessionStatusResponse,
        LogoutResponse,
        UserResponse,
        InviteUserBody,
        UpdateUserBody,
        ProfileBody,
        MaterialDto,
        FlowStepDto,
        DifferentiationDto,
        TypedNoteDto,
        BlockDto,
        VersionFields,
        CreateLessonBody,
        NewVersionBody,
        DifferentiateBody,
        LessonBlockResponse,
        LessonVersionResponse,
        LessonSummaryResponse,
        LessonDetailResponse,
        RestoreResponse,
        GenerationRequestBody,
        GenerationJobResponse,
        StandardResponse,
        GenerationResponse,
        CreateShareBody,
        ShareLinkResponse,
        SharedLessonResponse,
        AnalyticsSummaryResponse,
        RebuildResponse,
        ConnectBody,
        ConnectionResponse,
        PushBody,
        PushResponse,
        VersionResponse,
    )),
    tags(
        (name = "auth", description = "Sign-in and session management"),
        (name = "users", description = "Tenant user administration"),
        (name = "profile", description = "The signed-in user's profile"),
        (name = "lessons", description = "Versioned lessons, differentiation, and export"),
        (name = "generation", description = "AI lesson generation"),
        (name = "shares", description = "Public share links"),
        (name = "analytics", description = "Tenant activity metrics"),
        (name = "lms", description = "Google Classroom integration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
