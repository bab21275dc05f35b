//! Domain primitives, aggregates, and services.
//!
//! Purpose: Define strongly typed lesson-planning entities used by the API
//! and persistence layers, and the services that implement the driving
//! ports. Keep types immutable and document invariants and serialisation
//! contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Lesson, LessonVersion: versioned lesson aggregate.
//! - User, TenantScope: tenancy and identity.
//! - Services (`LessonService`, `GenerationService`, ...) implementing the
//!   driving ports in [`ports`].

pub mod account_service;
pub mod analytics_service;
pub mod differentiation;
pub mod error;
pub mod events;
pub mod export;
pub mod export_service;
pub mod generation;
pub mod generation_service;
pub mod ids;
pub mod lesson;
pub mod lesson_service;
pub mod lms;
pub mod lms_service;
pub(crate) mod port_error_mapping;
pub mod ports;
pub mod share;
pub mod share_service;
pub mod standards;
pub mod standards_service;
pub mod tenancy;
pub mod trace_id;
pub mod user;

pub use self::account_service::{AccountService, LoginPolicy};
pub use self::analytics_service::AnalyticsService;
pub use self::differentiation::{Audience, UnknownAudienceError, differentiate_content};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::events::{
    AnalyticsSummary, DEFAULT_SUMMARY_DAYS, Event, MAX_SUMMARY_DAYS,
    MINUTES_SAVED_PER_GENERATED_LESSON, MetricTotals, NewEvent, SummaryWindow, actions,
    metric_for_action, metrics,
};
pub use self::export::{
    DOCX_CONTENT_TYPE, ExportArtifact, ExportDocument, ExportFormat, PDF_CONTENT_TYPE, Section,
    SectionBody, UnsupportedFormatError, filename_base,
};
pub use self::export_service::{ExportService, Renderers};
pub use self::generation::{
    DEFAULT_PROMPT_TEMPLATE, FALLBACK_GENERATOR, GeneratedLesson, GenerationInput,
    GenerationInputError, GenerationJob, JobOutcome, JobStatus, MAX_DURATION_MINUTES,
    MIN_DURATION_MINUTES, ProviderOutputError, fallback_lesson, parse_provider_output,
};
pub use self::generation_service::GenerationService;
pub use self::ids::{
    BlockId, DistrictId, EventId, FrameworkId, GenerationJobId, LessonId, LmsConnectionId,
    LmsPushId, SchoolId, ShareId, StandardId, TenantId, UserId, VersionId,
};
pub use self::lesson::{
    BlockDraft, DEFAULT_BLOCK_TYPE, DEFAULT_LANGUAGE, DifferentiationEntry, FlowStep, Lesson,
    LessonBlock, LessonDetail, LessonFilters, LessonHeader, LessonStatus, LessonVersion,
    MaterialItem, ParseLessonEnumError, RestoredVersion, TypedNote, VersionContent, VersionDraft,
    Visibility, next_version_no,
};
pub use self::lesson_service::LessonService;
pub use self::lms::{
    ConnectRequest, DEFAULT_TOKEN_TTL_SECONDS, GOOGLE_CLASSROOM, LmsConnection, LmsPush,
    NewLmsConnection, NewLmsPush, PUSH_STATUS_POSTED, PushRequest, mock_assignment_id,
};
pub use self::lms_service::LmsService;
pub use self::share::{
    DEFAULT_SHARE_TTL_HOURS, NewShare, Share, ShareLink, SharedLesson, TOKEN_ALPHABET,
    TOKEN_LENGTH, generate_share_token, share_expiry, share_url,
};
pub use self::share_service::ShareService;
pub use self::standards::{
    CatalogueFramework, CatalogueStandard, DEFAULT_SUGGESTION_LIMIT, NewStandard, Standard,
    StandardsCatalogue, StandardsFramework, normalise_keywords, rank_standards, score_standard,
};
pub use self::standards_service::StandardsService;
pub use self::tenancy::{
    DEFAULT_DISTRICT_NAME, DEFAULT_SCHOOL_NAME, District, School, Tenant, TenantScope,
};
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, ExternalIdentity, Role, User, UserValidationError, email_domain_permitted,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use lessonplan::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
