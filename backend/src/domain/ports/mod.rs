//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`ContentGenerator`], [`IdentityProvider`],
//! [`DocumentRenderer`]) are implemented by outbound adapters. Driving ports
//! (`*Command`, `*Query`, [`LoginService`]) are implemented by domain
//! services and consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod analytics_query;
mod content_generator;
mod document_renderer;
mod event_repository;
mod export_command;
mod generation_command;
mod generation_job_repository;
mod generation_metrics;
mod identity_provider;
mod lesson_command;
mod lesson_query;
mod lesson_repository;
mod lms_command;
mod lms_repository;
mod login_service;
mod readiness_probe;
mod share_command;
mod share_query;
mod share_repository;
mod standards_repository;
mod user_admin_command;
mod user_profile_command;
mod user_repository;
mod users_query;

#[cfg(test)]
pub use analytics_query::{MockAnalyticsQuery, MockMetricsRebuildCommand};
pub use analytics_query::{AnalyticsQuery, MetricsRebuildCommand};
#[cfg(test)]
pub use content_generator::MockContentGenerator;
pub use content_generator::{
    ContentGenerator, ContentGeneratorError, GeneratorReply, UnconfiguredContentGenerator,
};
#[cfg(test)]
pub use document_renderer::MockDocumentRenderer;
pub use document_renderer::{DocumentRenderError, DocumentRenderer};
#[cfg(test)]
pub use event_repository::MockEventRepository;
pub use event_repository::{EventRepository, EventRepositoryError, FixtureEventRepository};
pub use export_command::ExportCommand;
#[cfg(test)]
pub use export_command::MockExportCommand;
pub use generation_command::{GenerationCommand, GenerationOutcome};
#[cfg(test)]
pub use generation_command::MockGenerationCommand;
#[cfg(test)]
pub use generation_job_repository::MockGenerationJobRepository;
pub use generation_job_repository::{
    FixtureGenerationJobRepository, GenerationJobRepository, GenerationJobRepositoryError,
};
#[cfg(test)]
pub use generation_metrics::MockGenerationMetrics;
pub use generation_metrics::{
    ContentSource, GenerationMetrics, GenerationMetricsError, NoOpGenerationMetrics,
};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{
    FixtureIdentityProvider, IdentityProvider, IdentityProviderError,
    UnconfiguredIdentityProvider,
};
#[cfg(test)]
pub use lesson_command::MockLessonCommand;
pub use lesson_command::{DifferentiateRequest, LessonCommand, NewVersionRequest};
pub use lesson_query::LessonQuery;
#[cfg(test)]
pub use lesson_query::MockLessonQuery;
#[cfg(test)]
pub use lesson_repository::MockLessonRepository;
pub use lesson_repository::{
    FixtureLessonRepository, LessonRepository, LessonRepositoryError, NewLesson, RestoreOutcome,
    VersionAppend,
};
pub use lms_command::LmsCommand;
#[cfg(test)]
pub use lms_command::MockLmsCommand;
#[cfg(test)]
pub use lms_repository::MockLmsRepository;
pub use lms_repository::{FixtureLmsRepository, LmsRepository, LmsRepositoryError};
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use readiness_probe::MockReadinessProbe;
pub use readiness_probe::{ReadinessError, ReadinessProbe};
#[cfg(test)]
pub use share_command::MockShareCommand;
pub use share_command::ShareCommand;
#[cfg(test)]
pub use share_query::MockShareQuery;
pub use share_query::ShareQuery;
#[cfg(test)]
pub use share_repository::MockShareRepository;
pub use share_repository::{FixtureShareRepository, ShareRepository, ShareRepositoryError};
#[cfg(test)]
pub use standards_repository::MockStandardsRepository;
pub use standards_repository::{
    FixtureStandardsRepository, StandardsRepository, StandardsRepositoryError,
};
#[cfg(test)]
pub use user_admin_command::MockUserAdminCommand;
pub use user_admin_command::{AdminUserUpdate, InviteUserRequest, UserAdminCommand};
#[cfg(test)]
pub use user_profile_command::MockUserProfileCommand;
pub use user_profile_command::{ProfileUpdate, UserProfileCommand};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    FixtureUserRepository, NewUser, UserPersistenceError, UserRepository, UserUpdate,
};
#[cfg(test)]
pub use users_query::MockUsersQuery;
pub use users_query::UsersQuery;
