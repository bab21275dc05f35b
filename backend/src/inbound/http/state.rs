//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AnalyticsQuery, ExportCommand, GenerationCommand, LessonCommand, LessonQuery, LmsCommand,
    LoginService, MetricsRebuildCommand, ShareCommand, ShareQuery, UserAdminCommand,
    UserProfileCommand, UsersQuery,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```ignore
/// let state = HttpState {
///     login: accounts.clone(),
///     users: accounts.clone(),
///     user_admin: accounts.clone(),
///     profile: accounts,
///     lessons: lessons.clone(),
///     lessons_query: lessons,
///     // ...
/// };
/// App::new().app_data(web::Data::new(state));
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersQuery>,
    pub user_admin: Arc<dyn UserAdminCommand>,
    pub profile: Arc<dyn UserProfileCommand>,
    pub lessons: Arc<dyn LessonCommand>,
    pub lessons_query: Arc<dyn LessonQuery>,
    pub generation: Arc<dyn GenerationCommand>,
    pub exports: Arc<dyn ExportCommand>,
    pub shares: Arc<dyn ShareCommand>,
    pub shares_query: Arc<dyn ShareQuery>,
    pub analytics: Arc<dyn AnalyticsQuery>,
    pub metrics_rebuild: Arc<dyn MetricsRebuildCommand>,
    pub lms: Arc<dyn LmsCommand>,
}
