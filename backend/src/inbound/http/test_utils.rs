//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test as actix_test;

use crate::domain::User;
use crate::domain::ports::{
    MockAnalyticsQuery, MockExportCommand, MockGenerationCommand, MockLessonCommand,
    MockLessonQuery, MockLmsCommand, MockLoginService, MockMetricsRebuildCommand,
    MockShareCommand, MockShareQuery, MockUserAdminCommand, MockUserProfileCommand,
    MockUsersQuery,
};
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mock driving ports; set expectations on the fields, then call
/// [`MockPorts::into_state`].
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub users: MockUsersQuery,
    pub user_admin: MockUserAdminCommand,
    pub profile: MockUserProfileCommand,
    pub lessons: MockLessonCommand,
    pub lessons_query: MockLessonQuery,
    pub generation: MockGenerationCommand,
    pub exports: MockExportCommand,
    pub shares: MockShareCommand,
    pub shares_query: MockShareQuery,
    pub analytics: MockAnalyticsQuery,
    pub metrics_rebuild: MockMetricsRebuildCommand,
    pub lms: MockLmsCommand,
}

impl MockPorts {
    /// Let `user` log in through the callback and resolve as the current
    /// user for any id, any number of times.
    pub fn signed_in_as(mut self, user: &User) -> Self {
        let login_user = user.clone();
        self.login
            .expect_login_with_code()
            .returning(move |_| Ok(login_user.clone()));
        let current = user.clone();
        self.users
            .expect_current_user()
            .returning(move |_| Ok(current.clone()));
        self
    }

    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            users: Arc::new(self.users),
            user_admin: Arc::new(self.user_admin),
            profile: Arc::new(self.profile),
            lessons: Arc::new(self.lessons),
            lessons_query: Arc::new(self.lessons_query),
            generation: Arc::new(self.generation),
            exports: Arc::new(self.exports),
            shares: Arc::new(self.shares),
            shares_query: Arc::new(self.shares_query),
            analytics: Arc::new(self.analytics),
            metrics_rebuild: Arc::new(self.metrics_rebuild),
            lms: Arc::new(self.lms),
        }
    }
}

/// Extract the `session` cookie set by a response.
pub fn session_cookie(res: &ServiceResponse) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
        .expect("session cookie set")
}

/// Log in through `POST /api/v1/auth/callback` and return the session cookie.
///
/// The login mock must already expect `login_with_code`.
pub async fn login_cookie<S>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/callback")
        .set_json(serde_json::json!({ "code": "teacher@example.edu" }))
        .to_request();
    let res = actix_test::call_service(app, req).await;
    assert!(res.status().is_success(), "login failed: {}", res.status());
    session_cookie(&res)
}
