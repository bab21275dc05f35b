//! Authentication endpoints and the session-to-user helpers used by every
//! protected handler.
//!
//! ```text
//! POST /api/v1/auth/callback {"code":"..."}
//! GET  /api/v1/auth/session
//! POST /api/v1/auth/logout
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::UserResponse;
use crate::inbound::http::validation::{FieldName, require_text};

/// Resolve the signed-in, active user.
///
/// A session pointing at a user that no longer resolves is cleared so the
/// stale cookie stops being replayed.
pub(crate) async fn current_user(state: &HttpState, session: &SessionContext) -> ApiResult<User> {
    let user_id = session.require_user_id()?;
    match state.users.current_user(&user_id).await {
        Err(err) if err.code() == ErrorCode::Unauthorized => {
            session.clear();
            Err(err)
        }
        other => other,
    }
}

/// Resolve the signed-in user and require tenant administration rights.
pub(crate) async fn current_admin(state: &HttpState, session: &SessionContext) -> ApiResult<User> {
    let user = current_user(state, session).await?;
    if user.is_admin() {
        Ok(user)
    } else {
        Err(Error::forbidden("Admin privileges required"))
    }
}

/// Authorization code returned by the identity provider.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub code: Option<String>,
}

/// Session status for the frontend.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub user: Option<UserResponse>,
}

/// Logout acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Exchange an authorization code and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/callback",
    request_body = CallbackRequest,
    responses(
        (status = 200, description = "Signed in", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Authorization code rejected", body = ErrorSchema),
        (status = 403, description = "Domain not permitted or inactive user", body = ErrorSchema),
        (status = 503, description = "Identity provider unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "authCallback",
    security([])
)]
#[post("/auth/callback")]
pub async fn callback(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CallbackRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let code = require_text(payload.into_inner().code, FieldName::new("code"))?;
    let user = state.login.login_with_code(&code).await?;
    session.persist_login(&user)?;
    info!(user_id = %user.id, tenant_id = %user.tenant_id, "session established");
    Ok(web::Json(UserResponse::from(user)))
}

/// Report whether the caller holds a valid session.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    responses((status = 200, description = "Session status", body = SessionStatusResponse)),
    tags = ["auth"],
    operation_id = "authSession",
    security([])
)]
#[get("/auth/session")]
pub async fn session_status(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<SessionStatusResponse>> {
    let Some(user_id) = session.user_id()? else {
        return Ok(web::Json(SessionStatusResponse {
            authenticated: false,
            user: None,
        }));
    };
    match state.users.current_user(&user_id).await {
        Ok(user) => Ok(web::Json(SessionStatusResponse {
            authenticated: true,
            user: Some(UserResponse::from(user)),
        })),
        Err(err) if matches!(err.code(), ErrorCode::Unauthorized | ErrorCode::Forbidden) => {
            session.clear();
            Ok(web::Json(SessionStatusResponse {
                authenticated: false,
                user: None,
            }))
        }
        Err(err) => Err(err),
    }
}

/// Clear the caller's session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Signed out", body = LogoutResponse)),
    tags = ["auth"],
    operation_id = "authLogout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::Ok().json(LogoutResponse { success: true })
}
