//! Users API handlers: tenant administration and the caller's own profile.
//!
//! ```text
//! GET   /api/v1/users
//! POST  /api/v1/users/invite {"email":"ada@example.edu","role":"teacher"}
//! PATCH /api/v1/users/{user_id} {"isActive":false}
//! GET   /api/v1/me
//! PUT   /api/v1/me {"locale":"fr"}
//! ```

use actix_web::{HttpResponse, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{AdminUserUpdate, InviteUserRequest, ProfileUpdate};
use crate::domain::{DistrictId, Error, Role, SchoolId, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{current_admin, current_user};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_id, parse_optional_id, require_text,
};

#[derive(Debug, Deserialize)]
pub(super) struct UserPath {
    pub(super) user_id: String,
}

/// User record returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub tenant_id: String,
    #[schema(example = "ada@example.edu")]
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    #[schema(example = "en")]
    pub locale: String,
    pub preferred_subjects: Vec<String>,
    pub preferred_grade_levels: Vec<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub district_id: Option<String>,
    pub school_id: Option<String>,
    pub roles: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            tenant_id: user.tenant_id.to_string(),
            email: user.email.to_string(),
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            locale: user.locale,
            preferred_subjects: user.preferred_subjects,
            preferred_grade_levels: user.preferred_grade_levels,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            district_id: user.district_id.map(|id| id.to_string()),
            school_id: user.school_id.map(|id| id.to_string()),
            roles: user.roles.into_iter().map(String::from).collect(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for `POST /api/v1/users/invite`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteUserBody {
    pub email: Option<String>,
    pub full_name: Option<String>,
    /// Defaults to `teacher`.
    pub role: Option<String>,
    pub district_id: Option<String>,
    pub school_id: Option<String>,
}

/// Request body for `PATCH /api/v1/users/{user_id}`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<String>,
    pub district_id: Option<String>,
    pub school_id: Option<String>,
}

/// Request body for `PUT /api/v1/me`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub full_name: Option<String>,
    pub locale: Option<String>,
    pub preferred_subjects: Option<Vec<String>>,
    pub preferred_grade_levels: Option<Vec<String>>,
}

fn parse_role(raw: Option<String>) -> Result<Option<Role>, Error> {
    raw.map(|value| {
        Role::new(&value)
            .map_err(|err| invalid_value_error(FieldName::new("role"), err.to_string(), &value))
    })
    .transpose()
}

fn placement(
    district_id: Option<String>,
    school_id: Option<String>,
) -> Result<(Option<DistrictId>, Option<SchoolId>), Error> {
    Ok((
        parse_optional_id(district_id, FieldName::new("districtId"))?,
        parse_optional_id(school_id, FieldName::new("schoolId"))?,
    ))
}

impl TryFrom<InviteUserBody> for InviteUserRequest {
    type Error = Error;

    fn try_from(body: InviteUserBody) -> Result<Self, Self::Error> {
        let email = require_text(body.email, FieldName::new("email"))?;
        let role = parse_role(body.role)?.unwrap_or_else(Role::teacher);
        let (district_id, school_id) = placement(body.district_id, body.school_id)?;
        Ok(Self {
            email,
            full_name: body.full_name,
            role,
            district_id,
            school_id,
        })
    }
}

impl TryFrom<UpdateUserBody> for AdminUserUpdate {
    type Error = Error;

    fn try_from(body: UpdateUserBody) -> Result<Self, Self::Error> {
        let (district_id, school_id) = placement(body.district_id, body.school_id)?;
        Ok(Self {
            full_name: body.full_name,
            is_active: body.is_active,
            role: parse_role(body.role)?,
            district_id,
            school_id,
        })
    }
}

impl From<ProfileBody> for ProfileUpdate {
    fn from(body: ProfileBody) -> Self {
        Self {
            full_name: body.full_name,
            locale: body.locale,
            preferred_subjects: body.preferred_subjects,
            preferred_grade_levels: body.preferred_grade_levels,
        }
    }
}

/// List users in the administrator's tenant.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let admin = current_admin(&state, &session).await?;
    let users = state.users.list_users(&admin).await?;
    Ok(web::Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Invite a user into the administrator's tenant.
#[utoipa::path(
    post,
    path = "/api/v1/users/invite",
    request_body = InviteUserBody,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "inviteUser"
)]
#[post("/users/invite")]
pub async fn invite_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<InviteUserBody>,
) -> ApiResult<HttpResponse> {
    let admin = current_admin(&state, &session).await?;
    let request = InviteUserRequest::try_from(payload.into_inner())?;
    let user = state.user_admin.invite_user(&admin, request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Update a user in the administrator's tenant.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{user_id}",
    params(("user_id" = String, Path, description = "User identifier")),
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[patch("/users/{user_id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<UserPath>,
    payload: web::Json<UpdateUserBody>,
) -> ApiResult<web::Json<UserResponse>> {
    let admin = current_admin(&state, &session).await?;
    let user_id: UserId = parse_id(&path.user_id, FieldName::new("userId"))?;
    let update = AdminUserUpdate::try_from(payload.into_inner())?;
    let user = state.user_admin.update_user(&admin, &user_id, update).await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Return the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Inactive user", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "currentUser"
)]
#[get("/me")]
pub async fn get_me(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let user = current_user(&state, &session).await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Update the signed-in user's profile and preferences.
#[utoipa::path(
    put,
    path = "/api/v1/me",
    request_body = ProfileBody,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "updateProfile"
)]
#[put("/me")]
pub async fn update_me(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileBody>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = current_user(&state, &session).await?;
    let updated = state
        .profile
        .update_profile(&user, ProfileUpdate::from(payload.into_inner()))
        .await?;
    Ok(web::Json(UserResponse::from(updated)))
}
