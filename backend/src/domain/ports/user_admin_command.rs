//! Driving port for tenant user administration.

use async_trait::async_trait;

use crate::domain::{DistrictId, Error, Role, SchoolId, User, UserId};

/// Invitation for a new tenant member. No email is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteUserRequest {
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub district_id: Option<DistrictId>,
    pub school_id: Option<SchoolId>,
}

/// Administrative changes to an existing user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUserUpdate {
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    /// Replaces every role the user holds.
    pub role: Option<Role>,
    pub district_id: Option<DistrictId>,
    pub school_id: Option<SchoolId>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAdminCommand: Send + Sync {
    /// Create a user in the actor's tenant.
    async fn invite_user(&self, actor: &User, request: InviteUserRequest) -> Result<User, Error>;

    /// Update a user in the actor's tenant.
    async fn update_user(
        &self,
        actor: &User,
        user_id: &UserId,
        update: AdminUserUpdate,
    ) -> Result<User, Error>;
}
