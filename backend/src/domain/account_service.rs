//! Account use-cases: OAuth login, session users, tenant administration,
//! and self-service profile edits.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::port_error_mapping::{map_event_error, map_identity_error, map_user_error};
use crate::domain::ports::{
    AdminUserUpdate, EventRepository, IdentityProvider, InviteUserRequest, LoginService, NewUser,
    ProfileUpdate, UserAdminCommand, UserProfileCommand, UserRepository, UserUpdate, UsersQuery,
};
use crate::domain::{
    DistrictId, EmailAddress, Error, NewEvent, Role, SchoolId, TenantId, User, UserId, actions,
    email_domain_permitted,
};

/// Login policy applied to every identity the provider asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPolicy {
    /// Permitted email domains; empty admits every domain.
    pub allowed_email_domains: Vec<String>,
    /// Tenant new users join on first login.
    pub default_tenant_name: String,
}

/// Account service implementing the login, user, admin, and profile ports.
#[derive(Clone)]
pub struct AccountService<U, E> {
    users: Arc<U>,
    events: Arc<E>,
    identity: Arc<dyn IdentityProvider>,
    policy: LoginPolicy,
    clock: Arc<dyn Clock>,
}

impl<U, E> AccountService<U, E> {
    pub fn new(
        users: Arc<U>,
        events: Arc<E>,
        identity: Arc<dyn IdentityProvider>,
        policy: LoginPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            events,
            identity,
            policy,
            clock,
        }
    }
}

fn require_admin(actor: &User) -> Result<(), Error> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("Admin privileges required"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

impl<U, E> AccountService<U, E>
where
    U: UserRepository,
    E: EventRepository,
{
    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(user_id).await.map_err(map_user_error)
    }

    /// Check that `district_id` and `school_id` sit inside `tenant_id`.
    /// A school is checked against `fallback_district` when no district is
    /// given.
    async fn validate_placement(
        &self,
        tenant_id: &TenantId,
        district_id: Option<DistrictId>,
        school_id: Option<SchoolId>,
        fallback_district: Option<DistrictId>,
    ) -> Result<(), Error> {
        if let Some(district_id) = district_id {
            self.users
                .find_district(tenant_id, &district_id)
                .await
                .map_err(map_user_error)?
                .ok_or_else(|| Error::invalid_request("District not found"))?;
        }
        if let Some(school_id) = school_id {
            let district_id = district_id
                .or(fallback_district)
                .ok_or_else(|| Error::invalid_request("School not found"))?;
            self.users
                .find_school(&district_id, &school_id)
                .await
                .map_err(map_user_error)?
                .ok_or_else(|| Error::invalid_request("School not found"))?;
        }
        Ok(())
    }

    async fn upsert_login(
        &self,
        email: EmailAddress,
        full_name: Option<String>,
        picture: Option<String>,
    ) -> Result<User, Error> {
        if let Some(existing) = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_error)?
        {
            let update = UserUpdate {
                full_name,
                avatar_url: picture,
                ..UserUpdate::default()
            };
            return self
                .users
                .update_user(&existing.id, &update)
                .await
                .map_err(map_user_error)?
                .ok_or_else(|| Error::internal("user disappeared during login"));
        }

        let scope = self
            .users
            .ensure_default_scope(&self.policy.default_tenant_name)
            .await
            .map_err(map_user_error)?;
        let user = NewUser {
            tenant_id: scope.tenant.id,
            email,
            full_name,
            avatar_url: picture,
            district_id: Some(scope.district.id),
            school_id: Some(scope.school.id),
            roles: vec![Role::teacher()],
        };
        let created = self.users.insert_user(&user).await.map_err(map_user_error)?;
        info!(user_id = %created.id, tenant_id = %created.tenant_id, "user created on first login");
        Ok(created)
    }
}

#[async_trait]
impl<U, E> LoginService for AccountService<U, E>
where
    U: UserRepository,
    E: EventRepository,
{
    async fn login_with_code(&self, code: &str) -> Result<User, Error> {
        let identity = self
            .identity
            .exchange_code(code)
            .await
            .map_err(map_identity_error)?;
        let raw_email = non_blank(identity.email)
            .ok_or_else(|| Error::invalid_request("Email not provided"))?;
        let email =
            EmailAddress::new(raw_email).map_err(|err| Error::invalid_request(err.to_string()))?;
        if !email_domain_permitted(&email, &self.policy.allowed_email_domains) {
            return Err(Error::forbidden("Domain not permitted"));
        }

        let user = self
            .upsert_login(email, non_blank(identity.full_name), non_blank(identity.picture))
            .await?;
        if !user.is_active {
            return Err(Error::forbidden("Inactive user"));
        }

        let event = NewEvent::new(
            user.tenant_id,
            Some(user.id),
            actions::USER_LOGGED_IN,
            self.clock.utc(),
        )
        .with("subject", identity.subject);
        self.events.record(&event).await.map_err(map_event_error)?;
        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }
}

#[async_trait]
impl<U, E> UsersQuery for AccountService<U, E>
where
    U: UserRepository,
    E: EventRepository,
{
    async fn current_user(&self, user_id: &UserId) -> Result<User, Error> {
        let user = self
            .find_user(user_id)
            .await?
            .ok_or_else(|| Error::unauthorized("Not authenticated"))?;
        if !user.is_active {
            return Err(Error::forbidden("Inactive user"));
        }
        Ok(user)
    }

    async fn list_users(&self, actor: &User) -> Result<Vec<User>, Error> {
        require_admin(actor)?;
        self.users
            .list_users(&actor.tenant_id)
            .await
            .map_err(map_user_error)
    }
}

#[async_trait]
impl<U, E> UserAdminCommand for AccountService<U, E>
where
    U: UserRepository,
    E: EventRepository,
{
    async fn invite_user(&self, actor: &User, request: InviteUserRequest) -> Result<User, Error> {
        require_admin(actor)?;
        let email = EmailAddress::new(&request.email)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.validate_placement(
            &actor.tenant_id,
            request.district_id,
            request.school_id,
            actor.district_id,
        )
        .await?;

        let user = NewUser {
            tenant_id: actor.tenant_id,
            email,
            full_name: non_blank(request.full_name),
            avatar_url: None,
            district_id: request.district_id.or(actor.district_id),
            school_id: request.school_id,
            roles: vec![request.role],
        };
        let created = self.users.insert_user(&user).await.map_err(map_user_error)?;
        info!(user_id = %created.id, invited_by = %actor.id, "user invited");
        Ok(created)
    }

    async fn update_user(
        &self,
        actor: &User,
        user_id: &UserId,
        update: AdminUserUpdate,
    ) -> Result<User, Error> {
        require_admin(actor)?;
        let target = self
            .find_user(user_id)
            .await?
            .filter(|user| user.tenant_id == actor.tenant_id)
            .ok_or_else(|| Error::not_found("User not found"))?;
        self.validate_placement(
            &actor.tenant_id,
            update.district_id,
            update.school_id,
            target.district_id,
        )
        .await?;

        let changes = UserUpdate {
            full_name: non_blank(update.full_name),
            is_active: update.is_active,
            role: update.role,
            district_id: update.district_id,
            school_id: update.school_id,
            ..UserUpdate::default()
        };
        let updated = self
            .users
            .update_user(&target.id, &changes)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))?;
        info!(user_id = %updated.id, updated_by = %actor.id, "user updated");
        Ok(updated)
    }
}

#[async_trait]
impl<U, E> UserProfileCommand for AccountService<U, E>
where
    U: UserRepository,
    E: EventRepository,
{
    async fn update_profile(&self, actor: &User, update: ProfileUpdate) -> Result<User, Error> {
        let locale = match update.locale {
            Some(locale) => Some(
                non_blank(Some(locale))
                    .ok_or_else(|| Error::invalid_request("locale must not be empty"))?,
            ),
            None => None,
        };
        let changes = UserUpdate {
            full_name: non_blank(update.full_name),
            locale,
            preferred_subjects: update.preferred_subjects,
            preferred_grade_levels: update.preferred_grade_levels,
            ..UserUpdate::default()
        };
        self.users
            .update_user(&actor.id, &changes)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("User not found"))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
