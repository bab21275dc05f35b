//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{
    District, DistrictId, EmailAddress, Role, School, SchoolId, TenantId, TenantScope, User,
    UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another user already holds the email address.
        DuplicateEmail { email: String } => "user with email {email} already exists",
    }
}

/// User awaiting insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub tenant_id: TenantId,
    pub email: EmailAddress,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub district_id: Option<DistrictId>,
    pub school_id: Option<SchoolId>,
    pub roles: Vec<Role>,
}

/// Partial update; `None` leaves a field unchanged.
///
/// A present `role` replaces every role the user holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<Role>,
    pub district_id: Option<DistrictId>,
    pub school_id: Option<SchoolId>,
    pub locale: Option<String>,
    pub preferred_subjects: Option<Vec<String>>,
    pub preferred_grade_levels: Option<Vec<String>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised email address.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Get or create the named tenant with its default district and school.
    async fn ensure_default_scope(
        &self,
        tenant_name: &str,
    ) -> Result<TenantScope, UserPersistenceError>;

    /// Insert a user with its roles.
    async fn insert_user(&self, user: &NewUser) -> Result<User, UserPersistenceError>;

    /// Apply `update`, returning the refreshed user or `None` when absent.
    async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Tenant users ordered by full name (nulls last) then email.
    async fn list_users(&self, tenant_id: &TenantId) -> Result<Vec<User>, UserPersistenceError>;

    /// District by id within the tenant.
    async fn find_district(
        &self,
        tenant_id: &TenantId,
        district_id: &DistrictId,
    ) -> Result<Option<District>, UserPersistenceError>;

    /// School by id within the district.
    async fn find_school(
        &self,
        district_id: &DistrictId,
        school_id: &SchoolId,
    ) -> Result<Option<School>, UserPersistenceError>;
}

/// User store used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

fn unavailable() -> UserPersistenceError {
    UserPersistenceError::connection("database not configured")
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, _id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(None)
    }

    async fn find_by_email(
        &self,
        _email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(None)
    }

    async fn ensure_default_scope(
        &self,
        _tenant_name: &str,
    ) -> Result<TenantScope, UserPersistenceError> {
        Err(unavailable())
    }

    async fn insert_user(&self, _user: &NewUser) -> Result<User, UserPersistenceError> {
        Err(unavailable())
    }

    async fn update_user(
        &self,
        _id: &UserId,
        _update: &UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError> {
        Err(unavailable())
    }

    async fn list_users(&self, _tenant_id: &TenantId) -> Result<Vec<User>, UserPersistenceError> {
        Ok(Vec::new())
    }

    async fn find_district(
        &self,
        _tenant_id: &TenantId,
        _district_id: &DistrictId,
    ) -> Result<Option<District>, UserPersistenceError> {
        Ok(None)
    }

    async fn find_school(
        &self,
        _district_id: &DistrictId,
        _school_id: &SchoolId,
    ) -> Result<Option<School>, UserPersistenceError> {
        Ok(None)
    }
}
