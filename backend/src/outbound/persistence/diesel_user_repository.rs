//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Users are stored with their role grants in `user_roles`; every read joins
//! the grants back onto the row. The tenant, district, and school hierarchy
//! used for first-time logins is created on demand.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{NewUser, UserPersistenceError, UserRepository, UserUpdate};
use crate::domain::{
    DEFAULT_DISTRICT_NAME, DEFAULT_SCHOOL_NAME, District, DistrictId, EmailAddress, Role, School,
    SchoolId, Tenant, TenantId, TenantScope, User, UserId,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{
    DistrictRow, NewTenantRow, NewUserRow, SchoolRow, TenantRow, UserChangeset, UserRoleRow,
    UserRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{districts, schools, tenants, user_roles, users};

const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn map_insert_error(error: diesel::result::Error, email: &EmailAddress) -> UserPersistenceError {
    if is_unique_violation(&error, Some(EMAIL_CONSTRAINT)) {
        return UserPersistenceError::duplicate_email(email.as_str());
    }
    map_diesel_error(error)
}

fn parse_roles(user_id: Uuid, grants: Vec<String>) -> Vec<Role> {
    let mut roles: Vec<Role> = grants
        .into_iter()
        .filter_map(|grant| match Role::new(&grant) {
            Ok(role) => Some(role),
            Err(err) => {
                warn!(%user_id, role = %grant, error = %err, "skipping malformed role grant");
                None
            }
        })
        .collect();
    roles.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    roles
}

fn row_to_user(row: UserRow, grants: Vec<String>) -> Result<User, UserPersistenceError> {
    let email = EmailAddress::new(&row.email)
        .map_err(|err| UserPersistenceError::query(format!("stored email invalid: {err}")))?;
    Ok(User {
        id: UserId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        email,
        full_name: row.full_name,
        avatar_url: row.avatar_url,
        locale: row.locale,
        preferred_subjects: row.preferred_subjects,
        preferred_grade_levels: row.preferred_grade_levels,
        is_active: row.is_active,
        is_superuser: row.is_superuser,
        district_id: row.district_id.map(DistrictId::from_uuid),
        school_id: row.school_id.map(SchoolId::from_uuid),
        roles: parse_roles(row.id, grants),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Load role grants for `user_ids`, grouped by user.
async fn load_grants(
    conn: &mut AsyncPgConnection,
    user_ids: &[Uuid],
) -> QueryResult<HashMap<Uuid, Vec<String>>> {
    let rows: Vec<UserRoleRow> = user_roles::table
        .filter(user_roles::user_id.eq_any(user_ids))
        .select(UserRoleRow::as_select())
        .load(conn)
        .await?;
    let mut grants: HashMap<Uuid, Vec<String>> = HashMap::new();
    for row in rows {
        grants.entry(row.user_id).or_default().push(row.role);
    }
    Ok(grants)
}

async fn attach_grants(
    conn: &mut AsyncPgConnection,
    rows: Vec<UserRow>,
) -> Result<Vec<User>, UserPersistenceError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut grants = load_grants(conn, &ids).await.map_err(map_diesel_error)?;
    rows.into_iter()
        .map(|row| {
            let held = grants.remove(&row.id).unwrap_or_default();
            row_to_user(row, held)
        })
        .collect()
}

async fn find_one(
    conn: &mut AsyncPgConnection,
    row: Option<UserRow>,
) -> Result<Option<User>, UserPersistenceError> {
    match row {
        Some(row) => Ok(attach_grants(conn, vec![row]).await?.into_iter().next()),
        None => Ok(None),
    }
}

async fn replace_roles(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    roles: &[Role],
) -> QueryResult<()> {
    diesel::delete(user_roles::table.filter(user_roles::user_id.eq(user_id)))
        .execute(conn)
        .await?;
    if roles.is_empty() {
        return Ok(());
    }
    let grants: Vec<UserRoleRow> = roles
        .iter()
        .map(|role| UserRoleRow {
            user_id,
            role: role.as_str().to_owned(),
        })
        .collect();
    diesel::insert_into(user_roles::table)
        .values(&grants)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

async fn ensure_tenant(conn: &mut AsyncPgConnection, name: &str) -> QueryResult<TenantRow> {
    diesel::insert_into(tenants::table)
        .values(&NewTenantRow {
            id: Uuid::new_v4(),
            name,
        })
        .on_conflict(tenants::name)
        .do_nothing()
        .execute(conn)
        .await?;
    tenants::table
        .filter(tenants::name.eq(name))
        .select(TenantRow::as_select())
        .first(conn)
        .await
}

async fn ensure_district(conn: &mut AsyncPgConnection, tenant_id: Uuid) -> QueryResult<DistrictRow> {
    diesel::insert_into(districts::table)
        .values(&DistrictRow {
            id: Uuid::new_v4(),
            tenant_id,
            name: DEFAULT_DISTRICT_NAME.to_owned(),
        })
        .on_conflict((districts::tenant_id, districts::name))
        .do_nothing()
        .execute(conn)
        .await?;
    districts::table
        .filter(districts::tenant_id.eq(tenant_id))
        .filter(districts::name.eq(DEFAULT_DISTRICT_NAME))
        .select(DistrictRow::as_select())
        .first(conn)
        .await
}

async fn ensure_school(conn: &mut AsyncPgConnection, district_id: Uuid) -> QueryResult<SchoolRow> {
    diesel::insert_into(schools::table)
        .values(&SchoolRow {
            id: Uuid::new_v4(),
            district_id,
            name: DEFAULT_SCHOOL_NAME.to_owned(),
        })
        .on_conflict((schools::district_id, schools::name))
        .do_nothing()
        .execute(conn)
        .await?;
    schools::table
        .filter(schools::district_id.eq(district_id))
        .filter(schools::name.eq(DEFAULT_SCHOOL_NAME))
        .select(SchoolRow::as_select())
        .first(conn)
        .await
}

fn row_to_district(row: DistrictRow) -> District {
    District {
        id: DistrictId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        name: row.name,
    }
}

fn row_to_school(row: SchoolRow) -> School {
    School {
        id: SchoolId::from_uuid(row.id),
        district_id: DistrictId::from_uuid(row.district_id),
        name: row.name,
    }
}

fn changeset(update: &UserUpdate) -> UserChangeset<'_> {
    UserChangeset {
        full_name: update.full_name.as_deref(),
        avatar_url: update.avatar_url.as_deref(),
        is_active: update.is_active,
        district_id: update.district_id.map(|id| *id.as_uuid()),
        school_id: update.school_id.map(|id| *id.as_uuid()),
        locale: update.locale.as_deref(),
        preferred_subjects: update.preferred_subjects.as_deref(),
        preferred_grade_levels: update.preferred_grade_levels.as_deref(),
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        find_one(&mut conn, row).await
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        find_one(&mut conn, row).await
    }

    async fn ensure_default_scope(
        &self,
        tenant_name: &str,
    ) -> Result<TenantScope, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (tenant, district, school) = conn
            .transaction(|conn| {
                async move {
                    let tenant = ensure_tenant(conn, tenant_name).await?;
                    let district = ensure_district(conn, tenant.id).await?;
                    let school = ensure_school(conn, district.id).await?;
                    Ok((tenant, district, school))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(TenantScope {
            tenant: Tenant {
                id: TenantId::from_uuid(tenant.id),
                name: tenant.name,
                created_at: tenant.created_at,
            },
            district: row_to_district(district),
            school: row_to_school(school),
        })
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let row = NewUserRow {
            id: Uuid::new_v4(),
            tenant_id: *user.tenant_id.as_uuid(),
            email: user.email.as_str(),
            full_name: user.full_name.as_deref(),
            avatar_url: user.avatar_url.as_deref(),
            district_id: user.district_id.map(|id| *id.as_uuid()),
            school_id: user.school_id.map(|id| *id.as_uuid()),
        };
        let roles = &user.roles;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored: UserRow = conn
            .transaction(|conn| {
                async move {
                    let stored: UserRow = diesel::insert_into(users::table)
                        .values(&row)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?;
                    replace_roles(conn, stored.id, roles).await?;
                    Ok(stored)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err: diesel::result::Error| map_insert_error(err, &user.email))?;
        let grants = user.roles.iter().map(|role| role.as_str().to_owned()).collect();
        row_to_user(stored, grants)
    }

    async fn update_user(
        &self,
        id: &UserId,
        update: &UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError> {
        let user_id = *id.as_uuid();
        let changes = changeset(update);
        let role = update.role.as_ref();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated: Option<UserRow> = conn
            .transaction(|conn| {
                async move {
                    let updated: Option<UserRow> = diesel::update(users::table.find(user_id))
                        .set(&changes)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    if let (Some(_), Some(role)) = (&updated, role) {
                        replace_roles(conn, user_id, std::slice::from_ref(role)).await?;
                    }
                    Ok(updated)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        find_one(&mut conn, updated).await
    }

    async fn list_users(&self, tenant_id: &TenantId) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::tenant_id.eq(tenant_id.as_uuid()))
            .order_by((users::full_name.asc().nulls_last(), users::email.asc()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_grants(&mut conn, rows).await
    }

    async fn find_district(
        &self,
        tenant_id: &TenantId,
        district_id: &DistrictId,
    ) -> Result<Option<District>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DistrictRow> = districts::table
            .filter(districts::id.eq(district_id.as_uuid()))
            .filter(districts::tenant_id.eq(tenant_id.as_uuid()))
            .select(DistrictRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_district))
    }

    async fn find_school(
        &self,
        district_id: &DistrictId,
        school_id: &SchoolId,
    ) -> Result<Option<School>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SchoolRow> = schools::table
            .filter(schools::id.eq(school_id.as_uuid()))
            .filter(schools::district_id.eq(district_id.as_uuid()))
            .select(SchoolRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_school))
    }
}
