//! Tenant, district, and school scoping hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DistrictId, SchoolId, TenantId};

/// Name given to the district created alongside a fresh tenant.
pub const DEFAULT_DISTRICT_NAME: &str = "Default District";
/// Name given to the school created alongside a fresh district.
pub const DEFAULT_SCHOOL_NAME: &str = "Default School";

/// Organisational root; every other record is scoped by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// District within a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub tenant_id: TenantId,
    pub name: String,
}

/// School within a district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub district_id: DistrictId,
    pub name: String,
}

/// Default scoping records resolved for a first-time login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    pub tenant: Tenant,
    pub district: District,
    pub school: School,
}
