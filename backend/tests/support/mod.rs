//! Embedded PostgreSQL for the Diesel repository suites.
//!
//! Each test binary shares one cluster and every test gets a fresh database
//! with the embedded migrations applied. Cluster bootstrap is blocking, so
//! suites stay synchronous and drive the repositories through the runtime
//! held in [`TestDatabase`].
//!
//! Set `SKIP_TEST_CLUSTER=1` where PostgreSQL cannot start; otherwise a
//! failed bootstrap fails the test.

use chrono::{DateTime, SubsecRound, Utc};
use lessonplan::domain::ports::{NewUser, UserRepository};
use lessonplan::domain::{EmailAddress, Role, TenantId, User};
use lessonplan::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig, run_migrations};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use tokio::runtime::Runtime;

/// A migrated database, its pool, and the runtime the pool lives on.
pub struct TestDatabase {
    pub runtime: Runtime,
    pub pool: DbPool,
    _database: TemporaryDatabase,
}

impl TestDatabase {
    /// Create the default scope for `tenant_name` and insert one teacher.
    pub fn seed_teacher(&self, tenant_name: &str, email: &str) -> User {
        let users = DieselUserRepository::new(self.pool.clone());
        self.runtime.block_on(async {
            let scope = users
                .ensure_default_scope(tenant_name)
                .await
                .expect("tenant scope");
            users
                .insert_user(&NewUser {
                    tenant_id: scope.tenant.id,
                    email: EmailAddress::new(email).expect("valid email"),
                    full_name: Some("Grace Hopper".to_owned()),
                    avatar_url: None,
                    district_id: Some(scope.district.id),
                    school_id: Some(scope.school.id),
                    roles: vec![Role::teacher()],
                })
                .await
                .expect("teacher inserted")
        })
    }

    /// Create a tenant without any users.
    #[allow(dead_code, reason = "not every suite needs a second tenant")]
    pub fn seed_tenant(&self, tenant_name: &str) -> TenantId {
        let users = DieselUserRepository::new(self.pool.clone());
        self.runtime
            .block_on(users.ensure_default_scope(tenant_name))
            .expect("tenant scope")
            .tenant
            .id
    }
}

fn skip_requested() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn provision(max_connections: u32) -> Result<TestDatabase, String> {
    let cluster = shared_cluster_handle().map_err(|err| format!("cluster bootstrap: {err:?}"))?;
    let database = cluster
        .temporary_database(format!("lp_{}", uuid::Uuid::new_v4().simple()))
        .map_err(|err| format!("temporary database: {err:?}"))?;
    run_migrations(database.url()).map_err(|err| err.to_string())?;

    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let config = PoolConfig::new(database.url())
        .with_max_size(max_connections)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;
    Ok(TestDatabase {
        runtime,
        pool,
        _database: database,
    })
}

/// Provision a database, or return `None` when the cluster is unavailable
/// and skipping was requested.
pub fn test_database(max_connections: u32) -> Option<TestDatabase> {
    match provision(max_connections) {
        Ok(database) => Some(database),
        Err(reason) if skip_requested() => {
            eprintln!("SKIP-TEST-CLUSTER: {reason}");
            None
        }
        Err(reason) => {
            panic!("test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.")
        }
    }
}

/// Current instant truncated to microseconds, the precision PostgreSQL keeps.
#[allow(dead_code, reason = "not every suite needs wall-clock timestamps")]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
