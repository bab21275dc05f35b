//! PostgreSQL-backed `ShareRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{ShareRepository, ShareRepositoryError};
use crate::domain::{LessonId, NewEvent, NewShare, Share, ShareId, TenantId, UserId, VersionId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::diesel_helpers::insert_event;
use super::models::ShareRow;
use super::pool::{DbPool, PoolError};
use super::schema::shares;

const TOKEN_CONSTRAINT: &str = "shares_token_key";

/// Diesel-backed implementation of the `ShareRepository` port.
#[derive(Clone)]
pub struct DieselShareRepository {
    pool: DbPool,
}

impl DieselShareRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ShareRepositoryError {
    map_basic_pool_error(error, ShareRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ShareRepositoryError {
    if is_unique_violation(&error, Some(TOKEN_CONSTRAINT)) {
        return ShareRepositoryError::duplicate_token();
    }
    map_basic_diesel_error(
        error,
        ShareRepositoryError::query,
        ShareRepositoryError::connection,
    )
}

fn row_to_share(row: ShareRow) -> Share {
    Share {
        id: ShareId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        lesson_id: LessonId::from_uuid(row.lesson_id),
        lesson_version_id: VersionId::from_uuid(row.lesson_version_id),
        token: row.token,
        created_by_user_id: row.created_by_user_id.map(UserId::from_uuid),
        expires_at: row.expires_at,
        created_at: row.created_at,
    }
}

#[async_trait]
impl ShareRepository for DieselShareRepository {
    async fn create_share(
        &self,
        share: &NewShare,
        event: &NewEvent,
    ) -> Result<Share, ShareRepositoryError> {
        let row = ShareRow {
            id: Uuid::new_v4(),
            tenant_id: *share.tenant_id.as_uuid(),
            lesson_id: *share.lesson_id.as_uuid(),
            lesson_version_id: *share.lesson_version_id.as_uuid(),
            token: share.token.clone(),
            created_by_user_id: share.created_by_user_id.map(|id| *id.as_uuid()),
            expires_at: share.expires_at,
            created_at: event.occurred_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored = conn
            .transaction(|conn| {
                async move {
                    let stored: ShareRow = diesel::insert_into(shares::table)
                        .values(&row)
                        .returning(ShareRow::as_returning())
                        .get_result(conn)
                        .await?;
                    insert_event(conn, event).await?;
                    Ok(stored)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_share(stored))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Share>, ShareRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ShareRow> = shares::table
            .filter(shares::token.eq(token))
            .select(ShareRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_share))
    }
}
