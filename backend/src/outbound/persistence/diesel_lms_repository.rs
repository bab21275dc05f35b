//! PostgreSQL-backed `LmsRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{LmsRepository, LmsRepositoryError};
use crate::domain::{
    LessonId, LmsConnection, LmsConnectionId, LmsPush, LmsPushId, NewEvent, NewLmsConnection,
    NewLmsPush, TenantId, UserId, VersionId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{insert_event, object_to_value, value_to_object};
use super::models::{LmsConnectionRow, LmsPushRow};
use super::pool::{DbPool, PoolError};
use super::schema::{lms_connections, lms_pushes};

/// Diesel-backed implementation of the `LmsRepository` port.
#[derive(Clone)]
pub struct DieselLmsRepository {
    pool: DbPool,
}

impl DieselLmsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> LmsRepositoryError {
    map_basic_pool_error(error, LmsRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> LmsRepositoryError {
    map_basic_diesel_error(
        error,
        LmsRepositoryError::query,
        LmsRepositoryError::connection,
    )
}

fn row_to_connection(row: LmsConnectionRow) -> LmsConnection {
    LmsConnection {
        id: LmsConnectionId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        user_id: UserId::from_uuid(row.user_id),
        provider: row.provider,
        access_token: row.access_token,
        refresh_token: row.refresh_token,
        expires_at: row.expires_at,
        metadata: value_to_object(row.metadata),
        created_at: row.created_at,
    }
}

fn row_to_push(row: LmsPushRow) -> LmsPush {
    LmsPush {
        id: LmsPushId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        connection_id: LmsConnectionId::from_uuid(row.connection_id),
        lesson_id: LessonId::from_uuid(row.lesson_id),
        lesson_version_id: row.lesson_version_id.map(VersionId::from_uuid),
        course_id: row.course_id,
        topic_id: row.topic_id,
        due_date: row.due_date,
        status: row.status,
        external_assignment_id: row.external_assignment_id,
        metadata: value_to_object(row.metadata),
        created_at: row.created_at,
    }
}

#[async_trait]
impl LmsRepository for DieselLmsRepository {
    async fn insert_connection(
        &self,
        connection: &NewLmsConnection,
    ) -> Result<LmsConnection, LmsRepositoryError> {
        let row = LmsConnectionRow {
            id: Uuid::new_v4(),
            tenant_id: *connection.tenant_id.as_uuid(),
            user_id: *connection.user_id.as_uuid(),
            provider: connection.provider.clone(),
            access_token: connection.access_token.clone(),
            refresh_token: connection.refresh_token.clone(),
            expires_at: connection.expires_at,
            metadata: object_to_value(&connection.metadata),
            created_at: Utc::now(),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored: LmsConnectionRow = diesel::insert_into(lms_connections::table)
            .values(&row)
            .returning(LmsConnectionRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_connection(stored))
    }

    async fn latest_connection(
        &self,
        user_id: &UserId,
        provider: &str,
    ) -> Result<Option<LmsConnection>, LmsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<LmsConnectionRow> = lms_connections::table
            .filter(lms_connections::user_id.eq(user_id.as_uuid()))
            .filter(lms_connections::provider.eq(provider))
            .order_by(lms_connections::created_at.desc())
            .select(LmsConnectionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_connection))
    }

    async fn insert_push(
        &self,
        push: &NewLmsPush,
        event: &NewEvent,
    ) -> Result<LmsPush, LmsRepositoryError> {
        let row = LmsPushRow {
            id: Uuid::new_v4(),
            tenant_id: *push.tenant_id.as_uuid(),
            connection_id: *push.connection_id.as_uuid(),
            lesson_id: *push.lesson_id.as_uuid(),
            lesson_version_id: push.lesson_version_id.map(|id| *id.as_uuid()),
            course_id: push.course_id.clone(),
            topic_id: push.topic_id.clone(),
            due_date: push.due_date,
            status: push.status.clone(),
            external_assignment_id: push.external_assignment_id.clone(),
            metadata: object_to_value(&push.metadata),
            created_at: event.occurred_at,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored = conn
            .transaction(|conn| {
                async move {
                    let stored: LmsPushRow = diesel::insert_into(lms_pushes::table)
                        .values(&row)
                        .returning(LmsPushRow::as_returning())
                        .get_result(conn)
                        .await?;
                    insert_event(conn, event).await?;
                    Ok(stored)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_push(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn connection_metadata_keeps_the_profile() {
        let row = LmsConnectionRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider: "google_classroom".to_owned(),
            access_token: "token".to_owned(),
            refresh_token: None,
            expires_at: None,
            metadata: json!({ "profile": { "name": "Ada" } }),
            created_at: Utc::now(),
        };
        let connection = row_to_connection(row);
        assert_eq!(connection.profile().get("name"), Some(&json!("Ada")));
    }
}
