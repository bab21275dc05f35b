//! PostgreSQL-backed `StandardsRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{StandardsRepository, StandardsRepositoryError};
use crate::domain::{FrameworkId, NewStandard, Standard, StandardId, StandardsFramework, VersionId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{object_to_value, value_to_object};
use super::models::{LessonStandardRow, StandardRow, StandardsFrameworkRow};
use super::pool::{DbPool, PoolError};
use super::schema::{lesson_standards, standards, standards_frameworks};

diesel::define_sql_function!(fn lower(value: Text) -> Text);

/// Diesel-backed implementation of the `StandardsRepository` port.
#[derive(Clone)]
pub struct DieselStandardsRepository {
    pool: DbPool,
}

impl DieselStandardsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> StandardsRepositoryError {
    map_basic_pool_error(error, StandardsRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> StandardsRepositoryError {
    map_basic_diesel_error(
        error,
        StandardsRepositoryError::query,
        StandardsRepositoryError::connection,
    )
}

fn row_to_standard(row: StandardRow) -> Standard {
    Standard {
        id: StandardId::from_uuid(row.id),
        framework_id: FrameworkId::from_uuid(row.framework_id),
        code: row.code,
        grade_band: row.grade_band,
        subject: row.subject,
        description: row.description,
        tags: row.tags,
        metadata: value_to_object(row.metadata),
    }
}

fn row_to_framework(row: StandardsFrameworkRow) -> StandardsFramework {
    StandardsFramework {
        id: FrameworkId::from_uuid(row.id),
        code: row.code,
        name: row.name,
        jurisdiction: row.jurisdiction,
    }
}

#[async_trait]
impl StandardsRepository for DieselStandardsRepository {
    async fn candidates(
        &self,
        subject: &str,
        grade_level: &str,
    ) -> Result<Vec<Standard>, StandardsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<StandardRow> = standards::table
            .filter(lower(standards::subject).eq(subject.to_lowercase()))
            .filter(
                standards::grade_band
                    .eq(grade_level)
                    .or(standards::grade_band.is_null()),
            )
            .order_by(standards::code.asc())
            .select(StandardRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_standard).collect())
    }

    async fn find_by_codes(
        &self,
        codes: &[String],
    ) -> Result<Vec<Standard>, StandardsRepositoryError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<StandardRow> = standards::table
            .filter(standards::code.eq_any(codes))
            .order_by(standards::code.asc())
            .select(StandardRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_standard).collect())
    }

    async fn codes_for_version(
        &self,
        version_id: &VersionId,
    ) -> Result<Vec<String>, StandardsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        standards::table
            .inner_join(lesson_standards::table)
            .filter(lesson_standards::lesson_version_id.eq(version_id.as_uuid()))
            .order_by(standards::code.asc())
            .select(standards::code)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn attach(
        &self,
        version_id: &VersionId,
        standard_ids: &[StandardId],
    ) -> Result<(), StandardsRepositoryError> {
        if standard_ids.is_empty() {
            return Ok(());
        }
        let links: Vec<LessonStandardRow> = standard_ids
            .iter()
            .map(|standard_id| LessonStandardRow {
                lesson_version_id: *version_id.as_uuid(),
                standard_id: *standard_id.as_uuid(),
            })
            .collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(lesson_standards::table)
            .values(&links)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn ensure_framework(
        &self,
        code: &str,
        name: &str,
        jurisdiction: Option<String>,
    ) -> Result<StandardsFramework, StandardsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = StandardsFrameworkRow {
            id: Uuid::new_v4(),
            code: code.to_owned(),
            name: name.to_owned(),
            jurisdiction,
        };
        diesel::insert_into(standards_frameworks::table)
            .values(&row)
            .on_conflict(standards_frameworks::code)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let stored: StandardsFrameworkRow = standards_frameworks::table
            .filter(standards_frameworks::code.eq(code))
            .select(StandardsFrameworkRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_framework(stored))
    }

    async fn upsert_standard(
        &self,
        standard: &NewStandard,
    ) -> Result<Standard, StandardsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = StandardRow {
            id: Uuid::new_v4(),
            framework_id: *standard.framework_id.as_uuid(),
            code: standard.code.clone(),
            grade_band: standard.grade_band.clone(),
            subject: standard.subject.clone(),
            description: standard.description.clone(),
            tags: standard.tags.clone(),
            metadata: object_to_value(&standard.metadata),
        };
        let stored: StandardRow = diesel::insert_into(standards::table)
            .values(&row)
            .on_conflict((standards::framework_id, standards::code))
            .do_update()
            .set((
                standards::grade_band.eq(excluded(standards::grade_band)),
                standards::subject.eq(excluded(standards::subject)),
                standards::description.eq(excluded(standards::description)),
                standards::tags.eq(excluded(standards::tags)),
                standards::metadata.eq(excluded(standards::metadata)),
            ))
            .returning(StandardRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row_to_standard(stored))
    }
}
