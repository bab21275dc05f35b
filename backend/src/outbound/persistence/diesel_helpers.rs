//! Shared helpers for Diesel repository implementations.
//!
//! This module provides:
//! - Integer casts between domain counters and Postgres `INTEGER` columns
//! - JSON column encoding for metadata objects and content lists
//! - The audit event writer used inside repository transactions

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{Event, EventId, NewEvent, TenantId, UserId};

use super::models::{EventRow, MetricRow};
use super::schema::{events, metrics_daily};

/// Cast a domain counter into an `INTEGER` column value, saturating.
pub(crate) fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Cast an `INTEGER` column value into a domain counter; negatives clamp to 0.
pub(crate) fn from_db_int(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub(crate) fn to_db_opt(value: Option<u32>) -> Option<i32> {
    value.map(to_db_int)
}

pub(crate) fn from_db_opt(value: Option<i32>) -> Option<u32> {
    value.map(from_db_int)
}

/// Store a metadata object as a JSONB value.
pub(crate) fn object_to_value(map: &Map<String, Value>) -> Value {
    Value::Object(map.clone())
}

/// Read a JSONB metadata column; anything other than an object reads as empty.
pub(crate) fn value_to_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Encode a content list for a JSONB column.
pub(crate) fn encode_list<T: Serialize>(items: &[T], column: &str) -> Result<Value, String> {
    serde_json::to_value(items).map_err(|err| format!("failed to encode {column}: {err}"))
}

/// Decode a JSONB content list; `null` reads as an empty list.
pub(crate) fn decode_list<T: DeserializeOwned>(value: Value, column: &str) -> Result<Vec<T>, String> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|err| format!("corrupt {column} column: {err}"))
}

/// Convert a stored event row into the domain event.
pub(crate) fn row_to_event(row: EventRow) -> Event {
    Event {
        id: EventId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        user_id: row.user_id.map(UserId::from_uuid),
        action: row.action,
        metadata: value_to_object(row.metadata),
        created_at: row.created_at,
    }
}

/// Increment one daily counter, creating the row at 1 when absent.
pub(crate) async fn bump_metric(
    conn: &mut AsyncPgConnection,
    tenant_id: Uuid,
    metric_date: NaiveDate,
    metric_name: &str,
) -> QueryResult<()> {
    let row = MetricRow {
        tenant_id,
        metric_date,
        metric_name: metric_name.to_owned(),
        value: 1,
    };
    diesel::insert_into(metrics_daily::table)
        .values(&row)
        .on_conflict((
            metrics_daily::tenant_id,
            metrics_daily::metric_date,
            metrics_daily::metric_name,
        ))
        .do_update()
        .set(metrics_daily::value.eq(metrics_daily::value + 1))
        .execute(conn)
        .await?;
    Ok(())
}

/// Append `event` and bump its daily metric on the caller's connection.
///
/// Call this inside the transaction that performs the audited mutation so
/// the event, the counter, and the mutation commit or roll back together.
pub(crate) async fn insert_event(
    conn: &mut AsyncPgConnection,
    event: &NewEvent,
) -> QueryResult<EventRow> {
    let row = EventRow {
        id: Uuid::new_v4(),
        tenant_id: *event.tenant_id.as_uuid(),
        user_id: event.user_id.map(|id| *id.as_uuid()),
        action: event.action.clone(),
        metadata: object_to_value(&event.metadata),
        created_at: event.occurred_at,
    };
    let stored = diesel::insert_into(events::table)
        .values(&row)
        .returning(EventRow::as_returning())
        .get_result(conn)
        .await?;
    if let Some(metric) = event.metric() {
        bump_metric(conn, row.tenant_id, event.metric_date(), metric).await?;
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MaterialItem;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(0, 0)]
    #[case(45, 45)]
    #[case(u32::MAX, i32::MAX)]
    fn counters_saturate_into_integer_columns(#[case] value: u32, #[case] expected: i32) {
        assert_eq!(to_db_int(value), expected);
    }

    #[rstest]
    fn negative_columns_clamp_to_zero() {
        assert_eq!(from_db_int(-3), 0);
        assert_eq!(from_db_opt(Some(12)), Some(12));
    }

    #[rstest]
    #[case(json!({"a": 1}), 1)]
    #[case(json!([1, 2]), 0)]
    #[case(Value::Null, 0)]
    fn metadata_columns_read_as_objects(#[case] value: Value, #[case] len: usize) {
        assert_eq!(value_to_object(value).len(), len);
    }

    #[rstest]
    fn null_lists_decode_empty() {
        let items: Vec<MaterialItem> = decode_list(Value::Null, "materials").expect("decodes");
        assert!(items.is_empty());
    }

    #[rstest]
    fn malformed_lists_name_the_column() {
        let err = decode_list::<MaterialItem>(json!({"value": 1}), "materials")
            .expect_err("objects are not lists");
        assert!(err.contains("materials"));
    }
}
