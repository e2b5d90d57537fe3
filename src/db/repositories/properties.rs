use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::core::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredProperty {
    pub document_id: String,
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

fn parse_timestamp(value: String) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|err| AppError::Database(format!("invalid timestamp {value}: {err}")))
}

pub async fn get_property(
    pool: &SqlitePool,
    document_id: &str,
    key: &str,
) -> AppResult<Option<StoredProperty>> {
    let row = sqlx::query(
        r#"
        SELECT document_id, key, value, updated_at
        FROM document_properties
        WHERE document_id = ?1 AND key = ?2
        "#,
    )
    .bind(document_id)
    .bind(key)
    .fetch_optional(pool)
    .await?;

    row.map(|row| -> AppResult<StoredProperty> {
        Ok(StoredProperty {
            document_id: row.try_get("document_id")?,
            key: row.try_get("key")?,
            value: row.try_get("value")?,
            updated_at: parse_timestamp(row.try_get("updated_at")?)?,
        })
    })
    .transpose()
}

pub async fn set_property(
    pool: &SqlitePool,
    document_id: &str,
    key: &str,
    value: &str,
) -> AppResult<()> {
    if key.trim().is_empty() {
        return Err(AppError::InvalidInput("property key is empty".to_string()));
    }
    sqlx::query(
        r#"
        INSERT INTO document_properties (document_id, key, value)
        VALUES (?1, ?2, ?3)
        ON CONFLICT (document_id, key) DO UPDATE SET
            value = excluded.value,
            updated_at = (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        "#,
    )
    .bind(document_id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_property(pool: &SqlitePool, document_id: &str, key: &str) -> AppResult<bool> {
    let affected = sqlx::query(
        r#"
        DELETE FROM document_properties
        WHERE document_id = ?1 AND key = ?2
        "#,
    )
    .bind(document_id)
    .bind(key)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(affected > 0)
}

pub async fn list_keys(pool: &SqlitePool, document_id: &str) -> AppResult<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT key
        FROM document_properties
        WHERE document_id = ?1
        ORDER BY key ASC
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| row.try_get::<String, _>("key").map_err(AppError::from))
        .collect()
}
