use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::comic::{ComicRecord, ComicStyle, TaskStatus};

/// Insert a completed comic record. Returns the number of rows written.
pub async fn insert_comic(pool: &PgPool, record: &ComicRecord) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO comics (id, diary_id, user_id, title, description, image_url, style,
                            status, created_at, completed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(record.id)
    .bind(&record.diary_id)
    .bind(record.user_id.as_deref())
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.image_url)
    .bind(record.style.as_ref())
    .bind(record.status.as_ref())
    .bind(record.created_at)
    .bind(record.completed_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Get a comic record by ID
pub async fn get_comic(pool: &PgPool, comic_id: Uuid) -> Result<Option<ComicRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, diary_id, user_id, title, description, image_url, style, status,
               created_at, completed_at
        FROM comics
        WHERE id = $1
        "#,
    )
    .bind(comic_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| record_from_row(&r)).transpose()
}

fn record_from_row(r: &PgRow) -> Result<ComicRecord, sqlx::Error> {
    let style_str: String = r.try_get("style")?;
    let status_str: String = r.try_get("status")?;

    Ok(ComicRecord {
        id: r.try_get("id")?,
        diary_id: r.try_get("diary_id")?,
        user_id: r.try_get("user_id")?,
        title: r.try_get("title")?,
        description: r.try_get("description")?,
        image_url: r.try_get("image_url")?,
        style: parse_column::<ComicStyle>("style", &style_str)?,
        status: parse_column::<TaskStatus>("status", &status_str)?,
        created_at: r.try_get("created_at")?,
        completed_at: r.try_get("completed_at")?,
    })
}

/// Parse a text column into an enum, reporting unknown values as decode errors.
fn parse_column<T>(column: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
