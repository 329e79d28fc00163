//! Relational metadata store (SQLite)
//!
//! Rows of `paintings` plus their `painting_tags`. `published` is a nullable
//! integer; NULL is passed on as "absent" so the normalizer's default applies.

use async_trait::async_trait;
use gallery_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;

use super::{MetadataSource, RawFlag, RawRecord};

const SELECT_PAINTINGS: &str = r#"
    SELECT public_id, dest_path, label_number, caption, category,
           width, height, format, published, verified, created_at
    FROM paintings
"#;

/// Metadata source backed by the gallery SQLite database
#[derive(Clone)]
pub struct SqliteSource {
    pool: SqlitePool,
}

impl SqliteSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM paintings WHERE public_id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    async fn tags_for(&self, id: &str) -> Result<Vec<String>> {
        let tags = sqlx::query_scalar("SELECT tag FROM painting_tags WHERE public_id = ? ORDER BY tag")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }

    async fn all_tags(&self) -> Result<HashMap<String, Vec<String>>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT public_id, tag FROM painting_tags ORDER BY public_id, tag")
                .fetch_all(&self.pool)
                .await?;

        let mut by_id: HashMap<String, Vec<String>> = HashMap::new();
        for (id, tag) in rows {
            by_id.entry(id).or_default().push(tag);
        }
        Ok(by_id)
    }
}

/// Map one `paintings` row to a raw record (tags filled in by the caller)
fn row_to_raw(row: &SqliteRow) -> RawRecord {
    let dest_path: Option<String> = row.get("dest_path");
    let published: Option<i64> = row.get("published");
    let verified: i64 = row.get("verified");

    RawRecord {
        id: row.get("public_id"),
        label_number: row.get("label_number"),
        caption: row.get("caption"),
        folder: dest_path.clone(),
        category: row.get("category"),
        asset_path: dest_path,
        tags: Vec::new(),
        published: published.map(|p| RawFlag::Bool(p != 0)),
        verified: Some(RawFlag::Bool(verified != 0)),
        width: row.get("width"),
        height: row.get("height"),
        format: row.get("format"),
        created: row.get("created_at"),
    }
}

#[async_trait]
impl MetadataSource for SqliteSource {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        let rows = sqlx::query(&format!("{} ORDER BY created_at, public_id", SELECT_PAINTINGS))
            .fetch_all(&self.pool)
            .await?;

        let mut tags = self.all_tags().await?;

        Ok(rows
            .iter()
            .map(|row| {
                let mut raw = row_to_raw(row);
                if let Some(id) = raw.id.as_deref() {
                    raw.tags = tags.remove(id).unwrap_or_default();
                }
                raw
            })
            .collect())
    }

    async fn fetch_record(&self, id: &str) -> Result<Option<RawRecord>> {
        let row = sqlx::query(&format!("{} WHERE public_id = ?", SELECT_PAINTINGS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let mut raw = row_to_raw(&row);
                raw.tags = self.tags_for(id).await?;
                Ok(Some(raw))
            }
            None => Ok(None),
        }
    }

    async fn set_published(&self, id: &str, published: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE paintings SET published = ?, updated_at = CURRENT_TIMESTAMP WHERE public_id = ?",
        )
        .bind(published as i64)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_label_number(&self, id: &str, label_number: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE paintings SET label_number = ?, updated_at = CURRENT_TIMESTAMP WHERE public_id = ?",
        )
        .bind(label_number)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_verified(&self, id: &str, verified: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE paintings SET verified = ?, updated_at = CURRENT_TIMESTAMP WHERE public_id = ?",
        )
        .bind(verified as i64)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        if !self.exists(id).await? {
            return Ok(false);
        }
        sqlx::query("INSERT OR IGNORE INTO painting_tags (public_id, tag) VALUES (?, ?)")
            .bind(id)
            .bind(tag)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        if !self.exists(id).await? {
            return Ok(false);
        }
        sqlx::query("DELETE FROM painting_tags WHERE public_id = ? AND tag = ?")
            .bind(id)
            .bind(tag)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }
}
