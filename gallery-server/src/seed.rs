//! Seed import
//!
//! Loads a JSON array of painting rows into the relational store. Rows whose
//! id already exists are left untouched, so the import can be re-run.

use gallery_common::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};

/// One row of the seed file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedRow {
    #[serde(default)]
    pub public_id: String,
    pub old_url: Option<String>,
    pub new_url: Option<String>,
    pub dest_path: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub label_number: Option<String>,
    /// Absent stays NULL, which reads as published
    pub published: Option<bool>,
}

/// Label numbers appear both as strings and bare numbers in exported data
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn parse_rows(json: &str) -> Result<Vec<SeedRow>> {
    serde_json::from_str(json).map_err(|e| Error::Validation(format!("invalid seed file: {}", e)))
}

/// Insert rows whose id is not yet present, in one transaction
pub async fn import_rows(pool: &SqlitePool, rows: Vec<SeedRow>) -> Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut tx = pool.begin().await?;

    for row in rows {
        if row.public_id.trim().is_empty() {
            warn!("Seed row without publicId skipped");
            report.skipped += 1;
            continue;
        }

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO paintings
                (public_id, old_url, new_url, dest_path, label_number, published)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.public_id)
        .bind(&row.old_url)
        .bind(&row.new_url)
        .bind(&row.dest_path)
        .bind(&row.label_number)
        .bind(row.published.map(i64::from))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            report.inserted += 1;
        } else {
            report.skipped += 1;
        }
    }

    tx.commit().await?;
    Ok(report)
}

/// Read `path` and import its rows
pub async fn import_json(pool: &SqlitePool, path: &Path) -> Result<SeedReport> {
    let content = tokio::fs::read_to_string(path).await?;
    let rows = parse_rows(&content)?;
    info!("Found {} entries in {}", rows.len(), path.display());

    let report = import_rows(pool, rows).await?;
    info!(
        inserted = report.inserted,
        skipped = report.skipped,
        "Seed import complete"
    );
    Ok(report)
}
