//! Gallery table definitions
//!
//! `published` is deliberately nullable: a NULL value reads as published.

use crate::Result;
use sqlx::SqlitePool;

/// Create the gallery tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS paintings (
            public_id TEXT PRIMARY KEY,
            old_url TEXT,
            new_url TEXT,
            dest_path TEXT,
            label_number TEXT,
            caption TEXT,
            category TEXT,
            width INTEGER,
            height INTEGER,
            format TEXT,
            published INTEGER,
            verified INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS painting_tags (
            public_id TEXT NOT NULL REFERENCES paintings(public_id) ON DELETE CASCADE,
            tag TEXT NOT NULL,
            PRIMARY KEY (public_id, tag)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_painting_tags_tag ON painting_tags(tag)")
        .execute(pool)
        .await?;

    tracing::info!("Database tables initialized (paintings, painting_tags)");

    Ok(())
}
