//! Relational persistence: SQLite with idempotent upsert keyed by url.
//!
//! The whole batch commits in one transaction; any error rolls the batch
//! back. Partial writes within one transaction are therefore never visible,
//! and a failed commit simply loses that run's batch.

use crate::models::NewsItem;
use crate::sink::PersistError;
use crate::utils::parse_publish_time;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    content TEXT,
    author TEXT,
    intro TEXT,
    publish_time TEXT,
    media_name TEXT,
    images TEXT,
    category TEXT NOT NULL,
    source TEXT NOT NULL,
    create_time TEXT,
    update_time TEXT
)
"#;

const UPSERT: &str = r#"
INSERT INTO news
    (title, url, content, author, intro, publish_time, media_name, images,
     category, source, create_time, update_time)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(url) DO UPDATE SET
    title = excluded.title,
    content = excluded.content,
    author = excluded.author,
    intro = excluded.intro,
    publish_time = excluded.publish_time,
    media_name = excluded.media_name,
    images = excluded.images,
    category = excluded.category,
    source = excluded.source,
    update_time = excluded.update_time
"#;

/// SQLite-backed news store.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Connection or DDL failure; treated as a startup error by the caller.
    pub async fn connect(url: &str) -> Result<Self, PersistError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Database { pool })
    }

    /// Upsert a batch by url inside one transaction.
    ///
    /// The raw publish-time string is parsed here; a string matching no
    /// known format stores NULL for that field and keeps the item.
    ///
    /// # Errors
    ///
    /// Any row failure aborts and rolls back the whole batch.
    pub async fn upsert_batch(&self, batch: &[NewsItem]) -> Result<u64, PersistError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        for item in batch {
            let publish_time = item.publish_time.as_deref().and_then(|raw| {
                match parse_publish_time(raw) {
                    Ok(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
                    Err(e) => {
                        debug!(url = %item.url, error = %e, "storing NULL publish time");
                        None
                    }
                }
            });
            let images = if item.images.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&item.images)?)
            };

            sqlx::query(UPSERT)
                .bind(&item.title)
                .bind(&item.url)
                .bind(&item.content)
                .bind(&item.author)
                .bind(item.intro())
                .bind(publish_time)
                .bind(item.media_name())
                .bind(images)
                .bind(item.category.as_str())
                .bind(item.source.as_str())
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(batch.len() as u64)
    }
}
