//! Batch persistence.
//!
//! Two independent modes, selectable by configuration and not mutually
//! exclusive: a per-source file snapshot ([`file::FileSink`]) and a
//! relational upsert store ([`db::Database`]). A disabled mode performs
//! zero storage operations. Persistence failure is hard for the current
//! batch only — it is logged and the run completes.

pub mod db;
pub mod file;

use crate::config::Config;
use crate::models::{NewsItem, Source};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// A classified persistence failure.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Facade over the enabled persistence modes.
pub struct Sink {
    file: Option<file::FileSink>,
    db: Option<db::Database>,
}

impl Sink {
    /// A sink with every mode off; `persist` is a no-op.
    pub fn disabled() -> Self {
        Sink {
            file: None,
            db: None,
        }
    }

    /// Build the enabled modes from configuration. Connecting the
    /// relational store is the only fallible part.
    pub async fn from_config(config: &Config) -> Result<Self, PersistError> {
        let file = config.storage.enabled.then(|| {
            file::FileSink::new(&config.storage.output_dir, config.storage.output_format)
        });
        let db = if config.storage.to_database {
            Some(db::Database::connect(&config.database.url).await?)
        } else {
            None
        };
        Ok(Sink { file, db })
    }

    /// Persist a batch to every enabled mode. An empty batch is a valid,
    /// loggable outcome and writes nothing. Failures are logged here and
    /// never propagated.
    #[instrument(level = "info", skip_all, fields(%source, count = batch.len()))]
    pub async fn persist(&self, batch: &[NewsItem], source: Source) {
        if self.file.is_none() && self.db.is_none() {
            debug!("sink disabled; skipping persistence");
            return;
        }
        if batch.is_empty() {
            debug!("empty batch; nothing to persist");
            return;
        }

        if let Some(file) = &self.file {
            match file.write_snapshot(batch, source).await {
                Ok(path) => info!(path = %path.display(), "wrote snapshot"),
                Err(e) => error!(error = %e, "file persist failed"),
            }
        }
        if let Some(db) = &self.db {
            match db.upsert_batch(batch).await {
                Ok(rows) => info!(rows, "upserted batch"),
                Err(e) => error!(error = %e, "database persist failed; batch rolled back"),
            }
        }
    }
}
