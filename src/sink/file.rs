//! Per-source file snapshots.
//!
//! Each run's batch replaces the previous snapshot for that source at
//! `<root>/<source>/<source>.<ext>` — a full overwrite, not an append log.
//! JSON output is a pretty-printed array; CSV output takes its header from
//! the first item's field set.

use crate::models::{NewsItem, Source};
use crate::sink::PersistError;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::fs;

/// Snapshot serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Writes per-source snapshot files under a root directory.
pub struct FileSink {
    root: PathBuf,
    format: OutputFormat,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>, format: OutputFormat) -> Self {
        FileSink {
            root: root.into(),
            format,
        }
    }

    /// Serialize the batch and replace the source's snapshot file.
    ///
    /// # Errors
    ///
    /// Serialization or filesystem failures; the caller logs and continues.
    pub async fn write_snapshot(
        &self,
        batch: &[NewsItem],
        source: Source,
    ) -> Result<PathBuf, PersistError> {
        let dir = self.root.join(source.as_str());
        fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.{}", source.as_str(), self.format.extension()));

        let data = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(batch)?,
            OutputFormat::Csv => to_csv(batch)?,
        };
        fs::write(&path, data).await?;
        Ok(path)
    }
}

/// Render the batch as CSV. The header row is the first item's field set;
/// subsequent items contribute the fields named there and nothing else.
fn to_csv(batch: &[NewsItem]) -> Result<String, PersistError> {
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = batch
        .iter()
        .map(|item| {
            serde_json::to_value(item).map(|value| match value {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            })
        })
        .collect::<Result<_, _>>()?;

    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut out = String::new();
    out.push_str(
        &headers
            .iter()
            .map(|h| csv_escape(h))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');
    for row in &rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|header| csv_escape(&cell_text(row.get(header.as_str()))))
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    Ok(out)
}

/// Flatten one JSON value into CSV cell text: strings verbatim, scalars and
/// composites in their JSON rendering, absent/null empty.
fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn csv_escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
