//! Embeddings table: a CSV file with `token` (document content) and
//! `embedding` (vector as a bracketed, comma-delimited list of floats) columns.
//! An empty `embedding` cell means the row is embedded at upload time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{RagError, RagResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub content: String,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawRow {
    token: String,
    #[serde(default)]
    embedding: String,
}

fn parse_embedding(cell: &str, row: usize) -> RagResult<Option<Vec<f32>>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    let inner = cell
        .strip_prefix('[')
        .and_then(|c| c.strip_suffix(']'))
        .unwrap_or(cell);
    inner
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
        .map_err(|e| RagError::Table(format!("row {row}: invalid embedding value: {e}")))
}

fn format_embedding(embedding: &[f32], row: usize) -> RagResult<String> {
    if let Some(v) = embedding.iter().find(|v| !v.is_finite()) {
        return Err(RagError::Table(format!("row {row}: non-finite embedding value {v}")));
    }
    Ok(serde_json::to_string(embedding)?)
}

pub fn read_table(path: &Path) -> RagResult<Vec<TableRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<RawRow>().enumerate() {
        let raw = record?;
        rows.push(TableRow {
            embedding: parse_embedding(&raw.embedding, i)?,
            content: raw.token,
        });
    }
    tracing::debug!(path = %path.display(), rows = rows.len(), "embeddings table read");
    Ok(rows)
}

pub fn write_table(path: &Path, rows: &[TableRow]) -> RagResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (i, row) in rows.iter().enumerate() {
        let embedding = match &row.embedding {
            Some(e) => format_embedding(e, i)?,
            None => String::new(),
        };
        writer.serialize(RawRow {
            token: row.content.clone(),
            embedding,
        })?;
    }
    writer.flush()?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "embeddings table written");
    Ok(())
}
