//! Record sources — where inspection rows come from and where submissions go.
//!
//! Production uses `SheetsClient` (spreadsheet values API over HTTP).
//! `AppState` holds an `Arc<dyn RecordSource>` so handlers never know which.

use async_trait::async_trait;
use thiserror::Error;

use crate::expiry::{CellValue, KindSchema, Record};

#[cfg(test)]
pub mod memory;
pub mod sheets;

pub use sheets::SheetsClient;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid sheets URL: {0}")]
    InvalidUrl(String),
}

/// Fetches a fresh snapshot of a kind's rows, and appends new ones.
/// Implementations own any caching or retry policy; callers never retry.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, schema: &KindSchema) -> Result<Vec<Record>, SourceError>;

    async fn append(&self, schema: &KindSchema, row: Vec<String>) -> Result<(), SourceError>;
}

/// Turns a header row plus data rows into records. Short rows are padded
/// with empty cells; rows with no content at all are dropped.
pub fn rows_to_records(mut rows: Vec<Vec<CellValue>>) -> Vec<Record> {
    if rows.is_empty() {
        return Vec::new();
    }
    let headers: Vec<String> = rows.remove(0).iter().map(CellValue::as_text).collect();

    rows.into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_blank()))
        .map(|mut row| {
            row.resize(headers.len(), CellValue::Empty);
            Record::from_pairs(headers.iter().cloned().zip(row))
        })
        .collect()
}
