mod diff;
mod discovery;
mod table;
mod workbook;

pub use diff::{diff, SnapshotDiff};
pub use discovery::{
    discover_snapshots, latest_pair, new_entries_file_name, snapshot_file_name, SnapshotFile,
    SnapshotPair,
};
pub use table::{CsvTableStore, FileTableStore, TabularStore};

use crate::format::FormatError;
use serde::Serialize;

/// One row of a register snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationRecord {
    /// Trimmed display name; the identity used when diffing snapshots.
    pub name: String,
    /// Every cell of the row in column order.
    pub cells: Vec<String>,
}

impl OrganizationRecord {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        Self {
            cells: vec![name.clone()],
            name,
        }
    }
}

/// Ordered register rows sharing one header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTable {
    headers: Vec<String>,
    identity_column: String,
    records: Vec<OrganizationRecord>,
}

impl SnapshotTable {
    /// Builds a table from raw rows, taking each record's identity from
    /// `identity_column`. Rows are padded or truncated to the header width
    /// and rows with a blank identity are dropped.
    pub fn from_rows(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        identity_column: &str,
    ) -> Result<Self, FormatError> {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let identity_column = identity_column.trim();
        let index = headers
            .iter()
            .position(|header| header == identity_column)
            .ok_or_else(|| FormatError::MissingColumn {
                column: identity_column.to_string(),
                available: headers.clone(),
            })?;

        let records = rows
            .into_iter()
            .filter_map(|mut cells| {
                cells.resize(headers.len(), String::new());
                let name = cells[index].trim().to_string();
                (!name.is_empty()).then_some(OrganizationRecord { name, cells })
            })
            .collect();

        Ok(Self {
            headers,
            identity_column: identity_column.to_string(),
            records,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn identity_column(&self) -> &str {
        &self.identity_column
    }

    pub fn records(&self) -> &[OrganizationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.name.as_str())
    }

    /// Same header, different rows; used to export a diff.
    pub fn with_records(&self, records: Vec<OrganizationRecord>) -> Self {
        Self {
            headers: self.headers.clone(),
            identity_column: self.identity_column.clone(),
            records,
        }
    }
}
