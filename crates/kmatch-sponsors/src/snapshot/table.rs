use super::workbook::{is_workbook, read_workbook};
use super::SnapshotTable;
use crate::format::FormatError;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Row/column file boundary for register snapshots.
pub trait TabularStore {
    fn read_table(&self, path: &Path, identity_column: &str) -> Result<SnapshotTable, FormatError>;
    fn write_table(&self, path: &Path, table: &SnapshotTable) -> Result<(), FormatError>;
}

/// CSV snapshots with a header row.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvTableStore;

impl CsvTableStore {
    pub fn from_reader<R: Read>(
        reader: R,
        identity_column: &str,
    ) -> Result<SnapshotTable, FormatError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        SnapshotTable::from_rows(headers, rows, identity_column)
    }

    pub fn to_writer<W: Write>(writer: W, table: &SnapshotTable) -> Result<(), FormatError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(table.headers())?;
        for record in table.records() {
            csv_writer.write_record(&record.cells)?;
        }
        csv_writer
            .flush()
            .map_err(|err| FormatError::Csv(err.into()))?;
        Ok(())
    }
}

impl TabularStore for CsvTableStore {
    fn read_table(&self, path: &Path, identity_column: &str) -> Result<SnapshotTable, FormatError> {
        let file = File::open(path).map_err(FormatError::io(path))?;
        Self::from_reader(file, identity_column)
    }

    fn write_table(&self, path: &Path, table: &SnapshotTable) -> Result<(), FormatError> {
        let file = File::create(path).map_err(FormatError::io(path))?;
        Self::to_writer(file, table)
    }
}

/// Snapshot files dispatched on extension: spreadsheets are read from their
/// first worksheet, everything else as CSV. Writes are always CSV.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTableStore;

impl TabularStore for FileTableStore {
    fn read_table(&self, path: &Path, identity_column: &str) -> Result<SnapshotTable, FormatError> {
        if is_workbook(path) {
            read_workbook(path, identity_column)
        } else {
            CsvTableStore.read_table(path, identity_column)
        }
    }

    fn write_table(&self, path: &Path, table: &SnapshotTable) -> Result<(), FormatError> {
        if is_workbook(path) {
            return Err(FormatError::UnsupportedWrite {
                path: path.to_path_buf(),
            });
        }
        CsvTableStore.write_table(path, table)
    }
}
