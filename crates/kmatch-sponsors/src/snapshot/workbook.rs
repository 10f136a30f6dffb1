use super::SnapshotTable;
use crate::format::FormatError;
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// File extensions read as spreadsheets rather than CSV.
pub(crate) const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub(crate) fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known))
        })
}

/// Reads the first worksheet of a spreadsheet export. The first row holds
/// the headers.
pub(crate) fn read_workbook(path: &Path, identity_column: &str) -> Result<SnapshotTable, FormatError> {
    let mut workbook = open_workbook_auto(path).map_err(FormatError::workbook(path))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FormatError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?
        .map_err(FormatError::workbook(path))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    let rows = rows.collect();

    SnapshotTable::from_rows(headers, rows, identity_column)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}
