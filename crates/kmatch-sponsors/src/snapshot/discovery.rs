use crate::format::FormatError;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SNAPSHOT_PREFIX: &str = "KMatch - ";
const SNAPSHOT_EXTENSION: &str = ".csv";
/// Snapshot suffixes recognised on disk; earlier entries win when two files
/// carry the same date.
const SNAPSHOT_SUFFIXES: &[&str] = &[".csv", ".xlsx"];
const FILE_DATE_FORMAT: &str = "%d_%m_%Y";

/// A dated register snapshot on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: PathBuf,
    pub date: NaiveDate,
}

/// The two most recent snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    pub latest: SnapshotFile,
    pub previous: SnapshotFile,
}

pub fn snapshot_file_name(date: NaiveDate) -> String {
    format!(
        "{SNAPSHOT_PREFIX}{}{SNAPSHOT_EXTENSION}",
        date.format(FILE_DATE_FORMAT)
    )
}

pub fn new_entries_file_name(date: NaiveDate) -> String {
    format!("new_entries_{}{SNAPSHOT_EXTENSION}", date.format(FILE_DATE_FORMAT))
}

fn parse_snapshot_date(file_name: &str) -> Option<Result<NaiveDate, chrono::ParseError>> {
    let stem = file_name.strip_prefix(SNAPSHOT_PREFIX)?;
    let raw = SNAPSHOT_SUFFIXES
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))?;
    Some(NaiveDate::parse_from_str(raw.trim(), FILE_DATE_FORMAT))
}

fn suffix_rank(path: &Path) -> usize {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    SNAPSHOT_SUFFIXES
        .iter()
        .position(|suffix| file_name.ends_with(suffix))
        .unwrap_or(SNAPSHOT_SUFFIXES.len())
}

/// Lists `KMatch - DD_MM_YYYY.csv` and `.xlsx` files in `dir`, newest first.
/// Files that match the name pattern but carry an unreadable date are
/// skipped, and a CSV snapshot shadows a spreadsheet with the same date.
pub fn discover_snapshots(dir: &Path) -> Result<Vec<SnapshotFile>, FormatError> {
    let mut snapshots = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(FormatError::io(dir))? {
        let entry = entry.map_err(FormatError::io(dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        match parse_snapshot_date(file_name) {
            Some(Ok(date)) => snapshots.push(SnapshotFile { path, date }),
            Some(Err(err)) => warn!(file = file_name, %err, "skipping snapshot with unreadable date"),
            None => debug!(file = file_name, "ignoring non-snapshot file"),
        }
    }

    snapshots.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| suffix_rank(&a.path).cmp(&suffix_rank(&b.path)))
            .then_with(|| a.path.cmp(&b.path))
    });
    snapshots.dedup_by(|shadowed, kept| {
        let same_date = shadowed.date == kept.date;
        if same_date {
            debug!(
                file = %shadowed.path.display(),
                kept = %kept.path.display(),
                "ignoring second snapshot for the same date"
            );
        }
        same_date
    });
    Ok(snapshots)
}

/// Newest two snapshots, or `None` when fewer than two exist.
pub fn latest_pair(dir: &Path) -> Result<Option<SnapshotPair>, FormatError> {
    let mut snapshots = discover_snapshots(dir)?.into_iter();
    match (snapshots.next(), snapshots.next()) {
        (Some(latest), Some(previous)) => Ok(Some(SnapshotPair { latest, previous })),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_use_day_first_dates() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).expect("date");
        assert_eq!(snapshot_file_name(date), "KMatch - 07_03_2025.csv");
        assert_eq!(new_entries_file_name(date), "new_entries_07_03_2025.csv");
    }

    #[test]
    fn parses_only_matching_names() {
        assert_eq!(
            parse_snapshot_date("KMatch - 31_12_2024.csv").map(Result::ok),
            Some(NaiveDate::from_ymd_opt(2024, 12, 31))
        );
        assert!(matches!(parse_snapshot_date("KMatch - 2024-12-31.csv"), Some(Err(_))));
        assert!(parse_snapshot_date("new_entries_31_12_2024.csv").is_none());
        assert_eq!(
            parse_snapshot_date("KMatch - 31_12_2024.xlsx").map(Result::ok),
            Some(NaiveDate::from_ymd_opt(2024, 12, 31))
        );
        assert!(parse_snapshot_date("KMatch - 31_12_2024.json").is_none());
    }
}
