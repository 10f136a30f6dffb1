//! Batch runs tying the register, snapshot files and registry together.
//!
//! Each run reads its inputs once, works in memory and writes its outputs
//! once at the end.

use crate::error::AppError;
use crate::format::FormatError;
use crate::register::RegisterFetcher;
use crate::snapshot::{
    diff, latest_pair, new_entries_file_name, SnapshotDiff, SnapshotPair, SnapshotTable,
    TabularStore,
};
use crate::sponsors::{KeyRules, MergeSummary, RegistryStore};
use chrono::NaiveDate;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::info;

/// The newest snapshot compared against the one before it.
#[derive(Debug, Clone)]
pub struct SnapshotComparison {
    pub pair: SnapshotPair,
    pub latest: SnapshotTable,
    pub diff: SnapshotDiff,
}

impl SnapshotComparison {
    pub fn added_table(&self) -> SnapshotTable {
        self.latest.with_records(self.diff.added.clone())
    }
}

/// Outcome of folding names into the registry document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryUpdate {
    pub summary: MergeSummary,
    pub written: bool,
    pub last_updated: Option<NaiveDate>,
}

/// Scrapes the register and stores it as a snapshot at `output`.
pub fn capture_snapshot<F, T>(
    fetcher: &F,
    tables: &T,
    url: &str,
    identity_column: &str,
    output: &Path,
) -> Result<SnapshotTable, AppError>
where
    F: RegisterFetcher + ?Sized,
    T: TabularStore + ?Sized,
{
    let table = fetcher.fetch_register(url)?.into_snapshot(identity_column)?;
    tables.write_table(output, &table)?;
    info!(rows = table.len(), path = %output.display(), "saved register snapshot");
    Ok(table)
}

/// Diffs the two newest snapshots in `dir`. `None` means fewer than two
/// snapshots exist, which leaves nothing to compare.
pub fn compare_latest<T>(
    tables: &T,
    dir: &Path,
    identity_column: &str,
) -> Result<Option<SnapshotComparison>, FormatError>
where
    T: TabularStore + ?Sized,
{
    let Some(pair) = latest_pair(dir)? else {
        info!(dir = %dir.display(), "need at least two snapshots to compare");
        return Ok(None);
    };

    let previous = tables.read_table(&pair.previous.path, identity_column)?;
    let latest = tables.read_table(&pair.latest.path, identity_column)?;
    let diff = diff(previous.records(), latest.records());
    info!(
        latest = %pair.latest.date,
        previous = %pair.previous.date,
        added = diff.added.len(),
        removed = diff.removed.len(),
        "compared snapshots"
    );

    Ok(Some(SnapshotComparison { pair, latest, diff }))
}

/// Writes the added records to `new_entries_DD_MM_YYYY.csv` in `dir`.
/// Nothing is written when no records were added.
pub fn export_new_entries<T>(
    tables: &T,
    comparison: &SnapshotComparison,
    dir: &Path,
    today: NaiveDate,
) -> Result<Option<PathBuf>, FormatError>
where
    T: TabularStore + ?Sized,
{
    if comparison.diff.added.is_empty() {
        return Ok(None);
    }

    let path = dir.join(new_entries_file_name(today));
    tables.write_table(&path, &comparison.added_table())?;
    info!(entries = comparison.diff.added.len(), path = %path.display(), "exported new entries");
    Ok(Some(path))
}

/// Loads the registry, merges `names` and rewrites it only if something
/// changed, stamping `lastUpdated` with `today`.
pub fn update_registry<S, I, N>(
    store: &S,
    path: &Path,
    rules: &KeyRules,
    names: I,
    today: NaiveDate,
) -> Result<RegistryUpdate, FormatError>
where
    S: RegistryStore + ?Sized,
    I: IntoIterator<Item = N>,
    N: AsRef<str>,
{
    let mut registry = store.read_registry(path)?;
    let summary = registry.merge_all(rules, names);
    let written = registry.finish_run(today);

    if written {
        store.write_registry(path, &registry)?;
        info!(
            added = summary.added,
            replaced = summary.replaced,
            relocated = summary.relocated,
            path = %path.display(),
            "registry updated"
        );
    } else {
        info!(path = %path.display(), "registry already up to date");
    }

    Ok(RegistryUpdate {
        summary,
        written,
        last_updated: registry.last_updated(),
    })
}

/// One name per line; blank lines are ignored.
pub fn read_name_list<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
