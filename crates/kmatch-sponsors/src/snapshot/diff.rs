use super::OrganizationRecord;
use serde::Serialize;
use std::collections::HashSet;

/// Records that appeared and disappeared between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub added: Vec<OrganizationRecord>,
    pub removed: Vec<OrganizationRecord>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn added_names(&self) -> impl Iterator<Item = &str> {
        self.added.iter().map(|record| record.name.as_str())
    }
}

/// Compares snapshots by trimmed display name. Output keeps the order of
/// the snapshot each record came from.
pub fn diff(previous: &[OrganizationRecord], current: &[OrganizationRecord]) -> SnapshotDiff {
    SnapshotDiff {
        added: missing_from(current, previous),
        removed: missing_from(previous, current),
    }
}

fn missing_from(
    records: &[OrganizationRecord],
    other: &[OrganizationRecord],
) -> Vec<OrganizationRecord> {
    let known: HashSet<&str> = other.iter().map(|record| record.name.trim()).collect();
    records
        .iter()
        .filter(|record| !known.contains(record.name.trim()))
        .cloned()
        .collect()
}
