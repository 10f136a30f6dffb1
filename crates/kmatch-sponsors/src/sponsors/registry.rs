use super::key::derive_key;
use super::rules::{KeyRules, MergePolicy};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Persisted lookup document: organization names grouped under short keys.
///
/// Groups live in a `BTreeMap` so keys always serialize sorted. Top-level
/// fields other than `lastUpdated` and `sponsors` are carried through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SponsorRegistry {
    #[serde(
        rename = "lastUpdated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    last_updated: Option<NaiveDate>,
    #[serde(rename = "sponsors", default)]
    groups: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    touched: bool,
}

/// Result of merging a single name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The name was blank after trimming.
    Skipped,
    /// The name was already filed under its key.
    Unchanged { key: String },
    /// The name was already filed under its key and copies under other keys
    /// were removed.
    Relocated {
        key: String,
        relocated_from: Vec<String>,
    },
    Added {
        key: String,
        relocated_from: Vec<String>,
    },
    /// A single-member rule discarded the previous members of the group.
    Replaced {
        key: String,
        displaced: Vec<String>,
        relocated_from: Vec<String>,
    },
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Skipped | Self::Unchanged { .. })
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Skipped => None,
            Self::Unchanged { key }
            | Self::Relocated { key, .. }
            | Self::Added { key, .. }
            | Self::Replaced { key, .. } => Some(key),
        }
    }
}

/// Tally of a batch of merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub added: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub relocated: usize,
    pub skipped: usize,
    pub displaced: Vec<String>,
}

impl MergeSummary {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Skipped => self.skipped += 1,
            MergeOutcome::Unchanged { .. } => self.unchanged += 1,
            MergeOutcome::Relocated { .. } => self.relocated += 1,
            MergeOutcome::Added { .. } => self.added += 1,
            MergeOutcome::Replaced { displaced, .. } => {
                self.replaced += 1;
                self.displaced.extend(displaced);
            }
        }
    }

    pub fn changed(&self) -> usize {
        self.added + self.replaced + self.relocated
    }
}

impl SponsorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_updated(&self) -> Option<NaiveDate> {
        self.last_updated
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    pub fn group(&self, key: &str) -> Option<&[String]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Whether any merge since loading changed the groups.
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn name_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Keys of every group containing `name`.
    pub fn keys_for(&self, name: &str) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|(_, names)| names.iter().any(|existing| existing == name))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Names filed under more than one key, with the keys holding them.
    pub fn cross_group_duplicates(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut seen: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (key, names) in &self.groups {
            for name in names {
                seen.entry(name.as_str()).or_default().push(key.as_str());
            }
        }
        seen.retain(|_, keys| keys.len() > 1);
        seen
    }

    /// Files `name` under its derived key.
    ///
    /// Every merge of a non-blank name also removes it from every other
    /// group, so a name is held by at most one key afterwards, even when the
    /// loaded document filed it twice.
    pub fn merge(&mut self, rules: &KeyRules, name: &str) -> MergeOutcome {
        let name = name.trim();
        if name.is_empty() {
            return MergeOutcome::Skipped;
        }

        let derived = derive_key(rules, name);
        let key = derived.key;

        // `None` when the name is already filed under its key.
        let displaced = match derived.policy {
            MergePolicy::Replace => {
                let current = self.groups.get(&key);
                if current.is_some_and(|names| names.len() == 1 && names[0] == name) {
                    None
                } else {
                    let previous = self
                        .groups
                        .insert(key.clone(), vec![name.to_string()])
                        .unwrap_or_default();
                    Some(
                        previous
                            .into_iter()
                            .filter(|existing| existing != name)
                            .collect::<Vec<_>>(),
                    )
                }
            }
            MergePolicy::Append => {
                let names = self.groups.entry(key.clone()).or_default();
                if names.iter().any(|existing| existing == name) {
                    None
                } else {
                    names.push(name.to_string());
                    Some(Vec::new())
                }
            }
        };

        let relocated_from = self.evict(&key, name);
        let outcome = match displaced {
            None if relocated_from.is_empty() => MergeOutcome::Unchanged { key },
            None => MergeOutcome::Relocated {
                key,
                relocated_from,
            },
            Some(displaced) if displaced.is_empty() => MergeOutcome::Added {
                key,
                relocated_from,
            },
            Some(displaced) => MergeOutcome::Replaced {
                key,
                displaced,
                relocated_from,
            },
        };

        if outcome.changed() {
            self.touched = true;
        }
        debug!(name, rule = derived.rule.label(), ?outcome, "merged sponsor name");
        outcome
    }

    /// Merges every name in order.
    pub fn merge_all<I, S>(&mut self, rules: &KeyRules, names: I) -> MergeSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = MergeSummary::default();
        for name in names {
            summary.record(self.merge(rules, name.as_ref()));
        }
        summary
    }

    /// Stamps `lastUpdated` when this run changed anything. Returns whether
    /// the registry needs to be written back.
    pub fn finish_run(&mut self, today: NaiveDate) -> bool {
        if self.touched {
            self.last_updated = Some(today);
        }
        self.touched
    }

    fn evict(&mut self, keep: &str, name: &str) -> Vec<String> {
        let mut relocated_from = Vec::new();
        for (key, names) in self.groups.iter_mut() {
            if key == keep {
                continue;
            }
            let before = names.len();
            names.retain(|existing| existing != name);
            if names.len() != before {
                relocated_from.push(key.clone());
            }
        }
        self.groups
            .retain(|key, names| key == keep || !names.is_empty());
        relocated_from
    }
}
