use super::normalizer::strip_periods;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

/// How a derived key folds a new name into its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Keep existing members and append the name when absent.
    Append,
    /// Replace the whole group with the single new name.
    Replace,
}

impl MergePolicy {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Replace => "replace",
        }
    }
}

/// The rule that produced a group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRule {
    CompoundPrefix,
    OrganizationType,
    University,
    FirstWord,
    Fallback,
}

impl KeyRule {
    pub const fn label(self) -> &'static str {
        match self {
            Self::CompoundPrefix => "compound prefix",
            Self::OrganizationType => "organization type",
            Self::University => "university",
            Self::FirstWord => "first word",
            Self::Fallback => "fallback",
        }
    }
}

/// Merge policy per key rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulePolicies {
    pub compound_prefix: MergePolicy,
    pub organization_type: MergePolicy,
    pub university: MergePolicy,
    pub first_word: MergePolicy,
}

impl Default for RulePolicies {
    fn default() -> Self {
        Self {
            compound_prefix: MergePolicy::Append,
            organization_type: MergePolicy::Replace,
            university: MergePolicy::Replace,
            first_word: MergePolicy::Append,
        }
    }
}

impl RulePolicies {
    pub fn for_rule(&self, rule: KeyRule) -> MergePolicy {
        match rule {
            KeyRule::CompoundPrefix => self.compound_prefix,
            KeyRule::OrganizationType => self.organization_type,
            KeyRule::University => self.university,
            KeyRule::FirstWord | KeyRule::Fallback => self.first_word,
        }
    }
}

/// Single authoritative table of the word sets and name corrections that
/// drive group-key derivation.
///
/// Word entries are compared against lowercased, alphanumeric-only words.
/// Override sources and targets are compared after trimming and removing
/// periods, the same normalization applied to incoming names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyRules {
    /// First words whose key spans the whole name.
    pub particles: BTreeSet<String>,
    /// Particles that take a genitive (`van der`, `van den`) into account.
    pub genitive_heads: BTreeSet<String>,
    pub genitive_particles: BTreeSet<String>,
    /// Generic institutional first words keyed on the first two words.
    pub institutional_markers: BTreeSet<String>,
    /// Academic first words keyed on the full name.
    pub academic_markers: BTreeSet<String>,
    /// Academic first words keyed on their location, mapped to the word that
    /// introduces the location (`universiteit van <city>`).
    pub located_academic_markers: BTreeMap<String, String>,
    /// First-word keys too generic to group on without the second word.
    pub ambiguous_keys: BTreeSet<String>,
    /// Exact-name corrections applied before any key rule.
    pub overrides: BTreeMap<String, String>,
    pub policies: RulePolicies,
}

impl Default for KeyRules {
    fn default() -> Self {
        Self {
            particles: word_set(&["den", "delta", "erasmus", "van"]),
            genitive_heads: word_set(&["van"]),
            genitive_particles: word_set(&["der", "den"]),
            institutional_markers: word_set(&["world", "multi", "institute", "the", "total"]),
            academic_markers: word_set(&["universiteit", "university", "universitair"]),
            located_academic_markers: BTreeMap::from([(
                "universiteit".to_string(),
                "van".to_string(),
            )]),
            ambiguous_keys: word_set(&["independent", "machinefabriek"]),
            overrides: BTreeMap::new(),
            policies: RulePolicies::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("failed to read key rules from {}: {source}", path.display())]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("invalid key rules document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("override for '{0}' is empty")]
    EmptyOverride(String),
    #[error("overrides for '{source_name}' disagree: '{first}' vs '{second}'")]
    ConflictingOverride {
        source_name: String,
        first: String,
        second: String,
    },
    #[error("override '{source_name}' -> '{target}' chains into another override")]
    OverrideChain { source_name: String, target: String },
}

impl KeyRules {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RulesError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Reads a JSON rule table; fields missing from the document keep their
    /// built-in values.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RulesError> {
        let rules: KeyRules = serde_json::from_reader(reader)?;
        rules.validated()
    }

    /// Adds a name correction, normalizing both sides.
    pub fn with_override(mut self, from: &str, to: &str) -> Result<Self, RulesError> {
        self.overrides.insert(from.to_string(), to.to_string());
        self.validated()
    }

    /// Lowercases word entries, normalizes overrides and rejects override
    /// chains or sources that collapse onto the same name with different
    /// targets, so that applying the table twice equals applying it once.
    pub fn validated(self) -> Result<Self, RulesError> {
        let mut overrides: BTreeMap<String, String> = BTreeMap::new();
        for (from, to) in &self.overrides {
            let from = strip_periods(from);
            let to = strip_periods(to);
            if from.is_empty() || to.is_empty() {
                return Err(RulesError::EmptyOverride(from));
            }
            match overrides.get(&from) {
                Some(existing) if *existing != to => {
                    return Err(RulesError::ConflictingOverride {
                        source_name: from,
                        first: existing.clone(),
                        second: to,
                    });
                }
                Some(_) => {}
                None => {
                    overrides.insert(from, to);
                }
            }
        }

        for (from, to) in &overrides {
            if from != to && overrides.contains_key(to) {
                return Err(RulesError::OverrideChain {
                    source_name: from.clone(),
                    target: to.clone(),
                });
            }
        }

        Ok(Self {
            particles: lowercase_set(self.particles),
            genitive_heads: lowercase_set(self.genitive_heads),
            genitive_particles: lowercase_set(self.genitive_particles),
            institutional_markers: lowercase_set(self.institutional_markers),
            academic_markers: lowercase_set(self.academic_markers),
            located_academic_markers: self
                .located_academic_markers
                .into_iter()
                .map(|(marker, preposition)| {
                    (marker.to_lowercase(), preposition.to_lowercase())
                })
                .collect(),
            ambiguous_keys: lowercase_set(self.ambiguous_keys),
            overrides,
            policies: self.policies,
        })
    }

    pub(crate) fn is_academic(&self, word: &str) -> bool {
        self.academic_markers.contains(word) || self.located_academic_markers.contains_key(word)
    }
}

fn word_set(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|word| word.to_string()).collect()
}

fn lowercase_set(words: BTreeSet<String>) -> BTreeSet<String> {
    words
        .into_iter()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}
