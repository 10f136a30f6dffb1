use super::normalizer::{key_words, normalize_name};
use super::rules::{KeyRule, KeyRules, MergePolicy};
use serde::Serialize;

/// Group key for a name together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedKey {
    pub key: String,
    pub rule: KeyRule,
    pub policy: MergePolicy,
}

/// Derives the group key for an organization name. Rules are tried in a
/// fixed order (compound prefix, organization type, university, first word)
/// and the first one matching the leading word wins.
pub fn derive_key(rules: &KeyRules, name: &str) -> DerivedKey {
    let normalized = normalize_name(rules, name);
    let words = key_words(&normalized);

    let (key, rule) = match words.first() {
        None => (fallback_key(&normalized, name), KeyRule::Fallback),
        Some(first) if rules.particles.contains(first) => {
            (compound_key(rules, &words), KeyRule::CompoundPrefix)
        }
        Some(first) if rules.institutional_markers.contains(first) => {
            (leading_key(&words, 2), KeyRule::OrganizationType)
        }
        Some(first) if rules.is_academic(first) => {
            (university_key(rules, &words), KeyRule::University)
        }
        Some(first) => {
            let key = if rules.ambiguous_keys.contains(first) {
                leading_key(&words, 2)
            } else {
                first.clone()
            };
            (key, KeyRule::FirstWord)
        }
    };

    DerivedKey {
        key,
        rule,
        policy: rules.policies.for_rule(rule),
    }
}

fn compound_key(rules: &KeyRules, words: &[String]) -> String {
    if !rules.genitive_heads.contains(&words[0]) {
        return words.join("-");
    }

    match words.get(1) {
        Some(second) if rules.genitive_particles.contains(second) => leading_key(words, 3),
        Some(_) => leading_key(words, 2),
        None => words[0].clone(),
    }
}

fn university_key(rules: &KeyRules, words: &[String]) -> String {
    let marker = &words[0];
    let Some(preposition) = rules.located_academic_markers.get(marker) else {
        return words.join("-");
    };

    let location = words
        .iter()
        .skip(1)
        .position(|word| word == preposition)
        .and_then(|index| words.get(index + 2))
        .or_else(|| words.get(1));

    match location {
        Some(location) => format!("{marker}-{location}"),
        None => marker.clone(),
    }
}

fn leading_key(words: &[String], count: usize) -> String {
    words[..count.min(words.len())].join("-")
}

/// Lowercased normalized name with whitespace runs joined by `-`; the trimmed
/// raw name stands in when normalization leaves nothing.
fn fallback_key(normalized: &str, name: &str) -> String {
    let source = if normalized.is_empty() {
        name.trim()
    } else {
        normalized
    };
    source
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
