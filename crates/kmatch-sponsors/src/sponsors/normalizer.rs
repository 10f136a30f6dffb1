use super::rules::KeyRules;

/// Trims and drops literal periods so `B.V.` and `BV` collapse together.
pub(crate) fn strip_periods(value: &str) -> String {
    value.trim().replace('.', "").trim().to_string()
}

/// Normalized key input: periods stripped, then the override table applied.
pub fn normalize_name(rules: &KeyRules, name: &str) -> String {
    let stripped = strip_periods(name);
    match rules.overrides.get(&stripped) {
        Some(corrected) => strip_periods(corrected),
        None => stripped,
    }
}

/// Lowercased words with every non-alphanumeric character removed; words
/// left empty (a lone `&` or `-`) are dropped.
pub(crate) fn key_words(normalized: &str) -> Vec<String> {
    normalized
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect()
}
