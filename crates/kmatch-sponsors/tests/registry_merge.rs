use chrono::NaiveDate;
use kmatch_sponsors::sponsors::{
    derive_key, JsonRegistryStore, KeyRules, MergeOutcome, SponsorRegistry,
};
use std::io::Cursor;

const NEW_COMPANIES: &[&str] = &[
    "A Booth B.V.",
    "Closing the Loop B.V.",
    "Coöperatie Royal FloraHolland U.A.",
    "deugro (Netherlands) B.V.",
    "Hans Anders Nederland B.V.",
    "Independent Films B.V.",
    "Independent Music Group",
    "Kodify B.V.",
    "Marel Customer Center B.V.",
    "Marel GDC B.V.",
    "The Next Web B.V.",
    "The Next Web Events",
    "Total Design B.V.",
    "Universiteit van Amsterdam",
    "Universiteit Leiden",
    "Van der Berg B.V.",
    "Van Aetsveld",
    "Van Aetsveld Advocaten",
    "World Fuel Services Europe",
    "Worldwide Flight Services Holland B.V.",
];

fn seeded_registry() -> SponsorRegistry {
    let json = r#"{
      "lastUpdated": "2024-11-30",
      "sponsors": {
        "marel": ["Marel Stork Poultry Processing B.V."],
        "the-next": ["The Next Web Conference"],
        "universiteit-amsterdam": ["Universiteit van Amsterdam (UvA)"]
      }
    }"#;
    JsonRegistryStore::from_reader(Cursor::new(json)).expect("seed registry parses")
}

#[test]
fn documented_key_examples() {
    let rules = KeyRules::default();
    assert_eq!(derive_key(&rules, "Van der Berg B.V.").key, "van-der-berg");
    assert_eq!(
        derive_key(&rules, "Universiteit van Amsterdam").key,
        "universiteit-amsterdam"
    );
    assert_eq!(
        derive_key(&rules, "Independent Films B.V.").key,
        "independent-films"
    );
}

#[test]
fn merging_kodify_twice_is_a_no_op() {
    let rules = KeyRules::default();
    let first_run = NaiveDate::from_ymd_opt(2025, 1, 10).expect("date");
    let second_run = NaiveDate::from_ymd_opt(2025, 1, 17).expect("date");

    let mut registry = seeded_registry();
    assert!(registry.group("kodify").is_none());

    registry.merge(&rules, "Kodify B.V.");
    assert_eq!(registry.group("kodify"), Some(&["Kodify B.V.".to_string()][..]));
    assert!(registry.finish_run(first_run));

    let mut buffer = Vec::new();
    JsonRegistryStore::to_writer(&mut buffer, &registry).expect("serialize");
    let mut reloaded = JsonRegistryStore::from_reader(Cursor::new(buffer)).expect("reload");

    let outcome = reloaded.merge(&rules, "Kodify B.V.");
    assert_eq!(
        outcome,
        MergeOutcome::Unchanged {
            key: "kodify".to_string()
        }
    );
    assert!(!reloaded.finish_run(second_run));
    assert_eq!(reloaded.last_updated(), Some(first_run));
    assert_eq!(reloaded.groups(), registry.groups());
}

#[test]
fn merge_is_idempotent_for_every_name() {
    let rules = KeyRules::default();
    for name in NEW_COMPANIES {
        let mut once = seeded_registry();
        once.merge(&rules, name);

        let mut twice = once.clone();
        let outcome = twice.merge(&rules, name);

        assert!(!outcome.changed(), "second merge of {name} changed the registry");
        assert_eq!(once, twice, "registry diverged for {name}");
    }
}

#[test]
fn batch_merge_never_duplicates_names_across_groups() {
    let rules = KeyRules::default();
    let mut registry = seeded_registry();

    registry.merge_all(&rules, NEW_COMPANIES);
    registry.merge_all(&rules, NEW_COMPANIES.iter().rev());

    assert!(registry.cross_group_duplicates().is_empty());
    for names in registry.groups().values() {
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len(), "duplicate inside group {names:?}");
    }
}

#[test]
fn single_member_rules_replace_and_append_rules_accumulate() {
    let rules = KeyRules::default();
    let mut registry = seeded_registry();
    registry.merge_all(&rules, NEW_COMPANIES);

    assert_eq!(
        registry.group("the-next"),
        Some(&["The Next Web Events".to_string()][..])
    );
    assert_eq!(
        registry.group("universiteit-amsterdam"),
        Some(&["Universiteit van Amsterdam".to_string()][..])
    );
    assert_eq!(
        registry.group("marel"),
        Some(
            &[
                "Marel Stork Poultry Processing B.V.".to_string(),
                "Marel Customer Center B.V.".to_string(),
                "Marel GDC B.V.".to_string(),
            ][..]
        )
    );
    assert_eq!(
        registry.group("van-aetsveld"),
        Some(&["Van Aetsveld".to_string(), "Van Aetsveld Advocaten".to_string()][..])
    );
    assert_eq!(registry.keys_for("Worldwide Flight Services Holland B.V."), vec!["worldwide"]);
    assert_eq!(registry.keys_for("Independent Music Group"), vec!["independent-music"]);
}

#[test]
fn merge_repairs_names_filed_twice_in_a_loaded_registry() {
    let rules = KeyRules::default();
    let json = r#"{ "sponsors": { "kodify": ["Kodify B.V."], "kodify-bv": ["Kodify B.V."] } }"#;
    let mut registry = JsonRegistryStore::from_reader(Cursor::new(json)).expect("registry parses");
    assert!(!registry.cross_group_duplicates().is_empty());

    let outcome = registry.merge(&rules, "Kodify B.V.");

    assert!(outcome.changed());
    assert!(registry.cross_group_duplicates().is_empty());
    assert_eq!(registry.keys_for("Kodify B.V."), vec!["kodify"]);
    assert!(registry.is_touched());
}
