use chrono::NaiveDate;
use kmatch_sponsors::pipeline::{
    capture_snapshot, compare_latest, export_new_entries, update_registry,
};
use kmatch_sponsors::register::{FetchError, RawTable, RegisterFetcher};
use kmatch_sponsors::snapshot::{
    discover_snapshots, snapshot_file_name, CsvTableStore, FileTableStore, TabularStore,
};
use kmatch_sponsors::sponsors::{JsonRegistryStore, KeyRules, RegistryStore};
use std::fs;
use std::path::{Path, PathBuf};

struct TempDir(PathBuf);

impl TempDir {
    fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "kmatch-sponsors-{label}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("create temp dir");
        Self(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }

    fn copy_fixture(&self, fixture: &str, name: &str) -> PathBuf {
        let source = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(fixture);
        let path = self.0.join(name);
        fs::copy(&source, &path).expect("copy fixture");
        path
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn seed_snapshots(dir: &TempDir) {
    dir.write(
        "KMatch - 28_12_2024.csv",
        "Organisation,KvK number\nOld Corp B.V.,1\n",
    );
    dir.write(
        "KMatch - 05_01_2025.csv",
        "Organisation,KvK number\nA Booth B.V.,10\nKodify B.V.,11\nRetired B.V.,12\n",
    );
    dir.write(
        "KMatch - 12_01_2025.csv",
        "Organisation,KvK number\nKodify B.V.,11\nA Booth B.V.,10\nVan der Berg B.V.,13\nUniversiteit van Amsterdam,14\n",
    );
    dir.write("KMatch - 2025-01-19.csv", "Organisation\nIgnored\n");
    dir.write("notes.txt", "not a snapshot");
}

#[test]
fn discovery_orders_newest_first_and_ignores_strays() {
    let dir = TempDir::new("discovery");
    seed_snapshots(&dir);

    let snapshots = discover_snapshots(dir.path()).expect("discover");
    let dates: Vec<NaiveDate> = snapshots.iter().map(|file| file.date).collect();
    assert_eq!(
        dates,
        vec![date(2025, 1, 12), date(2025, 1, 5), date(2024, 12, 28)]
    );
}

#[test]
fn fewer_than_two_snapshots_is_nothing_to_do() {
    let dir = TempDir::new("single");
    dir.write(
        &snapshot_file_name(date(2025, 1, 5)),
        "Organisation\nKodify B.V.\n",
    );

    let comparison = compare_latest(&CsvTableStore, dir.path(), "Organisation").expect("compare");
    assert!(comparison.is_none());
}

#[test]
fn export_and_update_follow_latest_snapshots() {
    let dir = TempDir::new("update");
    seed_snapshots(&dir);
    let registry_path = dir.write(
        "sponsors.json",
        r#"{ "lastUpdated": "2025-01-05", "sponsors": { "kodify": ["Kodify B.V."] } }"#,
    );

    let comparison = compare_latest(&CsvTableStore, dir.path(), "Organisation")
        .expect("compare")
        .expect("two snapshots present");
    assert_eq!(comparison.pair.latest.date, date(2025, 1, 12));
    assert_eq!(comparison.pair.previous.date, date(2025, 1, 5));
    assert_eq!(
        comparison.diff.added_names().collect::<Vec<_>>(),
        vec!["Van der Berg B.V.", "Universiteit van Amsterdam"]
    );
    assert_eq!(comparison.diff.removed.len(), 1);
    assert_eq!(comparison.diff.removed[0].name, "Retired B.V.");

    let today = date(2025, 1, 13);
    let exported = export_new_entries(&CsvTableStore, &comparison, dir.path(), today)
        .expect("export")
        .expect("new entries written");
    assert!(exported.ends_with("new_entries_13_01_2025.csv"));
    let exported_table = CsvTableStore
        .read_table(&exported, "Organisation")
        .expect("read export");
    assert_eq!(exported_table.headers(), ["Organisation", "KvK number"]);
    assert_eq!(exported_table.records()[0].cells, vec!["Van der Berg B.V.", "13"]);

    let rules = KeyRules::default();
    let update = update_registry(
        &JsonRegistryStore,
        &registry_path,
        &rules,
        comparison.diff.added_names(),
        today,
    )
    .expect("update registry");
    assert!(update.written);
    assert_eq!(update.summary.added, 2);
    assert_eq!(update.summary.replaced, 0);
    assert_eq!(update.last_updated, Some(today));

    let registry = JsonRegistryStore.read_registry(&registry_path).expect("reload");
    assert_eq!(
        registry.group("van-der-berg"),
        Some(&["Van der Berg B.V.".to_string()][..])
    );
    assert!(registry.group("universiteit-amsterdam").is_some());

    let rerun = update_registry(
        &JsonRegistryStore,
        &registry_path,
        &rules,
        comparison.diff.added_names(),
        date(2025, 1, 20),
    )
    .expect("rerun");
    assert!(!rerun.written);
    assert_eq!(rerun.last_updated, Some(today));
}

#[test]
fn spreadsheet_snapshots_are_compared_with_csv_ones() {
    let dir = TempDir::new("xlsx");
    dir.copy_fixture("KMatch - 05_01_2025.xlsx", "KMatch - 05_01_2025.xlsx");
    dir.copy_fixture("KMatch - 05_01_2025.xlsx", "KMatch - 12_01_2025.xlsx");
    dir.write(
        "KMatch - 12_01_2025.csv",
        "Organisation,KvK number\nKodify B.V.,12345678\nNew Co B.V.,55\n",
    );

    let snapshots = discover_snapshots(dir.path()).expect("discover");
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots[0].path.ends_with("KMatch - 12_01_2025.csv"));
    assert!(snapshots[1].path.ends_with("KMatch - 05_01_2025.xlsx"));

    let comparison = compare_latest(&FileTableStore, dir.path(), "Organisation")
        .expect("compare")
        .expect("two snapshots present");
    assert_eq!(
        comparison.diff.added_names().collect::<Vec<_>>(),
        vec!["New Co B.V."]
    );
    assert_eq!(
        comparison
            .diff
            .removed
            .iter()
            .map(|record| record.name.as_str())
            .collect::<Vec<_>>(),
        vec!["Vintus B.V."]
    );
}

#[test]
fn empty_name_list_leaves_registry_untouched() {
    let dir = TempDir::new("empty-merge");
    let original = "{\"sponsors\":{\"kodify\":[\"Kodify B.V.\"]},\"lastUpdated\":\"2025-01-05\"}";
    let registry_path = dir.write("sponsors.json", original);

    let update = update_registry(
        &JsonRegistryStore,
        &registry_path,
        &KeyRules::default(),
        Vec::<String>::new(),
        date(2025, 2, 1),
    )
    .expect("update");

    assert!(!update.written);
    assert_eq!(
        fs::read_to_string(&registry_path).expect("read back"),
        original
    );
}

struct StaticFetcher(&'static str);

impl RegisterFetcher for StaticFetcher {
    fn fetch_register(&self, _url: &str) -> Result<RawTable, FetchError> {
        kmatch_sponsors::register::parse_register_table(self.0)
    }
}

#[test]
fn capture_writes_dated_snapshot() {
    let dir = TempDir::new("capture");
    let fetcher = StaticFetcher(
        "<table><tr><th>Organisation</th><th>KvK number</th></tr>\
         <tr><td>Kodify B.V.</td><td>11</td></tr>\
         <tr><td>Vintus B.V.</td><td>12</td></tr></table>",
    );
    let output = dir.path().join(snapshot_file_name(date(2025, 1, 12)));

    let table = capture_snapshot(
        &fetcher,
        &CsvTableStore,
        "https://example.invalid/register",
        "Organisation",
        &output,
    )
    .expect("capture");
    assert_eq!(table.len(), 2);

    let stored = fs::read_to_string(&output).expect("snapshot written");
    assert_eq!(
        stored,
        "Organisation,KvK number\nKodify B.V.,11\nVintus B.V.,12\n"
    );
}

#[test]
fn capture_reports_missing_identity_column() {
    let dir = TempDir::new("capture-missing");
    let fetcher = StaticFetcher("<table><tr><th>Name</th></tr><tr><td>Kodify</td></tr></table>");
    let output = dir.path().join("out.csv");

    let error = capture_snapshot(
        &fetcher,
        &CsvTableStore,
        "https://example.invalid/register",
        "Organisation",
        &output,
    )
    .expect_err("missing column");
    assert!(error.to_string().contains("Available columns are: Name"));
    assert!(!output.exists());
}
