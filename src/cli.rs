use crate::runs::{
    run_export_new, run_key, run_merge, run_scrape, run_update, KeyArgs, MergeArgs, ScrapeArgs,
    SnapshotRunArgs,
};
use clap::{Parser, Subcommand};
use kmatch_sponsors::config::AppConfig;
use kmatch_sponsors::error::AppError;
use kmatch_sponsors::telemetry::{self, Verbosity};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kmatch",
    about = "Maintain the KMatch recognised-sponsor snapshots and lookup registry",
    version
)]
struct Cli {
    /// Directory holding the dated register snapshots
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Registry document to update
    #[arg(long, global = true)]
    registry: Option<PathBuf>,
    /// Column holding the organisation display name
    #[arg(long, global = true)]
    name_column: Option<String>,
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the public register and save it as today's snapshot
    Scrape(ScrapeArgs),
    /// Export organisations added between the two newest snapshots
    ExportNew(SnapshotRunArgs),
    /// Diff the two newest snapshots and merge the additions into the registry
    Update(SnapshotRunArgs),
    /// Merge names from a CSV or spreadsheet export, or a plain list, into the registry
    Merge(MergeArgs),
    /// Show the group key derived for each name
    Key(KeyArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;

    if let Some(data_dir) = cli.data_dir {
        config.paths.data_dir = data_dir;
    }
    if let Some(registry) = cli.registry {
        config.paths.registry_path = registry;
    }
    if let Some(name_column) = cli.name_column {
        config.source.name_column = name_column;
    }

    config.telemetry.verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);

    telemetry::init(&config.telemetry)?;
    let rules = config.key_rules()?;

    match cli.command {
        Command::Scrape(args) => run_scrape(&config, args),
        Command::ExportNew(args) => run_export_new(&config, args),
        Command::Update(args) => run_update(&config, &rules, args),
        Command::Merge(args) => run_merge(&config, &rules, args),
        Command::Key(args) => run_key(&rules, args),
    }
}
