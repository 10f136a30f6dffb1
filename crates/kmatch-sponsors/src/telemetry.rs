use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose own spans drown out ours once debug output is enabled.
const NOISY_DEPENDENCIES: &[&str] = &["hyper", "hyper_util", "reqwest", "html5ever", "selectors"];
const OWN_TARGETS: &[&str] = &["kmatch", "kmatch_sponsors"];

/// How chatty a run should be, as picked on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only.
    Quiet,
    /// `RUST_LOG`, else `KMATCH_LOG_LEVEL`.
    #[default]
    Normal,
    /// Debug output from the KMatch crates (`-v`).
    Verbose,
    /// Trace output from the KMatch crates (`-vv` and up).
    Trace,
}

impl Verbosity {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directives}'")]
    Filter {
        directives: String,
        #[source]
        source: ParseError,
    },
    #[error("log subscriber already installed: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Filter directives for a run. Command-line verbosity wins over both
/// `RUST_LOG` and the configured level; `RUST_LOG` (passed in as
/// `env_filter`) wins over the configured level.
pub fn filter_directives(config: &TelemetryConfig, env_filter: Option<&str>) -> String {
    let base = env_filter
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(config.log_level.trim());

    match config.verbosity {
        Verbosity::Quiet => "warn".to_string(),
        Verbosity::Normal => base.to_string(),
        Verbosity::Verbose => with_own_level(base, "debug"),
        Verbosity::Trace => with_own_level(base, "trace"),
    }
}

fn with_own_level(base: &str, level: &str) -> String {
    let mut directives: Vec<String> = vec![base.to_string()];
    directives.extend(OWN_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.extend(NOISY_DEPENDENCIES.iter().map(|target| format!("{target}=warn")));
    directives.join(",")
}

/// Installs the global subscriber on stderr so run reports on stdout stay
/// clean.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = filter_directives(config, rust_log.as_deref());
    let env_filter =
        EnvFilter::try_new(&directives).map_err(|source| TelemetryError::Filter {
            directives: directives.clone(),
            source,
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(matches!(config.verbosity, Verbosity::Verbose | Verbosity::Trace))
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
