mod http;
mod parser;

pub use http::HttpRegisterFetcher;
pub use parser::parse_register_table;

use crate::format::FormatError;
use crate::snapshot::SnapshotTable;

/// Public register of recognised sponsors for regular labour and highly
/// skilled migrants.
pub const DEFAULT_REGISTER_URL: &str =
    "https://ind.nl/en/public-register-recognised-sponsors/public-register-regular-labour-and-highly-skilled-migrants";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to register failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("register returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("http runtime unavailable: {0}")]
    Runtime(std::io::Error),
    #[error("register page has no table")]
    MissingTable,
    #[error("register table has no header cells")]
    MissingHeader,
}

/// Header and body cells scraped from the register page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn into_snapshot(self, identity_column: &str) -> Result<SnapshotTable, FormatError> {
        SnapshotTable::from_rows(self.headers, self.rows, identity_column)
    }
}

/// Source of the register table.
pub trait RegisterFetcher {
    fn fetch_register(&self, url: &str) -> Result<RawTable, FetchError>;
}
