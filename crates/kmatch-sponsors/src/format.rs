use std::path::PathBuf;

/// Failures reading or writing snapshot tables and the registry document.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(
        "column '{column}' not found. Available columns are: {}",
        available.join(", ")
    )]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("failed to read spreadsheet {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        source: calamine::Error,
    },
    #[error("spreadsheet {} has no worksheets", path.display())]
    EmptyWorkbook { path: PathBuf },
    #[error("cannot write {}: snapshots are written as CSV", path.display())]
    UnsupportedWrite { path: PathBuf },
    #[error("invalid tabular data: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed registry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FormatError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn workbook(path: impl Into<PathBuf>) -> impl FnOnce(calamine::Error) -> Self {
        let path = path.into();
        move |source| Self::Workbook { path, source }
    }
}
