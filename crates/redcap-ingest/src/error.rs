use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("input has no data rows")]
    Empty,
    #[error("required column missing: {0}")]
    MissingColumn(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
