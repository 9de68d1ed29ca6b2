use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unrecognized event label: {0}")]
    UnrecognizedEvent(String),
    #[error("unknown timepoint key: {0}")]
    UnknownTimepoint(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
