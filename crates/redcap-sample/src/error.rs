use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("participant count must be at least 1")]
    NoParticipants,
    #[error("rescheduled rate {0} is not a probability")]
    InvalidRate(f64),
}

pub type Result<T> = std::result::Result<T, SampleError>;
