pub mod error;
pub mod generator;

pub use error::{Result, SampleError};
pub use generator::{SampleOptions, generate_sample, write_sample_csv};
