pub mod catalog;
pub mod instrument;
pub mod registry;

pub use catalog::CATALOG;
pub use instrument::{Instrument, ScoringRule, SeverityBand};
pub use registry::InstrumentRegistry;
