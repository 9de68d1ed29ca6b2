pub mod error;
pub mod long_table;

pub use error::{IngestError, Result};
pub use long_table::{
    EVENT_NAME, LongTable, RECORD_ID, format_numeric, parse_f64, read_long_table,
};
