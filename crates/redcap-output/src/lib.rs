pub mod frame;
pub mod write;

pub use frame::build_wide_frame;
pub use write::{ScaleReport, WorkbookTables, write_flat_csv, write_workbook};
