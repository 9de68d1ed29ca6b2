use anyhow::{Context, Result};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};

use redcap_ingest::parse_f64;
use redcap_transform::WideTable;

/// Assemble the wide records into a typed polars frame.
///
/// A column becomes numeric when every present value parses as f64;
/// otherwise it stays textual with missing cells as empty strings. The
/// column order is the table's deterministic order.
pub fn build_wide_frame(wide: &WideTable) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(wide.columns.len());
    for name in &wide.columns {
        let cells: Vec<Option<&str>> = wide
            .records
            .iter()
            .map(|record| record.value(name))
            .collect();
        let numeric = cells.iter().flatten().count() > 0
            && cells
                .iter()
                .flatten()
                .all(|value| parse_f64(value).is_some());
        if numeric {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|&cell| cell.and_then(parse_f64))
                .collect();
            columns.push(Series::new(name.as_str().into(), values).into());
        } else {
            let values: Vec<String> = cells
                .iter()
                .map(|&cell| cell.unwrap_or_default().to_string())
                .collect();
            columns.push(Series::new(name.as_str().into(), values).into());
        }
    }
    DataFrame::new(columns).context("build wide frame")
}
