use tracing::debug;

use redcap_ingest::{format_numeric, parse_f64};
use redcap_model::{DataIssue, IssueKind, RunReport, Timepoint, timepoint_column};
use redcap_registry::{Instrument, InstrumentRegistry, ScoringRule};
use redcap_transform::WideTable;

/// Compute every instrument total, severity tier, and derived flag the
/// registry declares, for every (instrument, timepoint) pair whose item
/// columns made it into the wide table.
///
/// Scoring is complete-case throughout: a single missing item leaves the
/// total undefined, never partial-summed. Where an export carried a
/// precomputed score column, the computed value displaces it whenever the
/// item columns exist; otherwise the carried value passes through.
pub fn calculate_scores(wide: &mut WideTable, report: &mut RunReport) {
    let registry = InstrumentRegistry::global();
    let mut scored_cells = 0usize;
    for timepoint in Timepoint::ALL {
        for instrument in registry.iter() {
            // Administration-schedule violations are filtered upstream;
            // a pair outside the schedule is silently skipped.
            if !instrument.administered_at(timepoint) {
                continue;
            }
            if instrument.short_form.is_some() {
                scored_cells += score_long_form(wide, instrument, timepoint, report);
                continue;
            }
            scored_cells += score_instrument(wide, instrument, timepoint, report);
        }
    }
    debug!(scored_cells, "scores calculated");
}

/// Generic path: one instrument at one timepoint.
fn score_instrument(
    wide: &mut WideTable,
    instrument: &Instrument,
    timepoint: Timepoint,
    report: &mut RunReport,
) -> usize {
    let item_columns: Vec<String> = instrument
        .item_variables()
        .iter()
        .map(|item| timepoint_column(item, timepoint))
        .collect();
    if !item_columns.iter().all(|column| wide.has_column(column)) {
        // Items never collected at this timepoint: leave any carried
        // source score column untouched.
        return 0;
    }

    let total_column = timepoint_column(&instrument.total_variable(), timepoint);
    wide.ensure_column(&total_column);
    let severity_column = instrument.has_severity_bands().then(|| {
        let column = timepoint_column(&format!("{}_severity", instrument.key), timepoint);
        wide.ensure_column(&column);
        column
    });
    let notable_column = instrument.notable_cutoff.map(|_| {
        let column = timepoint_column(&format!("{}_mystical", instrument.key), timepoint);
        wide.ensure_column(&column);
        column
    });

    let mut scored = 0usize;
    for index in 0..wide.records.len() {
        let total = complete_case_total(wide, index, instrument, &item_columns, report);
        let record = &mut wide.records[index];
        match total {
            Some(ItemTotal::Numeric(total)) => {
                record.set(&total_column, format_numeric(total));
                scored += 1;
                if let Some(column) = &severity_column {
                    match instrument.severity_label(total) {
                        Some(label) => record.set(column, label),
                        None => record.clear(column),
                    }
                }
                if let (Some(column), Some(cutoff)) = (&notable_column, instrument.notable_cutoff) {
                    record.set(column, if total >= cutoff { "Yes" } else { "No" });
                }
                check_total_range(instrument, total, &total_column, index, wide, report);
            }
            Some(ItemTotal::Verbatim(value)) => {
                record.set(&total_column, value);
                scored += 1;
            }
            None => {
                // Undefined: displace any carried source value too.
                record.clear(&total_column);
                if let Some(column) = &severity_column {
                    record.clear(column);
                }
                if let Some(column) = &notable_column {
                    record.clear(column);
                }
            }
        }
    }
    scored
}

/// The one named special case: a long form sharing its leading items with a
/// short form (AUDIT). The full total is the complete-case sum over the
/// shared head plus the owned tail, and a version column records which form
/// the participant completed.
fn score_long_form(
    wide: &mut WideTable,
    instrument: &Instrument,
    timepoint: Timepoint,
    report: &mut RunReport,
) -> usize {
    let registry = InstrumentRegistry::global();
    let Some(short) = instrument.short_form.and_then(|key| registry.get(key)) else {
        return 0;
    };
    let head_columns: Vec<String> = short
        .item_variables()
        .iter()
        .map(|item| timepoint_column(item, timepoint))
        .collect();
    let tail_columns: Vec<String> = instrument
        .item_variables()
        .iter()
        .map(|item| timepoint_column(item, timepoint))
        .collect();
    let has_head = head_columns.iter().all(|column| wide.has_column(column));
    let has_tail = tail_columns.iter().all(|column| wide.has_column(column));
    if !has_head {
        return 0;
    }

    let prefix = instrument.item_prefix.unwrap_or(instrument.key);
    let version_column = timepoint_column(&format!("{prefix}_version"), timepoint);
    let total_column = timepoint_column(&instrument.total_variable(), timepoint);
    if has_tail {
        wide.ensure_column(&total_column);
    }
    wide.ensure_column(&version_column);

    let all_columns: Vec<String> = head_columns
        .iter()
        .chain(tail_columns.iter())
        .cloned()
        .collect();
    let mut scored = 0usize;
    for index in 0..wide.records.len() {
        let head_complete = columns_complete(wide, index, &head_columns);
        let tail_complete = has_tail && columns_complete(wide, index, &tail_columns);
        if has_tail {
            match complete_case_total(wide, index, instrument, &all_columns, report) {
                Some(ItemTotal::Numeric(total)) => {
                    wide.records[index].set(&total_column, format_numeric(total));
                    scored += 1;
                    check_total_range(instrument, total, &total_column, index, wide, report);
                }
                _ => wide.records[index].clear(&total_column),
            }
        }
        let version = if tail_complete {
            "full"
        } else if head_complete {
            "short"
        } else {
            ""
        };
        let record = &mut wide.records[index];
        if version.is_empty() {
            record.clear(&version_column);
        } else {
            record.set(&version_column, version);
        }
    }
    scored
}

enum ItemTotal {
    Numeric(f64),
    /// Single-value instruments report the lone item verbatim.
    Verbatim(String),
}

/// Complete-case total for one record. Any missing or unparseable item
/// yields `None`; out-of-range items are flagged but still counted.
fn complete_case_total(
    wide: &WideTable,
    index: usize,
    instrument: &Instrument,
    item_columns: &[String],
    report: &mut RunReport,
) -> Option<ItemTotal> {
    let record = &wide.records[index];
    let mut values = Vec::with_capacity(item_columns.len());
    for column in item_columns {
        let raw = record.value(column)?;
        let value = parse_f64(raw)?;
        if value < instrument.item_range.0 || value > instrument.item_range.1 {
            report.push(
                DataIssue::new(
                    IssueKind::OutOfRange,
                    format!(
                        "item value {raw} outside {} range {}",
                        instrument.key,
                        instrument.item_range_label()
                    ),
                )
                .for_record(record.record_id.clone())
                .for_column(column.clone()),
            );
        }
        values.push(value);
    }
    if instrument.scoring == ScoringRule::SingleValue {
        let raw = record.value(&item_columns[0])?;
        return Some(ItemTotal::Verbatim(raw.to_string()));
    }
    let sum: f64 = values.iter().sum();
    let total = match instrument.scoring {
        ScoringRule::Sum => sum,
        ScoringRule::SumTimes4 => sum * 4.0,
        ScoringRule::Mean => round2(sum / values.len() as f64),
        ScoringRule::SingleValue => unreachable!(),
    };
    Some(ItemTotal::Numeric(total))
}

fn columns_complete(wide: &WideTable, index: usize, columns: &[String]) -> bool {
    let record = &wide.records[index];
    columns
        .iter()
        .all(|column| record.value(column).and_then(parse_f64).is_some())
}

fn check_total_range(
    instrument: &Instrument,
    total: f64,
    total_column: &str,
    index: usize,
    wide: &WideTable,
    report: &mut RunReport,
) {
    if total < instrument.total_range.0 || total > instrument.total_range.1 {
        report.push(
            DataIssue::new(
                IssueKind::OutOfRange,
                format!(
                    "total {} outside {} range {}",
                    format_numeric(total),
                    instrument.key,
                    instrument.total_range_label()
                ),
            )
            .for_record(wide.records[index].record_id.clone())
            .for_column(total_column.to_string()),
        );
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
