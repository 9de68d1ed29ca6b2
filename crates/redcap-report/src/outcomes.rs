use serde::Serialize;
use tracing::debug;

use redcap_ingest::parse_f64;
use redcap_model::{Timepoint, timepoint_column};
use redcap_transform::WideTable;

use crate::stats::{mean, median, round1, round2, sample_sd};

/// Cross-sectional summary of one score column at one timepoint.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleSummaryRow {
    pub timepoint: Timepoint,
    pub n: usize,
    pub mean: f64,
    /// Sample SD; absent for a single observation.
    pub sd: Option<f64>,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-timepoint descriptive statistics for a score column
/// (`phq9_total`-style base name). Timepoints with zero observations are
/// omitted, not zero-filled.
pub fn scale_summary(wide: &WideTable, score: &str) -> Vec<ScaleSummaryRow> {
    let mut rows = Vec::new();
    for timepoint in Timepoint::ALL {
        let column = timepoint_column(score, timepoint);
        let values = column_values(wide, &column);
        if values.is_empty() {
            continue;
        }
        rows.push(ScaleSummaryRow {
            timepoint,
            n: values.len(),
            mean: round2(mean(&values)),
            sd: sample_sd(&values).map(round2),
            median: round2(median(&values)),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        });
    }
    debug!(score, timepoints = rows.len(), "scale summary built");
    rows
}

/// Paired baseline-vs-followup change for one score column at one
/// follow-up timepoint.
#[derive(Debug, Clone, Serialize)]
pub struct ImprovementRow {
    /// `bl to 1mo`-style comparison label.
    pub comparison: String,
    pub n_paired: usize,
    pub mean_baseline: f64,
    pub mean_followup: f64,
    pub mean_change: f64,
    pub improved_n: usize,
    pub improved_pct: f64,
    pub responders_n: usize,
    /// Paired participants with a non-zero baseline; the responder
    /// percentage is computed over these (the percent-based test is
    /// inapplicable at a zero baseline).
    pub responder_eligible: usize,
    pub responders_pct: f64,
}

/// Paired change/response analysis against baseline for each follow-up
/// timepoint with at least one complete pair.
///
/// Change = follow-up - baseline. "Improved" is a sign test in the
/// clinically favorable direction per polarity; "responder" requires a
/// change of at least half the baseline magnitude in that direction.
pub fn improvement_analysis(
    wide: &WideTable,
    score: &str,
    higher_is_worse: bool,
) -> Vec<ImprovementRow> {
    let baseline_column = timepoint_column(score, Timepoint::T1);
    if !wide.has_column(&baseline_column) {
        return Vec::new();
    }
    let mut rows = Vec::new();
    for timepoint in Timepoint::FOLLOW_UPS {
        let followup_column = timepoint_column(score, timepoint);
        let mut baselines = Vec::new();
        let mut followups = Vec::new();
        for record in &wide.records {
            let baseline = record.value(&baseline_column).and_then(parse_f64);
            let followup = record.value(&followup_column).and_then(parse_f64);
            if let (Some(baseline), Some(followup)) = (baseline, followup) {
                baselines.push(baseline);
                followups.push(followup);
            }
        }
        if baselines.is_empty() {
            continue;
        }

        let mut improved_n = 0usize;
        let mut responders_n = 0usize;
        let mut responder_eligible = 0usize;
        let mut changes = Vec::with_capacity(baselines.len());
        for (&baseline, &followup) in baselines.iter().zip(&followups) {
            let change = followup - baseline;
            changes.push(change);
            let improved = if higher_is_worse {
                change < 0.0
            } else {
                change > 0.0
            };
            if improved {
                improved_n += 1;
            }
            // Guard the relative threshold against a zero baseline: the
            // test is inapplicable there, not a division by zero.
            if baseline != 0.0 {
                responder_eligible += 1;
                let responded = if higher_is_worse {
                    change <= -0.5 * baseline
                } else {
                    change >= 0.5 * baseline
                };
                if responded {
                    responders_n += 1;
                }
            }
        }

        let n_paired = baselines.len();
        rows.push(ImprovementRow {
            comparison: format!("{} to {}", Timepoint::T1.label(), timepoint.label()),
            n_paired,
            mean_baseline: round2(mean(&baselines)),
            mean_followup: round2(mean(&followups)),
            mean_change: round2(mean(&changes)),
            improved_n,
            improved_pct: round1(100.0 * improved_n as f64 / n_paired as f64),
            responders_n,
            responder_eligible,
            responders_pct: if responder_eligible == 0 {
                0.0
            } else {
                round1(100.0 * responders_n as f64 / responder_eligible as f64)
            },
        });
    }
    debug!(score, comparisons = rows.len(), "improvement analysis built");
    rows
}

fn column_values(wide: &WideTable, column: &str) -> Vec<f64> {
    wide.records
        .iter()
        .filter_map(|record| record.value(column).and_then(parse_f64))
        .collect()
}
