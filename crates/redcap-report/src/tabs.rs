use serde::Serialize;

use redcap_ingest::{format_numeric, parse_f64};
use redcap_model::{ParticipantIdentity, Timepoint, timepoint_column};
use redcap_registry::InstrumentRegistry;
use redcap_transform::WideTable;

use crate::stats::{mean, sample_sd};

/// Score columns tracked in the completeness matrix.
pub const KEY_SCALES: [&str; 13] = [
    "phq9_total",
    "gad7_total",
    "who5_total",
    "psyflex_total",
    "auditc_total",
    "meq4_total",
    "ebi_total",
    "piq_total",
    "ceq_total",
    "rrs_total",
    "bcss_total",
    "pcl_total",
    "ies_r_total",
];

/// Score column bases reported in the compact participant summary.
pub const SUMMARY_SCALES: [&str; 9] = [
    "phq9_total",
    "gad7_total",
    "who5_total",
    "meq4_total",
    "psyflex_total",
    "auditc_total",
    "ebi_total",
    "piq_total",
    "ceq_total",
];

const GENDER_LABELS: [(&str, &str); 4] = [
    ("1", "Male"),
    ("2", "Female"),
    ("3", "Non-binary"),
    ("4", "Other"),
];

/// One line of the demographics summary (consented participants only).
#[derive(Debug, Clone, Serialize)]
pub struct DemographicsRow {
    pub variable: String,
    pub category: String,
    pub n: String,
    pub percent: String,
}

pub fn demographics_summary(identities: &[ParticipantIdentity]) -> Vec<DemographicsRow> {
    let consented: Vec<&ParticipantIdentity> = identities
        .iter()
        .filter(|identity| identity.consent_passed())
        .collect();
    if consented.is_empty() {
        return vec![DemographicsRow {
            variable: "Note".to_string(),
            category: String::new(),
            n: "No consented participants found".to_string(),
            percent: String::new(),
        }];
    }

    let mut rows = Vec::new();
    let ages: Vec<f64> = consented
        .iter()
        .filter_map(|identity| identity.demographics.get("age").and_then(|age| parse_f64(age)))
        .collect();
    if !ages.is_empty() {
        let sd = sample_sd(&ages).unwrap_or(0.0);
        rows.push(DemographicsRow {
            variable: "Age".to_string(),
            category: "Mean (SD)".to_string(),
            n: format!("{:.1} ({:.1})", mean(&ages), sd),
            percent: String::new(),
        });
    }

    let rescheduled = consented
        .iter()
        .filter(|identity| identity.dosing_rescheduled)
        .count();
    rows.push(DemographicsRow {
        variable: "Dosing Rescheduled".to_string(),
        category: "Yes".to_string(),
        n: rescheduled.to_string(),
        percent: format!("{:.1}%", 100.0 * rescheduled as f64 / consented.len() as f64),
    });

    let with_gender = consented
        .iter()
        .filter(|identity| identity.demographics.contains_key("gender"))
        .count();
    for (code, label) in GENDER_LABELS {
        let count = consented
            .iter()
            .filter(|identity| {
                identity.demographics.get("gender").map(String::as_str) == Some(code)
            })
            .count();
        if count > 0 {
            rows.push(DemographicsRow {
                variable: "Gender".to_string(),
                category: label.to_string(),
                n: count.to_string(),
                percent: format!("{:.1}%", 100.0 * count as f64 / with_gender as f64),
            });
        }
    }
    rows
}

/// Non-missing observation counts per key scale at one timepoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessRow {
    pub timepoint: Timepoint,
    /// Counts aligned with [`KEY_SCALES`].
    pub counts: Vec<usize>,
}

pub fn completeness_summary(wide: &WideTable) -> Vec<CompletenessRow> {
    Timepoint::ALL
        .into_iter()
        .map(|timepoint| CompletenessRow {
            timepoint,
            counts: KEY_SCALES
                .iter()
                .map(|scale| {
                    let column = timepoint_column(scale, timepoint);
                    wide.records
                        .iter()
                        .filter(|record| record.value(&column).is_some())
                        .count()
                })
                .collect(),
        })
        .collect()
}

/// First/last observed score and net change for one scale of one
/// participant.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleChange {
    pub scale: &'static str,
    pub first: Option<f64>,
    pub last: Option<f64>,
    /// Last minus first; absent unless both exist at distinct timepoints.
    pub change: Option<f64>,
}

/// Compact per-participant overview: identity fields plus first/last/change
/// for each summary scale.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantSummaryRow {
    pub record_id: String,
    pub consent_name: Option<String>,
    pub consent_status: String,
    pub dosing_rescheduled: bool,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub n_events: usize,
    pub timepoints: String,
    pub scales: Vec<ScaleChange>,
}

pub fn participant_summary(
    wide: &WideTable,
    identities: &[ParticipantIdentity],
) -> Vec<ParticipantSummaryRow> {
    identities
        .iter()
        .map(|identity| {
            let record = wide.record(&identity.record_id);
            let scales = SUMMARY_SCALES
                .iter()
                .map(|&scale| {
                    let mut first: Option<(Timepoint, f64)> = None;
                    let mut last: Option<(Timepoint, f64)> = None;
                    if let Some(record) = record {
                        for timepoint in Timepoint::ALL {
                            let column = timepoint_column(scale, timepoint);
                            if let Some(value) = record.value(&column).and_then(parse_f64) {
                                if first.is_none() {
                                    first = Some((timepoint, value));
                                }
                                last = Some((timepoint, value));
                            }
                        }
                    }
                    let change = match (first, last) {
                        (Some((first_tp, first_value)), Some((last_tp, last_value)))
                            if first_tp != last_tp =>
                        {
                            Some(last_value - first_value)
                        }
                        _ => None,
                    };
                    ScaleChange {
                        scale,
                        first: first.map(|(_, value)| value),
                        last: last.map(|(_, value)| value),
                        change,
                    }
                })
                .collect();
            ParticipantSummaryRow {
                record_id: identity.record_id.clone(),
                consent_name: identity.consent_name.clone(),
                consent_status: identity.consent_status.to_string(),
                dosing_rescheduled: identity.dosing_rescheduled,
                age: identity.demographics.get("age").cloned(),
                gender: identity.demographics.get("gender").cloned(),
                n_events: identity.event_count(),
                timepoints: identity.timepoints_label(),
                scales,
            }
        })
        .collect()
}

/// One row of the calculations documentation table.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationRow {
    pub measure: String,
    pub score_name: String,
    pub calculation: String,
    pub item_range: String,
    pub total_range: String,
    pub timepoints: String,
    pub higher_is_worse: bool,
    pub interpretation: String,
}

/// Enumerate every instrument's scoring rule and interpretation bands, for
/// the workbook's documentation sheet.
pub fn calculations_table() -> Vec<CalculationRow> {
    InstrumentRegistry::global()
        .iter()
        .map(|instrument| CalculationRow {
            measure: instrument.name.to_string(),
            score_name: instrument.total_variable(),
            calculation: format!("{} of {} items", instrument.scoring, instrument.items),
            item_range: instrument.item_range_label(),
            total_range: instrument.total_range_label(),
            timepoints: instrument
                .timepoints
                .iter()
                .map(|timepoint| timepoint.label())
                .collect::<Vec<_>>()
                .join(", "),
            higher_is_worse: instrument.higher_is_worse,
            interpretation: instrument.interpretation.unwrap_or_default().to_string(),
        })
        .collect()
}

/// Data-availability line for the run summary: participants with any
/// observation of the scale at any timepoint.
pub fn any_data_count(wide: &WideTable, scale: &str) -> usize {
    wide.records
        .iter()
        .filter(|record| {
            Timepoint::ALL.iter().any(|&timepoint| {
                record
                    .value(&timepoint_column(scale, timepoint))
                    .is_some()
            })
        })
        .count()
}

/// Render an optional score for display, empty when missing.
pub fn display_score(value: Option<f64>) -> String {
    value.map(format_numeric).unwrap_or_default()
}
