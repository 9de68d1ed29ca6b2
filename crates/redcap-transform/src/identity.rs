use std::collections::BTreeMap;

use tracing::debug;

use redcap_ingest::LongTable;
use redcap_model::{ConsentStatus, ParticipantIdentity, Timepoint};

use crate::annotate::{AnnotatedVisits, VisitRow};

/// Printed-name fields across the three consent-form revisions, searched in
/// order; the first non-blank value is canonical.
const NAME_FIELDS: [&str; 3] = ["consent_nameprint", "consent_nameprint_v2", "consent_nameprint_v3"];

const EMAIL_FIELDS: [&str; 3] = ["email", "email_v2", "email_v3"];

/// Plain demographic fields captured from the baseline row only.
pub(crate) const DEMOGRAPHIC_FIELDS: [&str; 9] = [
    "age",
    "gender",
    "sex",
    "education",
    "relat",
    "latino",
    "income_est",
    "military_service",
    "consent_date",
];

/// Checkbox-style multi-selects: (prefix, option count, option labels).
/// A `None` label table renders generic `Option {k}` names.
pub(crate) const CHECKBOX_FIELDS: [(&str, u32, Option<&[&str]>); 4] = [
    (
        "race1",
        6,
        Some(&["AI/AN", "Asian", "Black", "NH/PI", "White", "Other"]),
    ),
    ("employ", 9, None),
    ("psychiatric_medications", 8, None),
    (
        "psychedelics_used",
        9,
        Some(&[
            "Psilocybin",
            "LSD",
            "MDMA",
            "Ayahuasca",
            "DMT",
            "Mescaline",
            "Ketamine",
            "Salvia",
            "Other",
        ]),
    ),
];

/// Resolve one identity per participant from that participant's visit rows.
///
/// Participants appear in order of first appearance in the file; a
/// participant with follow-up rows but no baseline is retained with
/// `no_baseline` status.
pub fn resolve_identities(table: &LongTable, visits: &AnnotatedVisits) -> Vec<ParticipantIdentity> {
    let mut identities = Vec::new();
    for record_id in visits.participant_order() {
        let rows = visits.for_participant(&record_id);
        identities.push(resolve_one(table, &record_id, &rows));
    }
    debug!(participants = identities.len(), "identities resolved");
    identities
}

fn resolve_one(table: &LongTable, record_id: &str, rows: &[&VisitRow]) -> ParticipantIdentity {
    let mut identity = ParticipantIdentity::without_baseline(record_id);
    identity.dosing_rescheduled = rows.iter().any(|visit| visit.event.rescheduled);
    identity.events_original = rows.iter().map(|visit| visit.raw_label.clone()).collect();
    identity.timepoints = rows.iter().map(|visit| visit.event.timepoint).collect();

    // First baseline row in file order wins; duplicates were already
    // flagged during annotation.
    let Some(baseline) = rows
        .iter()
        .find(|visit| visit.event.timepoint == Timepoint::T1)
    else {
        return identity;
    };
    identity.has_baseline = true;

    let row = baseline.row;
    identity.consent_age = table.value_by_name(row, "consent_age").map(String::from);
    identity.consent_psilocybin = table
        .value_by_name(row, "consent_psilocybintherapy")
        .map(String::from);
    identity.consent_name = first_non_blank(table, row, &NAME_FIELDS);
    identity.email = first_non_blank(table, row, &EMAIL_FIELDS);
    identity.consent_status = resolve_consent_status(
        identity.consent_age.as_deref(),
        identity.consent_psilocybin.as_deref(),
        identity.consent_name.as_deref(),
    );
    identity.demographics = capture_demographics(table, row);
    identity
}

/// The consent chain is a total function of the baseline fields, resolved
/// in fixed priority order.
fn resolve_consent_status(
    consent_age: Option<&str>,
    consent_psilocybin: Option<&str>,
    consent_name: Option<&str>,
) -> ConsentStatus {
    let Some(age) = consent_age else {
        return ConsentStatus::Incomplete;
    };
    if is_refusal(age) {
        return ConsentStatus::FailedAgeCheck;
    }
    let Some(psilocybin) = consent_psilocybin else {
        return ConsentStatus::Incomplete;
    };
    if is_refusal(psilocybin) {
        return ConsentStatus::FailedPsilocybinCheck;
    }
    match consent_name {
        Some(_) => ConsentStatus::Passed,
        None => ConsentStatus::EligibleButIncomplete,
    }
}

/// REDCap exports code yes/no consent radio fields as 1/0.
fn is_refusal(value: &str) -> bool {
    matches!(value.trim(), "0" | "no" | "No")
}

fn first_non_blank(table: &LongTable, row: usize, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        table
            .value_by_name(row, field)
            .filter(|value| !value.trim().is_empty())
            .map(String::from)
    })
}

fn capture_demographics(table: &LongTable, row: usize) -> BTreeMap<String, String> {
    let mut demographics = BTreeMap::new();
    for field in DEMOGRAPHIC_FIELDS {
        if let Some(value) = table.value_by_name(row, field) {
            demographics.insert(field.to_string(), value.to_string());
        }
    }
    for (prefix, count, labels) in CHECKBOX_FIELDS {
        if let Some(collapsed) = collapse_checkbox(table, row, prefix, count, labels) {
            demographics.insert(prefix.to_string(), collapsed);
        }
    }
    demographics
}

/// Collapse `{prefix}___{k}` checkbox columns into one comma-joined label
/// list. Returns None when no column exists or nothing is selected.
fn collapse_checkbox(
    table: &LongTable,
    row: usize,
    prefix: &str,
    count: u32,
    labels: Option<&[&str]>,
) -> Option<String> {
    let mut any_column = false;
    let mut selected = Vec::new();
    for option in 1..=count {
        let column = format!("{prefix}___{option}");
        let Some(index) = table.column_index(&column) else {
            continue;
        };
        any_column = true;
        if table.value(row, index) == "1" {
            let label = match labels {
                Some(labels) => labels
                    .get(option as usize - 1)
                    .map_or_else(|| format!("Option {option}"), |label| (*label).to_string()),
                None => format!("Option {option}"),
            };
            selected.push(label);
        }
    }
    if !any_column || selected.is_empty() {
        return None;
    }
    Some(selected.join(", "))
}
