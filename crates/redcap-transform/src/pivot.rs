use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use redcap_ingest::LongTable;
use redcap_model::{
    DataIssue, IssueKind, ParticipantIdentity, RunReport, Timepoint, timepoint_column,
};
use redcap_registry::InstrumentRegistry;

use crate::annotate::AnnotatedVisits;
use crate::identity::{CHECKBOX_FIELDS, DEMOGRAPHIC_FIELDS};

/// Time-varying columns that are not instrument items or scores but still
/// pivot per timepoint.
const EXTRA_TIME_VARYING: [&str; 3] = ["audit_remaining_total", "treatment_date", "treatment_status"];

/// Participant-level columns, in output order, ahead of every
/// timepoint-qualified block.
const IDENTITY_COLUMNS: [&str; 9] = [
    "record_id",
    "consent_nameprint",
    "consent_status",
    "consent_passed",
    "dosing_rescheduled",
    "has_baseline",
    "consent_age",
    "consent_psilocybintherapy",
    "email",
];

const TRAILING_IDENTITY_COLUMNS: [&str; 3] = ["events_original", "n_events", "timepoints"];

/// One wide-format row. Missing cells are simply absent; nothing is ever
/// imputed or zero-filled.
#[derive(Debug, Clone)]
pub struct WideRecord {
    pub record_id: String,
    values: BTreeMap<String, String>,
}

impl WideRecord {
    fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn value(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.values.insert(column.into(), value.into());
    }

    /// Remove a cell, leaving it missing. Used when a recomputed score is
    /// undefined and must displace a carried source value.
    pub fn clear(&mut self, column: &str) {
        self.values.remove(column);
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

/// The one-row-per-participant table. Column order is deterministic:
/// identity columns, then instrument blocks in catalog order with
/// timepoints in canonical order; scoring appends its derived columns in
/// the same fashion.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    pub columns: Vec<String>,
    pub records: Vec<WideRecord>,
    column_set: BTreeSet<String>,
    index: BTreeMap<String, usize>,
}

impl WideTable {
    pub fn record(&self, record_id: &str) -> Option<&WideRecord> {
        self.index.get(record_id).map(|&idx| &self.records[idx])
    }

    pub fn record_index(&self, record_id: &str) -> Option<usize> {
        self.index.get(record_id).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_set.contains(name)
    }

    /// Register an output column if it is not already present.
    pub fn ensure_column(&mut self, name: &str) {
        if self.column_set.insert(name.to_string()) {
            self.columns.push(name.to_string());
        }
    }

    pub fn participant_count(&self) -> usize {
        self.records.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Reshape the annotated long table into one row per participant.
///
/// Conflict policy (deliberate, not an iteration artifact): the first
/// non-empty value in file order wins a cell; a later differing non-empty
/// value raises a `ConflictingValue` issue and is discarded. Equal repeats
/// are silently absorbed. Baseline-only demographics travel through the
/// identity resolver, not this pivot.
pub fn pivot_time_varying(
    table: &LongTable,
    visits: &AnnotatedVisits,
    identities: &[ParticipantIdentity],
    report: &mut RunReport,
) -> WideTable {
    let registry = InstrumentRegistry::global();
    let mut variables: Vec<String> = registry.time_varying_variables();
    variables.extend(EXTRA_TIME_VARYING.iter().map(|name| (*name).to_string()));
    let present: Vec<(String, usize)> = variables
        .into_iter()
        .filter_map(|variable| {
            table
                .column_index(&variable)
                .map(|index| (variable, index))
        })
        .collect();

    let mut wide = WideTable::default();
    for identity in identities {
        let mut record = WideRecord::new(&identity.record_id);
        fill_identity_columns(&mut record, identity);
        wide.index
            .insert(identity.record_id.clone(), wide.records.len());
        wide.records.push(record);
    }

    for visit in &visits.visits {
        let Some(record_index) = wide.record_index(&visit.record_id) else {
            continue;
        };
        for (variable, column_index) in &present {
            let raw = table.value(visit.row, *column_index);
            if raw.is_empty() {
                continue;
            }
            let column = timepoint_column(variable, visit.event.timepoint);
            let record = &mut wide.records[record_index];
            let existing = record.value(&column).map(str::to_string);
            match existing {
                None => record.set(column, raw),
                Some(existing) if existing == raw => {}
                Some(existing) => {
                    report.push(
                        DataIssue::new(
                            IssueKind::ConflictingValue,
                            format!(
                                "kept '{existing}', ignored '{raw}' from {}",
                                visit.raw_label
                            ),
                        )
                        .for_record(visit.record_id.clone())
                        .for_column(column),
                    );
                }
            }
        }
    }

    let observed: BTreeSet<Timepoint> = visits
        .visits
        .iter()
        .map(|visit| visit.event.timepoint)
        .collect();
    wide.columns = column_order(&wide.records, &present, &observed);
    wide.column_set = wide.columns.iter().cloned().collect();
    debug!(
        participants = wide.participant_count(),
        columns = wide.column_count(),
        "pivot complete"
    );
    wide
}

fn fill_identity_columns(record: &mut WideRecord, identity: &ParticipantIdentity) {
    record.set("record_id", &identity.record_id);
    if let Some(name) = &identity.consent_name {
        record.set("consent_nameprint", name);
    }
    record.set("consent_status", identity.consent_status.as_str());
    record.set("consent_passed", bool_cell(identity.consent_passed()));
    record.set("dosing_rescheduled", bool_cell(identity.dosing_rescheduled));
    record.set("has_baseline", bool_cell(identity.has_baseline));
    if let Some(age) = &identity.consent_age {
        record.set("consent_age", age);
    }
    if let Some(psilocybin) = &identity.consent_psilocybin {
        record.set("consent_psilocybintherapy", psilocybin);
    }
    if let Some(email) = &identity.email {
        record.set("email", email);
    }
    for (field, value) in &identity.demographics {
        record.set(field, value);
    }
    record.set("events_original", identity.events_original.join(", "));
    record.set("n_events", identity.event_count().to_string());
    record.set("timepoints", identity.timepoints_label());
}

fn bool_cell(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Identity columns every run carries regardless of input shape.
const REQUIRED_IDENTITY_COLUMNS: [&str; 5] = [
    "record_id",
    "consent_status",
    "consent_passed",
    "dosing_rescheduled",
    "has_baseline",
];

/// Deterministic output column order: identity block, then each present
/// time-varying variable expanded over every timepoint observed anywhere in
/// the data, canonical order. A column can be entirely empty (a participant
/// missing data at a timepoint yields an empty cell, never a zero); a
/// timepoint no row reached produces no columns at all.
fn column_order(
    records: &[WideRecord],
    present: &[(String, usize)],
    observed: &BTreeSet<Timepoint>,
) -> Vec<String> {
    let populated =
        |column: &str| records.iter().any(|record| record.value(column).is_some());
    let mut columns: Vec<String> = Vec::new();
    for column in IDENTITY_COLUMNS {
        // Optional identity columns (name, consent fields, email) appear
        // only when some participant carries a value.
        if REQUIRED_IDENTITY_COLUMNS.contains(&column) || populated(column) {
            columns.push(column.to_string());
        }
    }
    for field in DEMOGRAPHIC_FIELDS {
        if populated(field) {
            columns.push(field.to_string());
        }
    }
    for (prefix, _, _) in CHECKBOX_FIELDS {
        if populated(prefix) {
            columns.push(prefix.to_string());
        }
    }
    for column in TRAILING_IDENTITY_COLUMNS {
        columns.push(column.to_string());
    }
    for (variable, _) in present {
        for timepoint in Timepoint::ALL {
            if observed.contains(&timepoint) {
                columns.push(timepoint_column(variable, timepoint));
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::annotate_events;
    use crate::identity::resolve_identities;

    fn long_table(headers: &[&str], rows: &[&[&str]]) -> LongTable {
        LongTable {
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn rescheduled_rows_land_in_the_standard_columns() {
        let table = long_table(
            &["record_id", "redcap_event_name", "phq9_1"],
            &[
                &["1", "timepoint_1_arm_1", "3"],
                &["1", "timepoint_3_r_arm_1", "1"],
            ],
        );
        let mut report = RunReport::default();
        let visits = annotate_events(&table, &mut report).unwrap();
        let identities = resolve_identities(&table, &visits);
        let wide = pivot_time_varying(&table, &visits, &identities, &mut report);

        let record = wide.record("1").unwrap();
        assert_eq!(record.value("phq9_1_bl"), Some("3"));
        assert_eq!(record.value("phq9_1_1mo"), Some("1"));
        assert_eq!(record.value("dosing_rescheduled"), Some("true"));
        // No separate rescheduled column may exist.
        assert!(!wide.columns.iter().any(|column| column.contains("_r_")));
    }

    #[test]
    fn conflicting_duplicate_rows_keep_the_first_value() {
        let table = long_table(
            &["record_id", "redcap_event_name", "gad7_1"],
            &[
                &["1", "timepoint_2_arm_1", "2"],
                &["1", "timepoint_2_r_arm_1", "3"],
            ],
        );
        let mut report = RunReport::default();
        let visits = annotate_events(&table, &mut report).unwrap();
        let identities = resolve_identities(&table, &visits);
        let wide = pivot_time_varying(&table, &visits, &identities, &mut report);

        assert_eq!(wide.record("1").unwrap().value("gad7_1_3d"), Some("2"));
        assert_eq!(report.count_of(IssueKind::ConflictingValue), 1);
        assert_eq!(report.count_of(IssueKind::DuplicateVisit), 1);
    }

    #[test]
    fn duplicate_rows_merge_disjoint_cells_without_issue() {
        let table = long_table(
            &["record_id", "redcap_event_name", "rrs_1", "rrs_2"],
            &[
                &["1", "timepoint_2_arm_1", "4", ""],
                &["1", "timepoint_2_r_arm_1", "", "2"],
            ],
        );
        let mut report = RunReport::default();
        let visits = annotate_events(&table, &mut report).unwrap();
        let identities = resolve_identities(&table, &visits);
        let wide = pivot_time_varying(&table, &visits, &identities, &mut report);

        let record = wide.record("1").unwrap();
        assert_eq!(record.value("rrs_1_3d"), Some("4"));
        assert_eq!(record.value("rrs_2_3d"), Some("2"));
        assert_eq!(report.count_of(IssueKind::ConflictingValue), 0);
    }

    #[test]
    fn missing_cells_stay_empty_not_zero() {
        let table = long_table(
            &["record_id", "redcap_event_name", "phq9_1"],
            &[
                &["1", "timepoint_1_arm_1", "2"],
                &["2", "timepoint_1_arm_1", ""],
            ],
        );
        let mut report = RunReport::default();
        let visits = annotate_events(&table, &mut report).unwrap();
        let identities = resolve_identities(&table, &visits);
        let wide = pivot_time_varying(&table, &visits, &identities, &mut report);

        assert_eq!(wide.record("2").unwrap().value("phq9_1_bl"), None);
        // The column itself exists because baseline rows were observed.
        assert!(wide.columns.contains(&"phq9_1_bl".to_string()));
        // No row reached T2, so no 3d columns exist at all.
        assert!(!wide.has_column("phq9_1_3d"));
    }
}
