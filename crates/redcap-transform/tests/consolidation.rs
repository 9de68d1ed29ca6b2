use std::collections::BTreeSet;

use redcap_ingest::LongTable;
use redcap_model::{ConsentStatus, RunReport, Timepoint, timepoint_column};
use redcap_transform::{annotate_events, pivot_time_varying, resolve_identities};

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
fn rescheduled_participant_consolidates_onto_canonical_timepoints() {
    let table = long_table(
        &["record_id", "redcap_event_name", "phq9_1"],
        &[
            &["12", "timepoint_1_arm_1", "2"],
            &["12", "timepoint_3_r_arm_1", "1"],
        ],
    );
    let mut report = RunReport::default();
    let visits = annotate_events(&table, &mut report).unwrap();
    let identities = resolve_identities(&table, &visits);

    let identity = &identities[0];
    assert!(identity.dosing_rescheduled);
    let expected: BTreeSet<Timepoint> = [Timepoint::T1, Timepoint::T3].into_iter().collect();
    assert_eq!(identity.timepoints, expected);
    assert_eq!(identity.timepoints_label(), "bl, 1mo");
}

#[test]
fn participant_without_baseline_is_kept() {
    let table = long_table(
        &["record_id", "redcap_event_name", "phq9_1", "consent_age"],
        &[
            &["3", "timepoint_4_arm_1", "2", ""],
            &["8", "timepoint_1_arm_1", "1", "1"],
        ],
    );
    let mut report = RunReport::default();
    let visits = annotate_events(&table, &mut report).unwrap();
    let identities = resolve_identities(&table, &visits);
    let wide = pivot_time_varying(&table, &visits, &identities, &mut report);

    let orphan = identities
        .iter()
        .find(|identity| identity.record_id == "3")
        .unwrap();
    assert_eq!(orphan.consent_status, ConsentStatus::NoBaseline);
    assert!(!orphan.has_baseline);
    let record = wide.record("3").unwrap();
    assert_eq!(record.value("consent_status"), Some("no_baseline"));
    assert_eq!(record.value("phq9_1_3mo"), Some("2"));
}

#[test]
fn eligible_but_incomplete_when_all_name_fields_blank() {
    let table = long_table(
        &[
            "record_id",
            "redcap_event_name",
            "consent_age",
            "consent_psilocybintherapy",
            "consent_nameprint",
            "consent_nameprint_v2",
            "consent_nameprint_v3",
        ],
        &[&["5", "timepoint_1_arm_1", "1", "1", "", "  ", ""]],
    );
    let mut report = RunReport::default();
    let visits = annotate_events(&table, &mut report).unwrap();
    let identities = resolve_identities(&table, &visits);
    assert_eq!(
        identities[0].consent_status,
        ConsentStatus::EligibleButIncomplete
    );
    assert_eq!(identities[0].consent_name, None);
}

#[test]
fn later_consent_form_revisions_supply_the_name() {
    let table = long_table(
        &[
            "record_id",
            "redcap_event_name",
            "consent_age",
            "consent_psilocybintherapy",
            "consent_nameprint",
            "consent_nameprint_v3",
        ],
        &[&["5", "timepoint_1_arm_1", "1", "1", "", "Robin Shah"]],
    );
    let mut report = RunReport::default();
    let visits = annotate_events(&table, &mut report).unwrap();
    let identities = resolve_identities(&table, &visits);
    assert_eq!(identities[0].consent_status, ConsentStatus::Passed);
    assert_eq!(identities[0].consent_name.as_deref(), Some("Robin Shah"));
}

#[test]
fn demographics_come_from_baseline_only() {
    let table = long_table(
        &["record_id", "redcap_event_name", "age", "race1___2", "race1___5"],
        &[
            &["4", "timepoint_1_arm_1", "44", "1", "1"],
            // A later visit restating demographics must not overwrite.
            &["4", "timepoint_3_arm_1", "45", "0", "0"],
        ],
    );
    let mut report = RunReport::default();
    let visits = annotate_events(&table, &mut report).unwrap();
    let identities = resolve_identities(&table, &visits);
    assert_eq!(identities[0].demographics.get("age").unwrap(), "44");
    assert_eq!(
        identities[0].demographics.get("race1").unwrap(),
        "Asian, White"
    );
}

/// Re-expanding the wide table by timepoint must recover exactly the
/// (participant, timepoint, variable) triples of the input, modulo rows
/// whose labels did not resolve.
#[test]
fn pivot_round_trips_the_triple_set() {
    let headers = ["record_id", "redcap_event_name", "phq9_1", "gad7_1"];
    let rows: &[&[&str]] = &[
        &["1", "timepoint_1_arm_1", "2", "1"],
        &["1", "timepoint_3_arm_1", "0", ""],
        &["2", "timepoint_1_arm_1", "", "3"],
        &["2", "timepoint_6_r_arm_1", "1", "0"],
        &["3", "not_a_timepoint", "9", "9"],
    ];
    let table = long_table(&headers, rows);
    let mut report = RunReport::default();
    let visits = annotate_events(&table, &mut report).unwrap();
    let identities = resolve_identities(&table, &visits);
    let wide = pivot_time_varying(&table, &visits, &identities, &mut report);

    let mut expected: BTreeSet<(String, Timepoint, String, String)> = BTreeSet::new();
    for visit in &visits.visits {
        for variable in ["phq9_1", "gad7_1"] {
            let value = table.value(visit.row, table.column_index(variable).unwrap());
            if !value.is_empty() {
                expected.insert((
                    visit.record_id.clone(),
                    visit.event.timepoint,
                    variable.to_string(),
                    value.to_string(),
                ));
            }
        }
    }

    let mut actual: BTreeSet<(String, Timepoint, String, String)> = BTreeSet::new();
    for record in &wide.records {
        for variable in ["phq9_1", "gad7_1"] {
            for timepoint in Timepoint::ALL {
                if let Some(value) = record.value(&timepoint_column(variable, timepoint)) {
                    actual.insert((
                        record.record_id.clone(),
                        timepoint,
                        variable.to_string(),
                        value.to_string(),
                    ));
                }
            }
        }
    }
    assert_eq!(actual, expected);
    // The unresolvable row is excluded, not silently invented.
    assert!(wide.record("3").is_none());
    assert_eq!(report.rows_excluded, 1);
}
