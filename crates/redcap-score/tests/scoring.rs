use redcap_ingest::LongTable;
use redcap_model::{IssueKind, RunReport};
use redcap_score::calculate_scores;
use redcap_transform::{WideTable, annotate_events, pivot_time_varying, resolve_identities};

/// Run the full consolidation so scoring sees the same wide shape the
/// pipeline produces.
fn wide_from(headers: &[&str], rows: &[&[&str]]) -> (WideTable, RunReport) {
    let table = LongTable {
        headers: headers.iter().map(|h| (*h).to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
            .collect(),
    };
    let mut report = RunReport::default();
    let visits = annotate_events(&table, &mut report).unwrap();
    let identities = resolve_identities(&table, &visits);
    let mut wide = pivot_time_varying(&table, &visits, &identities, &mut report);
    calculate_scores(&mut wide, &mut report);
    (wide, report)
}

fn phq9_headers() -> Vec<&'static str> {
    let mut headers = vec!["record_id", "redcap_event_name"];
    headers.extend([
        "phq9_1", "phq9_2", "phq9_3", "phq9_4", "phq9_5", "phq9_6", "phq9_7", "phq9_8", "phq9_9",
    ]);
    headers
}

#[test]
fn sum_scoring_with_all_items_present() {
    let headers = phq9_headers();
    let row: &[&str] = &[
        "1", "timepoint_1_arm_1", "1", "1", "1", "1", "1", "1", "1", "1", "1",
    ];
    let (wide, report) = wide_from(&headers, &[row]);
    let record = wide.record("1").unwrap();
    assert_eq!(record.value("phq9_total_bl"), Some("9"));
    assert_eq!(record.value("phq9_severity_bl"), Some("Mild"));
    assert_eq!(report.count_of(IssueKind::OutOfRange), 0);
}

#[test]
fn one_missing_item_leaves_the_total_undefined() {
    let headers = phq9_headers();
    let row: &[&str] = &[
        "1", "timepoint_1_arm_1", "3", "3", "3", "3", "3", "3", "3", "3", "",
    ];
    let complete: &[&str] = &[
        "2", "timepoint_1_arm_1", "2", "2", "2", "2", "2", "2", "2", "2", "2",
    ];
    let (wide, _) = wide_from(&headers, &[row, complete]);
    let partial = wide.record("1").unwrap();
    // Never partial-summed: severity stays undefined with the total.
    assert_eq!(partial.value("phq9_total_bl"), None);
    assert_eq!(partial.value("phq9_severity_bl"), None);
    let full = wide.record("2").unwrap();
    assert_eq!(full.value("phq9_total_bl"), Some("18"));
    assert_eq!(full.value("phq9_severity_bl"), Some("Moderately severe"));
}

#[test]
fn mean_scoring_rounds_and_flags_mystical_experience() {
    let headers = ["record_id", "redcap_event_name", "meq4_1", "meq4_2", "meq4_3", "meq4_4"];
    let high: &[&str] = &["1", "timepoint_2_arm_1", "4", "4", "3", "4"];
    let low: &[&str] = &["2", "timepoint_2_arm_1", "1", "2", "1", "1"];
    let partial: &[&str] = &["3", "timepoint_2_arm_1", "5", "5", "", "5"];
    let (wide, _) = wide_from(&headers, &[high, low, partial]);

    let record = wide.record("1").unwrap();
    assert_eq!(record.value("meq4_total_3d"), Some("3.75"));
    assert_eq!(record.value("meq4_mystical_3d"), Some("Yes"));

    let record = wide.record("2").unwrap();
    assert_eq!(record.value("meq4_total_3d"), Some("1.25"));
    assert_eq!(record.value("meq4_mystical_3d"), Some("No"));

    // Complete-case applies to the mean as well.
    let record = wide.record("3").unwrap();
    assert_eq!(record.value("meq4_total_3d"), None);
    assert_eq!(record.value("meq4_mystical_3d"), None);
}

#[test]
fn sum_times_four_rescales_wellbeing() {
    let headers = ["record_id", "redcap_event_name", "who5_1", "who5_2", "who5_3", "who5_4", "who5_5"];
    let row: &[&str] = &["1", "timepoint_1_arm_1", "3", "4", "2", "5", "1"];
    let (wide, _) = wide_from(&headers, &[row]);
    // Raw sum 15 on the 0-25 scale maps to 60 on the percentage scale.
    assert_eq!(wide.record("1").unwrap().value("who5_total_bl"), Some("60"));
}

#[test]
fn single_value_instruments_carry_the_item_verbatim() {
    let headers = ["record_id", "redcap_event_name", "expectancy_1"];
    let row: &[&str] = &["1", "timepoint_1_arm_1", "7"];
    let (wide, _) = wide_from(&headers, &[row]);
    assert_eq!(
        wide.record("1").unwrap().value("expectancy_total_bl"),
        Some("7")
    );
}

#[test]
fn audit_merge_rule_and_version_flag() {
    let mut headers = vec!["record_id", "redcap_event_name"];
    headers.extend(["auditc_1", "auditc_2", "auditc_3"]);
    headers.extend(["audit_4", "audit_5", "audit_6", "audit_7", "audit_8", "audit_9", "audit_10"]);
    let full: &[&str] = &["1", "timepoint_1_arm_1", "2", "1", "3", "1", "0", "2", "1", "0", "1", "2"];
    let short_only: &[&str] = &["2", "timepoint_1_arm_1", "1", "1", "1", "", "", "", "", "", "", ""];
    let (wide, _) = wide_from(&headers, &[full, short_only]);

    let record = wide.record("1").unwrap();
    // Short form scores on its own items; the full form adds the tail.
    assert_eq!(record.value("auditc_total_bl"), Some("6"));
    assert_eq!(record.value("audit_full_total_bl"), Some("13"));
    assert_eq!(record.value("audit_version_bl"), Some("full"));

    let record = wide.record("2").unwrap();
    assert_eq!(record.value("auditc_total_bl"), Some("3"));
    assert_eq!(record.value("audit_full_total_bl"), None);
    assert_eq!(record.value("audit_version_bl"), Some("short"));
}

#[test]
fn out_of_schedule_pairs_are_silently_skipped() {
    // PHQ-9 is not administered at the dosing session; a stray column set
    // at T2 must not produce a total.
    let headers = phq9_headers();
    let row: &[&str] = &[
        "1", "timepoint_2_arm_1", "1", "1", "1", "1", "1", "1", "1", "1", "1",
    ];
    let (wide, report) = wide_from(&headers, &[row]);
    assert_eq!(wide.record("1").unwrap().value("phq9_total_3d"), None);
    assert!(!wide.has_column("phq9_total_3d"));
    // A schedule violation is not an error.
    assert!(!report.has_errors());
}

#[test]
fn out_of_range_items_are_flagged_not_clamped() {
    let headers = ["record_id", "redcap_event_name", "peg_1", "peg_2", "peg_3"];
    let row: &[&str] = &["1", "timepoint_1_arm_1", "11", "5", "5"];
    let (wide, report) = wide_from(&headers, &[row]);
    // 11 exceeds the 0-10 item range; the total still reflects it.
    assert_eq!(wide.record("1").unwrap().value("peg_total_bl"), Some("21"));
    assert_eq!(report.count_of(IssueKind::OutOfRange), 1);
}

#[test]
fn carried_source_totals_are_displaced_by_recomputation() {
    let mut headers = phq9_headers();
    headers.push("phq9_total");
    let row: &[&str] = &[
        "1", "timepoint_1_arm_1", "1", "1", "1", "1", "1", "1", "1", "1", "", "99",
    ];
    let (wide, _) = wide_from(&headers, &[row]);
    // Items exist but are incomplete: the stale export total must not
    // survive into the scored column.
    assert_eq!(wide.record("1").unwrap().value("phq9_total_bl"), None);
}
