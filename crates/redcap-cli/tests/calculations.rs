//! Snapshot coverage for the calculations documentation table.

use redcap_report::calculations_table;

#[test]
fn phq9_calculation_documentation_is_stable() {
    let table = calculations_table();
    let row = table
        .iter()
        .find(|row| row.score_name == "phq9_total")
        .unwrap();
    insta::assert_json_snapshot!("phq9_calculation", row);
}

#[test]
fn every_instrument_is_documented() {
    let table = calculations_table();
    assert_eq!(table.len(), 53);
    assert!(table.iter().all(|row| !row.calculation.is_empty()));
    assert!(table.iter().all(|row| !row.timepoints.is_empty()));
}
