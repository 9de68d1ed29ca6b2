use std::io::Write;

use redcap_ingest::{IngestError, read_long_table};

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn reads_a_regular_export() {
    let file = write_csv(
        "record_id,redcap_event_name,phq9_1\n\
         1,timepoint_1_arm_1,2\n\
         1,timepoint_3_arm_1,1\n\
         2,timepoint_1_arm_1,\n",
    );
    let table = read_long_table(file.path()).unwrap();
    assert_eq!(table.row_count(), 3);
    assert_eq!(table.headers, vec!["record_id", "redcap_event_name", "phq9_1"]);
    assert_eq!(table.value_by_name(1, "phq9_1"), Some("1"));
    assert_eq!(table.value_by_name(2, "phq9_1"), None);
    assert!(table.required_columns().is_ok());
}

#[test]
fn strips_bom_and_whitespace_and_blank_rows() {
    let file = write_csv(
        "\u{feff}record_id , redcap_event_name \n\
         ,\n\
         \" 7 \",timepoint_1_arm_1\n",
    );
    let table = read_long_table(file.path()).unwrap();
    assert_eq!(table.headers, vec!["record_id", "redcap_event_name"]);
    assert_eq!(table.row_count(), 1);
    assert_eq!(table.value_by_name(0, "record_id"), Some("7"));
}

#[test]
fn missing_required_column_is_reported_by_name() {
    let file = write_csv("record_id,phq9_1\n1,2\n");
    let table = read_long_table(file.path()).unwrap();
    let err = table.required_columns().unwrap_err();
    match err {
        IngestError::MissingColumn(name) => assert_eq!(name, "redcap_event_name"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn short_rows_are_padded() {
    let file = write_csv("record_id,redcap_event_name,gad7_1\n5,timepoint_1_arm_1\n");
    let table = read_long_table(file.path()).unwrap();
    assert_eq!(table.value(0, 2), "");
}

#[test]
fn empty_input_is_an_error() {
    let file = write_csv("record_id,redcap_event_name\n");
    assert!(matches!(
        read_long_table(file.path()),
        Err(IngestError::Empty)
    ));
}
