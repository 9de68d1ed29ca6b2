//! End-to-end integration over a generated sample export.

use redcap_cli::pipeline::{IntegrateOptions, run_integrate};
use redcap_sample::{SampleOptions, generate_sample, write_sample_csv};

#[test]
fn generated_export_integrates_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample_data.csv");
    let options = SampleOptions {
        participants: 30,
        seed: 7,
        rescheduled_rate: 0.2,
    };
    let sample = generate_sample(&options).unwrap();
    write_sample_csv(&input, &sample).unwrap();

    let result = run_integrate(&IntegrateOptions {
        input: &input,
        output_dir: dir.path(),
        write_flat: true,
        write_workbook: true,
        dry_run: false,
    })
    .unwrap();

    assert_eq!(result.participants, 30);
    assert_eq!(result.with_baseline, 30);
    // The generator emits a complete consent block for everyone.
    assert_eq!(result.consent_passed, 30);
    assert_eq!(result.report.rows_excluded, 0);
    assert!(!result.has_errors());

    let flat = result.flat_csv.as_ref().unwrap();
    assert!(flat.exists());
    let workbook = result.workbook_dir.as_ref().unwrap();
    for sheet in [
        "main_data.csv",
        "summary.csv",
        "demographics.csv",
        "data_completeness.csv",
        "phq9_summary.csv",
        "phq9_outcomes.csv",
        "gad7_summary.csv",
        "who5_summary.csv",
        "calculations.csv",
    ] {
        assert!(workbook.join(sheet).exists(), "missing sheet {sheet}");
    }

    // The flat CSV is one header row plus one row per participant.
    let contents = std::fs::read_to_string(flat).unwrap();
    assert_eq!(contents.lines().count(), 31);
    let header = contents.lines().next().unwrap();
    assert!(header.starts_with("record_id,"));
    // Timepoint-qualified columns carry display labels, never raw codes.
    assert!(header.contains("phq9_total_bl"));
    assert!(!header.contains("_t1"));
    assert!(!header.contains("_r_"));
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample_data.csv");
    let sample = generate_sample(&SampleOptions {
        participants: 5,
        seed: 3,
        rescheduled_rate: 0.0,
    })
    .unwrap();
    write_sample_csv(&input, &sample).unwrap();

    let result = run_integrate(&IntegrateOptions {
        input: &input,
        output_dir: dir.path(),
        write_flat: true,
        write_workbook: true,
        dry_run: true,
    })
    .unwrap();

    assert!(result.flat_csv.is_none());
    assert!(result.workbook_dir.is_none());
    assert!(!dir.path().join("insights.csv").exists());
    assert!(!dir.path().join("insights_workbook").exists());
    assert_eq!(result.participants, 5);
}

#[test]
fn rescheduled_participants_survive_consolidation() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample_data.csv");
    let sample = generate_sample(&SampleOptions {
        participants: 40,
        seed: 11,
        rescheduled_rate: 1.0,
    })
    .unwrap();
    write_sample_csv(&input, &sample).unwrap();

    let result = run_integrate(&IntegrateOptions {
        input: &input,
        output_dir: dir.path(),
        write_flat: false,
        write_workbook: false,
        dry_run: true,
    })
    .unwrap();

    // Every participant used _r spellings; consolidation maps them onto
    // the standard timepoints without duplicate-visit findings.
    assert_eq!(result.rescheduled, 40);
    assert!(!result.has_errors());
}
