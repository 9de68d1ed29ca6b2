//! The integration pipeline with explicit stages.
//!
//! Stages run in order: ingest, annotate, identity, pivot, score, analyze,
//! output. Each stage takes the previous stage's typed result; data-quality
//! findings accumulate in a `RunReport` and the run never aborts on a bad
//! row.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use redcap_ingest::read_long_table;
use redcap_model::{ConsentStatus, ParticipantIdentity, RunReport};
use redcap_output::{
    ScaleReport, WorkbookTables, build_wide_frame, write_flat_csv, write_workbook,
};
use redcap_report::{
    any_data_count, calculations_table, completeness_summary, demographics_summary,
    improvement_analysis, participant_summary, scale_summary,
};
use redcap_score::calculate_scores;
use redcap_transform::{annotate_events, pivot_time_varying, resolve_identities};

/// Scales that get their own summary/outcomes workbook sheets:
/// (key, higher-is-worse).
const REPORTED_SCALES: [(&str, bool); 3] = [("phq9", true), ("gad7", true), ("who5", false)];

/// Scales listed in the run summary's data-availability block.
const AVAILABILITY_SCALES: [&str; 6] = [
    "phq9_total",
    "gad7_total",
    "who5_total",
    "meq4_total",
    "rrs_total",
    "pcl_total",
];

pub struct IntegrateOptions<'a> {
    pub input: &'a Path,
    pub output_dir: &'a Path,
    pub write_flat: bool,
    pub write_workbook: bool,
    pub dry_run: bool,
}

/// Everything the run summary needs.
#[derive(Debug)]
pub struct IntegrateResult {
    pub output_dir: PathBuf,
    pub participants: usize,
    pub with_baseline: usize,
    pub consent_passed: usize,
    pub rescheduled: usize,
    pub no_baseline: usize,
    pub columns: usize,
    pub flat_csv: Option<PathBuf>,
    pub workbook_dir: Option<PathBuf>,
    /// Participants with any observation, per availability scale.
    pub availability: Vec<(&'static str, usize)>,
    pub report: RunReport,
}

impl IntegrateResult {
    pub fn has_errors(&self) -> bool {
        self.report.has_errors()
    }
}

/// Run the full integration over one export.
pub fn run_integrate(options: &IntegrateOptions<'_>) -> Result<IntegrateResult> {
    let run_span = info_span!("integrate", input = %options.input.display());
    let _run_guard = run_span.enter();
    let run_start = Instant::now();
    let mut report = RunReport::default();

    // Ingest
    let table = info_span!("ingest").in_scope(|| {
        let start = Instant::now();
        let table = read_long_table(options.input)
            .with_context(|| format!("read {}", options.input.display()))?;
        info!(
            rows = table.row_count(),
            columns = table.headers.len(),
            duration_ms = start.elapsed().as_millis(),
            "ingest complete"
        );
        Ok::<_, anyhow::Error>(table)
    })?;

    // Annotate: resolve event labels onto canonical timepoints
    let visits = info_span!("annotate").in_scope(|| {
        let start = Instant::now();
        let visits = annotate_events(&table, &mut report).context("annotate events")?;
        info!(
            resolved = visits.visits.len(),
            excluded = report.rows_excluded,
            duration_ms = start.elapsed().as_millis(),
            "annotate complete"
        );
        Ok::<_, anyhow::Error>(visits)
    })?;

    // Identity: participant-level consent, demographics, rescheduled flag
    let identities = info_span!("identity").in_scope(|| {
        let start = Instant::now();
        let identities = resolve_identities(&table, &visits);
        info!(
            participants = identities.len(),
            duration_ms = start.elapsed().as_millis(),
            "identity complete"
        );
        identities
    });

    // Pivot: one row per participant
    let mut wide = info_span!("pivot").in_scope(|| {
        let start = Instant::now();
        let wide = pivot_time_varying(&table, &visits, &identities, &mut report);
        info!(
            participants = wide.participant_count(),
            columns = wide.column_count(),
            duration_ms = start.elapsed().as_millis(),
            "pivot complete"
        );
        wide
    });

    // Score: totals, severity tiers, derived flags
    info_span!("score").in_scope(|| {
        let start = Instant::now();
        calculate_scores(&mut wide, &mut report);
        info!(
            columns = wide.column_count(),
            duration_ms = start.elapsed().as_millis(),
            "score complete"
        );
    });

    // Analyze: outcome and documentation tables
    let tables = info_span!("analyze").in_scope(|| {
        let start = Instant::now();
        let tables = WorkbookTables {
            summary: participant_summary(&wide, &identities),
            demographics: demographics_summary(&identities),
            completeness: completeness_summary(&wide),
            scale_reports: REPORTED_SCALES
                .iter()
                .map(|(key, higher_is_worse)| {
                    let score = format!("{key}_total");
                    ScaleReport {
                        key: (*key).to_string(),
                        summary: scale_summary(&wide, &score),
                        outcomes: improvement_analysis(&wide, &score, *higher_is_worse),
                    }
                })
                .collect(),
            calculations: calculations_table(),
        };
        info!(
            duration_ms = start.elapsed().as_millis(),
            "analyze complete"
        );
        tables
    });

    // Output
    let (flat_csv, workbook_dir) = info_span!("output").in_scope(|| {
        let start = Instant::now();
        if options.dry_run {
            info!(
                duration_ms = start.elapsed().as_millis(),
                "output skipped (dry run)"
            );
            return Ok::<_, anyhow::Error>((None, None));
        }
        let mut frame = build_wide_frame(&wide).context("assemble wide frame")?;
        let flat_csv = if options.write_flat {
            Some(write_flat_csv(options.output_dir, &mut frame)?)
        } else {
            None
        };
        let workbook_dir = if options.write_workbook {
            Some(write_workbook(options.output_dir, &mut frame, &tables)?)
        } else {
            None
        };
        info!(
            duration_ms = start.elapsed().as_millis(),
            "output complete"
        );
        Ok((flat_csv, workbook_dir))
    })?;

    let availability = AVAILABILITY_SCALES
        .iter()
        .map(|scale| (*scale, any_data_count(&wide, scale)))
        .collect();
    let result = IntegrateResult {
        output_dir: options.output_dir.to_path_buf(),
        participants: identities.len(),
        with_baseline: count(&identities, |identity| identity.has_baseline),
        consent_passed: count(&identities, ParticipantIdentity::consent_passed),
        rescheduled: count(&identities, |identity| identity.dosing_rescheduled),
        no_baseline: count(&identities, |identity| {
            identity.consent_status == ConsentStatus::NoBaseline
        }),
        columns: wide.column_count(),
        flat_csv,
        workbook_dir,
        availability,
        report,
    };
    info!(
        participants = result.participants,
        columns = result.columns,
        issues = result.report.issues.len(),
        duration_ms = run_start.elapsed().as_millis(),
        "integration complete"
    );
    Ok(result)
}

fn count<F>(identities: &[ParticipantIdentity], predicate: F) -> usize
where
    F: Fn(&ParticipantIdentity) -> bool,
{
    identities
        .iter()
        .filter(|identity| predicate(identity))
        .count()
}
