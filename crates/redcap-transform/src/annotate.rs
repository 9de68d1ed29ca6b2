use std::collections::BTreeSet;

use tracing::{debug, warn};

use redcap_ingest::{LongTable, Result as IngestResult};
use redcap_model::{DataIssue, IssueKind, RawEvent, RunReport, Timepoint, parse_event};

/// One long-format row with its event label resolved to a canonical slot.
#[derive(Debug, Clone)]
pub struct VisitRow {
    /// Index into the source table's rows, preserved for cell access.
    pub row: usize,
    pub record_id: String,
    pub raw_label: String,
    pub event: RawEvent,
}

/// Annotation stage output: the resolvable rows in file order.
#[derive(Debug, Clone, Default)]
pub struct AnnotatedVisits {
    pub visits: Vec<VisitRow>,
}

impl AnnotatedVisits {
    /// Rows of one participant, file order preserved.
    pub fn for_participant<'a>(&'a self, record_id: &str) -> Vec<&'a VisitRow> {
        self.visits
            .iter()
            .filter(|visit| visit.record_id == record_id)
            .collect()
    }

    /// Participant identifiers in order of first appearance.
    pub fn participant_order(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        for visit in &self.visits {
            if seen.insert(visit.record_id.clone()) {
                order.push(visit.record_id.clone());
            }
        }
        order
    }
}

/// Resolve every row's event label to its canonical timepoint.
///
/// Rows with unrecognized labels are excluded and reported. Rows that map a
/// participant onto an already-occupied canonical timepoint (a duplicate
/// standard/rescheduled pair, or a duplicate baseline) are kept for the
/// pivot's per-cell first-wins rule but flagged as `DuplicateVisit`.
pub fn annotate_events(table: &LongTable, report: &mut RunReport) -> IngestResult<AnnotatedVisits> {
    let (record_idx, event_idx) = table.required_columns()?;
    let mut visits = Vec::with_capacity(table.row_count());
    let mut occupied: BTreeSet<(String, Timepoint)> = BTreeSet::new();

    report.rows_read = table.row_count();
    for row in 0..table.row_count() {
        let record_id = table.value(row, record_idx).to_string();
        let raw_label = table.value(row, event_idx).to_string();
        let event = match parse_event(&raw_label) {
            Ok(event) => event,
            Err(error) => {
                warn!(row, record_id = %record_id, %error, "row excluded");
                report.rows_excluded += 1;
                report.push(
                    DataIssue::new(IssueKind::UnrecognizedEvent, error.to_string())
                        .for_record(record_id),
                );
                continue;
            }
        };
        if !occupied.insert((record_id.clone(), event.timepoint)) {
            report.push(
                DataIssue::new(
                    IssueKind::DuplicateVisit,
                    format!(
                        "second row for timepoint {} (label {raw_label}); first row kept",
                        event.timepoint
                    ),
                )
                .for_record(record_id.clone()),
            );
        }
        visits.push(VisitRow {
            row,
            record_id,
            raw_label,
            event,
        });
    }
    debug!(
        resolved = visits.len(),
        excluded = report.rows_excluded,
        "events annotated"
    );
    Ok(AnnotatedVisits { visits })
}
