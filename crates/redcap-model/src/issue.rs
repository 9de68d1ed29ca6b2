use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Category of a detected data-quality problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Raw event label not in the canonical mapping; the row is excluded.
    UnrecognizedEvent,
    /// Two source rows resolve to the same canonical timepoint for one
    /// participant (includes duplicate baselines).
    DuplicateVisit,
    /// A later row supplied a different non-empty value for an occupied
    /// wide-table cell; the first value was kept.
    ConflictingValue,
    /// An item or total value outside the instrument's declared range.
    /// The value is passed through unclamped.
    OutOfRange,
}

impl IssueKind {
    /// Stable short code for reports.
    pub fn code(self) -> &'static str {
        match self {
            IssueKind::UnrecognizedEvent => "RC001",
            IssueKind::DuplicateVisit => "RC002",
            IssueKind::ConflictingValue => "RC003",
            IssueKind::OutOfRange => "RC004",
        }
    }

    pub fn default_severity(self) -> IssueSeverity {
        match self {
            IssueKind::UnrecognizedEvent | IssueKind::DuplicateVisit => IssueSeverity::Error,
            IssueKind::ConflictingValue | IssueKind::OutOfRange => IssueSeverity::Warning,
        }
    }
}

/// A single detected data-quality issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataIssue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    /// Participant the issue belongs to, when attributable.
    pub record_id: Option<String>,
    /// Wide-table column or source variable, when attributable.
    pub column: Option<String>,
    pub message: String,
}

impl DataIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            record_id: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn for_record(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn for_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

/// Accumulated diagnostics for one pipeline run.
///
/// The pipeline never aborts on a bad row; every detected problem lands
/// here and is reported at the end of the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub issues: Vec<DataIssue>,
    /// Long-format rows read from the input.
    pub rows_read: usize,
    /// Rows excluded because their event label did not resolve.
    pub rows_excluded: usize,
}

impl RunReport {
    pub fn push(&mut self, issue: DataIssue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }

    pub fn merge(&mut self, other: RunReport) {
        self.issues.extend(other.issues);
        self.rows_read += other.rows_read;
        self.rows_excluded += other.rows_excluded;
    }
}
