pub mod error;
pub mod identity;
pub mod issue;
pub mod timepoint;

pub use error::{ModelError, Result};
pub use identity::{ConsentStatus, ParticipantIdentity};
pub use issue::{DataIssue, IssueKind, IssueSeverity, RunReport};
pub use timepoint::{RawEvent, Timepoint, parse_event, timepoint_column};
