//! Long-to-wide consolidation stages.
//!
//! The pipeline runs annotate -> identity -> pivot, each stage taking an
//! immutable input and returning a new typed result. Data-quality findings
//! accumulate in a shared `RunReport`; no stage aborts on a bad row.

pub mod annotate;
pub mod identity;
pub mod pivot;

pub use annotate::{AnnotatedVisits, VisitRow, annotate_events};
pub use identity::resolve_identities;
pub use pivot::{WideRecord, WideTable, pivot_time_varying};
