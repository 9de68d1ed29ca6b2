//! Read-only outcome aggregation over the scored wide table.

pub mod outcomes;
pub mod stats;
pub mod tabs;

pub use outcomes::{ImprovementRow, ScaleSummaryRow, improvement_analysis, scale_summary};
pub use tabs::{
    CalculationRow, CompletenessRow, DemographicsRow, KEY_SCALES, ParticipantSummaryRow,
    SUMMARY_SCALES, ScaleChange, any_data_count, calculations_table, completeness_summary,
    demographics_summary, display_score, participant_summary,
};
