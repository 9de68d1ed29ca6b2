use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// One of the six canonical measurement occasions of the protocol.
///
/// Every raw REDCap event label resolves to exactly one variant. Rescheduled
/// (`_r`) spellings resolve to the same variant as their standard
/// counterpart; baseline has no rescheduled spelling by design.
///
/// The derive order gives the canonical chronological ordering, so the enum
/// can be sorted and compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timepoint {
    /// Baseline (pre-intervention).
    T1,
    /// Dosing session (3 days post-treatment).
    T2,
    /// 1 month post-treatment.
    T3,
    /// 3 months post-treatment.
    T4,
    /// 6 months post-treatment.
    T5,
    /// 12 months post-treatment.
    T6,
}

impl Timepoint {
    /// All timepoints in canonical chronological order.
    pub const ALL: [Timepoint; 6] = [
        Timepoint::T1,
        Timepoint::T2,
        Timepoint::T3,
        Timepoint::T4,
        Timepoint::T5,
        Timepoint::T6,
    ];

    /// Follow-up occasions eligible for baseline-vs-followup comparisons.
    /// T2 is the acute dosing measure and is excluded from paired outcome
    /// analyses.
    pub const FOLLOW_UPS: [Timepoint; 4] = [
        Timepoint::T3,
        Timepoint::T4,
        Timepoint::T5,
        Timepoint::T6,
    ];

    /// Internal key as used in the source event labels (`t1`..`t6`).
    pub fn key(self) -> &'static str {
        match self {
            Timepoint::T1 => "t1",
            Timepoint::T2 => "t2",
            Timepoint::T3 => "t3",
            Timepoint::T4 => "t4",
            Timepoint::T5 => "t5",
            Timepoint::T6 => "t6",
        }
    }

    /// Human-readable label used in all output column names.
    pub fn label(self) -> &'static str {
        match self {
            Timepoint::T1 => "bl",
            Timepoint::T2 => "3d",
            Timepoint::T3 => "1mo",
            Timepoint::T4 => "3mo",
            Timepoint::T5 => "6mo",
            Timepoint::T6 => "12mo",
        }
    }

    /// Long description for documentation tables.
    pub fn description(self) -> &'static str {
        match self {
            Timepoint::T1 => "Baseline (pre-intervention)",
            Timepoint::T2 => "3 days post-treatment",
            Timepoint::T3 => "1 month post-treatment",
            Timepoint::T4 => "3 months post-treatment",
            Timepoint::T5 => "6 months post-treatment",
            Timepoint::T6 => "12 months post-treatment",
        }
    }

    /// 1-based protocol index (`t3` -> 3).
    pub fn index(self) -> u8 {
        match self {
            Timepoint::T1 => 1,
            Timepoint::T2 => 2,
            Timepoint::T3 => 3,
            Timepoint::T4 => 4,
            Timepoint::T5 => 5,
            Timepoint::T6 => 6,
        }
    }

    pub fn is_baseline(self) -> bool {
        self == Timepoint::T1
    }

    /// Look up a timepoint by its 1-based protocol index.
    pub fn from_index(index: u8) -> Option<Timepoint> {
        Timepoint::ALL.get(index.checked_sub(1)? as usize).copied()
    }
}

impl fmt::Display for Timepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Timepoint {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "t1" => Ok(Timepoint::T1),
            "t2" => Ok(Timepoint::T2),
            "t3" => Ok(Timepoint::T3),
            "t4" => Ok(Timepoint::T4),
            "t5" => Ok(Timepoint::T5),
            "t6" => Ok(Timepoint::T6),
            other => Err(ModelError::UnknownTimepoint(other.to_string())),
        }
    }
}

/// A raw visit-event label resolved to its canonical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub timepoint: Timepoint,
    /// True when the label carried the `_r` (rescheduled dosing) spelling.
    pub rescheduled: bool,
}

/// Resolve a raw REDCap event label to its canonical timepoint.
///
/// The mapping is many-to-one: `timepoint_{k}_arm_1` and
/// `timepoint_{k}_r_arm_1` both resolve to timepoint k. Baseline
/// (`timepoint_1_arm_1`) has no `_r` variant; any other spelling is an
/// unrecognized label and must be surfaced to the caller, not dropped.
pub fn parse_event(raw: &str) -> Result<RawEvent, ModelError> {
    let event = |timepoint, rescheduled| RawEvent {
        timepoint,
        rescheduled,
    };
    match raw.trim() {
        "timepoint_1_arm_1" => Ok(event(Timepoint::T1, false)),
        "timepoint_2_arm_1" => Ok(event(Timepoint::T2, false)),
        "timepoint_2_r_arm_1" => Ok(event(Timepoint::T2, true)),
        "timepoint_3_arm_1" => Ok(event(Timepoint::T3, false)),
        "timepoint_3_r_arm_1" => Ok(event(Timepoint::T3, true)),
        "timepoint_4_arm_1" => Ok(event(Timepoint::T4, false)),
        "timepoint_4_r_arm_1" => Ok(event(Timepoint::T4, true)),
        "timepoint_5_arm_1" => Ok(event(Timepoint::T5, false)),
        "timepoint_5_r_arm_1" => Ok(event(Timepoint::T5, true)),
        "timepoint_6_arm_1" => Ok(event(Timepoint::T6, false)),
        "timepoint_6_r_arm_1" => Ok(event(Timepoint::T6, true)),
        other => Err(ModelError::UnrecognizedEvent(other.to_string())),
    }
}

/// Build a timepoint-qualified output column name (`phq9_total` at T1 ->
/// `phq9_total_bl`). All wide-table columns are named through this helper so
/// display labels are applied once, up front.
pub fn timepoint_column(variable: &str, timepoint: Timepoint) -> String {
    format!("{variable}_{}", timepoint.label())
}
