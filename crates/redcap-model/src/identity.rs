use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timepoint::Timepoint;

/// Outcome of the baseline consent/eligibility chain.
///
/// Resolution short-circuits in a fixed priority order: missing baseline,
/// missing age consent, failed age check, missing therapy consent, failed
/// therapy consent, then name presence across the three consent-form
/// revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentStatus {
    /// All checks passed and a printed name is on file.
    Passed,
    /// Age-eligibility field answered "no".
    FailedAgeCheck,
    /// Therapy-willingness field answered "no".
    FailedPsilocybinCheck,
    /// A required consent field was left blank.
    Incomplete,
    /// Both eligibility checks passed but no usable name in any revision.
    EligibleButIncomplete,
    /// Participant has visit data but no baseline row at all.
    NoBaseline,
}

impl ConsentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsentStatus::Passed => "passed",
            ConsentStatus::FailedAgeCheck => "failed_age_check",
            ConsentStatus::FailedPsilocybinCheck => "failed_psilocybin_check",
            ConsentStatus::Incomplete => "incomplete",
            ConsentStatus::EligibleButIncomplete => "eligible_but_incomplete",
            ConsentStatus::NoBaseline => "no_baseline",
        }
    }

    /// Only fully consented participants enter the demographics summary.
    pub fn passed(self) -> bool {
        self == ConsentStatus::Passed
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Participant-level facts derived once from all of a participant's visit
/// rows. Immutable after resolution; demographics are captured from the
/// baseline row only and never overwritten by later visits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantIdentity {
    pub record_id: String,
    /// True iff any of the participant's raw labels was an `_r` spelling.
    pub dosing_rescheduled: bool,
    pub has_baseline: bool,
    pub consent_status: ConsentStatus,
    /// Raw age-consent value from baseline, if present.
    pub consent_age: Option<String>,
    /// Raw therapy-consent value from baseline, if present.
    pub consent_psilocybin: Option<String>,
    /// First non-blank printed name across the v1/v2/v3 consent revisions.
    pub consent_name: Option<String>,
    /// First non-blank email across the v1/v2/v3 revisions.
    pub email: Option<String>,
    /// Baseline demographic snapshot (age, gender, ...) plus collapsed
    /// checkbox fields, keyed by output column name.
    pub demographics: BTreeMap<String, String>,
    /// Raw event labels in file order, for audit.
    pub events_original: Vec<String>,
    /// Canonical timepoints this participant has data for.
    pub timepoints: BTreeSet<Timepoint>,
}

impl ParticipantIdentity {
    /// Identity for a participant with follow-up rows but no baseline.
    /// Such participants stay in the output, never dropped.
    pub fn without_baseline(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            dosing_rescheduled: false,
            has_baseline: false,
            consent_status: ConsentStatus::NoBaseline,
            consent_age: None,
            consent_psilocybin: None,
            consent_name: None,
            email: None,
            demographics: BTreeMap::new(),
            events_original: Vec::new(),
            timepoints: BTreeSet::new(),
        }
    }

    pub fn consent_passed(&self) -> bool {
        self.consent_status.passed()
    }

    /// Comma-joined timepoint labels, chronological (`bl, 1mo, 12mo`).
    pub fn timepoints_label(&self) -> String {
        let labels: Vec<&str> = self.timepoints.iter().map(|tp| tp.label()).collect();
        labels.join(", ")
    }

    pub fn event_count(&self) -> usize {
        self.events_original.len()
    }
}
