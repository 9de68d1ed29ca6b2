use serde::Serialize;
use std::fmt;

use redcap_model::Timepoint;

/// How an instrument's item responses combine into its total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    /// Arithmetic sum of all items; any missing item leaves the total
    /// undefined (complete-case).
    Sum,
    /// Arithmetic mean of all items, complete-case, 2 decimal places.
    Mean,
    /// Complete-case sum scaled by 4 (0-25 raw -> 0-100 percentage scale).
    SumTimes4,
    /// The lone item's value verbatim.
    SingleValue,
}

impl ScoringRule {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoringRule::Sum => "sum",
            ScoringRule::Mean => "mean",
            ScoringRule::SumTimes4 => "sum_x4",
            ScoringRule::SingleValue => "single",
        }
    }
}

impl fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One tier of an instrument's interpretation band table. Bands are
/// inclusive on both ends, monotonic, non-overlapping, and cover the whole
/// declared total range.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeverityBand {
    pub min: f64,
    pub max: f64,
    pub label: &'static str,
}

/// Descriptor for one measurement instrument.
///
/// The catalog is pure data: scoring code iterates it generically and never
/// branches on instrument names, with the single documented exception of
/// the AUDIT short/long pair (see `item_prefix` / `short_form`).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Instrument {
    /// Unique short code; also the column-name prefix of its items.
    pub key: &'static str,
    pub name: &'static str,
    /// Number of items contributing to the total.
    pub items: u32,
    /// Inclusive range of a single item response.
    pub item_range: (f64, f64),
    /// Inclusive range of the total score under the scoring rule.
    pub total_range: (f64, f64),
    pub scoring: ScoringRule,
    /// Canonical timepoints at which the instrument is administered.
    pub timepoints: &'static [Timepoint],
    /// Polarity: true when a higher total is clinically worse.
    pub higher_is_worse: bool,
    /// Free-text interpretation guidance for the documentation table.
    pub interpretation: Option<&'static str>,
    /// Interpretation bands for instruments that define them; empty
    /// otherwise.
    pub severity_bands: &'static [SeverityBand],
    /// Threshold on the total above which the "notable experience" flag is
    /// set (MEQ-4 complete mystical experience at a 3.5 mean).
    pub notable_cutoff: Option<f64>,
    /// Item-column prefix when it differs from `key`. The AUDIT full form
    /// shares items 1-3 with AUDIT-C and names its own tail `audit_4..10`.
    pub item_prefix: Option<&'static str>,
    /// Key of the short form this instrument extends, if any. The short
    /// form owns the shared leading items.
    pub short_form: Option<&'static str>,
    /// Number of leading items shared with the linked short form.
    pub shared_items: u32,
}

impl Instrument {
    /// Source column names of the items this instrument *owns* in the long
    /// export. For a long form extending a short form, only the tail items
    /// are owned (the shared head is pivoted via the short form).
    pub fn item_variables(&self) -> Vec<String> {
        let prefix = self.item_prefix.unwrap_or(self.key);
        (self.shared_items + 1..=self.items)
            .map(|index| format!("{prefix}_{index}"))
            .collect()
    }

    /// Name of the precomputed score column some exports carry alongside
    /// the items (`phq9_total`, `meq4_mean`).
    pub fn source_score_variable(&self) -> String {
        match self.scoring {
            ScoringRule::Mean => format!("{}_mean", self.key),
            _ => format!("{}_total", self.key),
        }
    }

    /// Base name of the computed total column (`phq9_total`).
    pub fn total_variable(&self) -> String {
        format!("{}_total", self.key)
    }

    pub fn administered_at(&self, timepoint: Timepoint) -> bool {
        self.timepoints.contains(&timepoint)
    }

    pub fn has_severity_bands(&self) -> bool {
        !self.severity_bands.is_empty()
    }

    /// Band label for a computed total; `None` for an undefined total or a
    /// value no band covers (the latter is an out-of-range signal upstream).
    pub fn severity_label(&self, total: f64) -> Option<&'static str> {
        self.severity_bands
            .iter()
            .find(|band| total >= band.min && total <= band.max)
            .map(|band| band.label)
    }

    /// `0-27`-style range text for documentation tables.
    pub fn item_range_label(&self) -> String {
        format_range(self.item_range)
    }

    pub fn total_range_label(&self) -> String {
        format_range(self.total_range)
    }
}

fn format_range(range: (f64, f64)) -> String {
    format!("{}-{}", format_bound(range.0), format_bound(range.1))
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANDS: &[SeverityBand] = &[
        SeverityBand {
            min: 0.0,
            max: 4.0,
            label: "None-minimal",
        },
        SeverityBand {
            min: 5.0,
            max: 9.0,
            label: "Mild",
        },
    ];

    fn sample() -> Instrument {
        Instrument {
            key: "demo",
            name: "Demo Scale",
            items: 3,
            item_range: (0.0, 3.0),
            total_range: (0.0, 9.0),
            scoring: ScoringRule::Sum,
            timepoints: &[Timepoint::T1],
            higher_is_worse: true,
            interpretation: None,
            severity_bands: BANDS,
            notable_cutoff: None,
            item_prefix: None,
            short_form: None,
            shared_items: 0,
        }
    }

    #[test]
    fn item_variables_are_one_based() {
        assert_eq!(sample().item_variables(), vec!["demo_1", "demo_2", "demo_3"]);
    }

    #[test]
    fn severity_lookup_is_inclusive() {
        let instrument = sample();
        assert_eq!(instrument.severity_label(4.0), Some("None-minimal"));
        assert_eq!(instrument.severity_label(5.0), Some("Mild"));
        assert_eq!(instrument.severity_label(9.5), None);
    }

    #[test]
    fn range_labels_drop_trailing_zeroes() {
        assert_eq!(sample().total_range_label(), "0-9");
    }
}
