use std::collections::BTreeMap;
use std::sync::OnceLock;

use redcap_model::Timepoint;

use crate::catalog::CATALOG;
use crate::instrument::{Instrument, ScoringRule};

/// Keyed view over the instrument catalog.
///
/// Built once per process; every stage consults the same instance.
#[derive(Debug)]
pub struct InstrumentRegistry {
    by_key: BTreeMap<&'static str, &'static Instrument>,
}

impl InstrumentRegistry {
    /// The process-wide registry over the compiled-in catalog.
    pub fn global() -> &'static InstrumentRegistry {
        static REGISTRY: OnceLock<InstrumentRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| InstrumentRegistry {
            by_key: CATALOG
                .iter()
                .map(|instrument| (instrument.key, instrument))
                .collect(),
        })
    }

    pub fn get(&self, key: &str) -> Option<&'static Instrument> {
        self.by_key.get(key).copied()
    }

    /// Catalog order (the order instrument blocks appear in the output).
    pub fn iter(&self) -> impl Iterator<Item = &'static Instrument> {
        CATALOG.iter()
    }

    pub fn len(&self) -> usize {
        CATALOG.len()
    }

    pub fn is_empty(&self) -> bool {
        CATALOG.is_empty()
    }

    /// Instruments administered at the given timepoint, catalog order.
    pub fn administered_at(&self, timepoint: Timepoint) -> Vec<&'static Instrument> {
        self.iter()
            .filter(|instrument| instrument.administered_at(timepoint))
            .collect()
    }

    /// Source column names the pivot treats as time-varying: every
    /// instrument's owned item columns followed by its precomputed score
    /// column, in catalog order.
    pub fn time_varying_variables(&self) -> Vec<String> {
        let mut variables = Vec::new();
        for instrument in self.iter() {
            variables.extend(instrument.item_variables());
            variables.push(instrument.source_score_variable());
        }
        variables
    }

    /// Check catalog invariants. Returns one message per violation; empty
    /// means the catalog is internally consistent.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.by_key.len() != CATALOG.len() {
            problems.push("duplicate instrument keys in catalog".to_string());
        }
        for instrument in self.iter() {
            let key = instrument.key;
            let (item_min, item_max) = instrument.item_range;
            let n = f64::from(instrument.items);
            let expected = match instrument.scoring {
                ScoringRule::Sum => (n * item_min, n * item_max),
                ScoringRule::SumTimes4 => (n * item_min * 4.0, n * item_max * 4.0),
                ScoringRule::Mean | ScoringRule::SingleValue => (item_min, item_max),
            };
            if instrument.total_range != expected {
                problems.push(format!(
                    "{key}: total range {:?} not reachable from {} items in {:?} under {}",
                    instrument.total_range, instrument.items, instrument.item_range,
                    instrument.scoring
                ));
            }
            if instrument.scoring == ScoringRule::SingleValue && instrument.items != 1 {
                problems.push(format!("{key}: single-value scoring with {} items", instrument.items));
            }
            if instrument.timepoints.is_empty() {
                problems.push(format!("{key}: empty administration schedule"));
            }
            if !instrument.timepoints.is_sorted() {
                problems.push(format!("{key}: administration schedule out of order"));
            }
            if let Some(short_key) = instrument.short_form {
                match self.get(short_key) {
                    Some(short) if short.items == instrument.shared_items => {}
                    Some(short) => problems.push(format!(
                        "{key}: shares {} items but short form {short_key} has {}",
                        instrument.shared_items, short.items
                    )),
                    None => problems.push(format!("{key}: unknown short form {short_key}")),
                }
            }
            problems.extend(validate_bands(instrument));
        }
        problems
    }
}

fn validate_bands(instrument: &Instrument) -> Vec<String> {
    let bands = instrument.severity_bands;
    if bands.is_empty() {
        return Vec::new();
    }
    let key = instrument.key;
    let mut problems = Vec::new();
    if bands[0].min != instrument.total_range.0 {
        problems.push(format!("{key}: first band starts above the total range"));
    }
    if bands[bands.len() - 1].max != instrument.total_range.1 {
        problems.push(format!("{key}: last band ends below the total range"));
    }
    for window in bands.windows(2) {
        if window[1].min <= window[0].max {
            problems.push(format!(
                "{key}: bands '{}' and '{}' overlap",
                window[0].label, window[1].label
            ));
        }
        if window[1].min > window[0].max + 1.0 {
            problems.push(format!(
                "{key}: gap between bands '{}' and '{}'",
                window[0].label, window[1].label
            ));
        }
    }
    for band in bands {
        if band.min > band.max {
            problems.push(format!("{key}: band '{}' is inverted", band.label));
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_internally_consistent() {
        let problems = InstrumentRegistry::global().validate();
        assert!(problems.is_empty(), "catalog problems: {problems:?}");
    }

    #[test]
    fn lookup_by_key() {
        let registry = InstrumentRegistry::global();
        let phq9 = registry.get("phq9").unwrap();
        assert_eq!(phq9.items, 9);
        assert_eq!(phq9.total_range, (0.0, 27.0));
        assert!(registry.get("unknown_scale").is_none());
    }

    #[test]
    fn dosing_schedule_contains_acute_measures() {
        let registry = InstrumentRegistry::global();
        let at_dosing = registry.administered_at(Timepoint::T2);
        let keys: Vec<&str> = at_dosing.iter().map(|instrument| instrument.key).collect();
        assert!(keys.contains(&"meq4"));
        assert!(keys.contains(&"ebi"));
        assert!(!keys.contains(&"phq9"));
    }

    #[test]
    fn audit_tail_items_use_the_long_prefix() {
        let registry = InstrumentRegistry::global();
        let audit = registry.get("audit_full").unwrap();
        let items = audit.item_variables();
        assert_eq!(items.first().map(String::as_str), Some("audit_4"));
        assert_eq!(items.last().map(String::as_str), Some("audit_10"));
        assert_eq!(items.len(), 7);
    }
}
