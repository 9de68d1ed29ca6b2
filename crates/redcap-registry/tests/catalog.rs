use redcap_model::Timepoint;
use redcap_registry::{InstrumentRegistry, ScoringRule};

#[test]
fn catalog_validates_clean() {
    let problems = InstrumentRegistry::global().validate();
    assert!(problems.is_empty(), "{problems:?}");
}

#[test]
fn catalog_covers_the_protocol() {
    let registry = InstrumentRegistry::global();
    assert_eq!(registry.len(), 53);
    // Spot-check entries across every scoring rule.
    assert_eq!(registry.get("phq9").unwrap().scoring, ScoringRule::Sum);
    assert_eq!(registry.get("meq4").unwrap().scoring, ScoringRule::Mean);
    assert_eq!(registry.get("who5").unwrap().scoring, ScoringRule::SumTimes4);
    assert_eq!(
        registry.get("expectancy").unwrap().scoring,
        ScoringRule::SingleValue
    );
}

#[test]
fn severity_bands_classify_scenario_totals() {
    let phq9 = InstrumentRegistry::global().get("phq9").unwrap();
    // Nine items all answered 1 sum to 9, in the 5-9 band.
    assert_eq!(phq9.severity_label(9.0), Some("Mild"));
    assert_eq!(phq9.severity_label(0.0), Some("None-minimal"));
    assert_eq!(phq9.severity_label(27.0), Some("Severe"));
    assert_eq!(phq9.severity_label(-1.0), None);

    let gad7 = InstrumentRegistry::global().get("gad7").unwrap();
    assert_eq!(gad7.severity_label(15.0), Some("Severe"));
}

#[test]
fn mystical_experience_cutoff_sits_on_the_mean_scale() {
    let meq4 = InstrumentRegistry::global().get("meq4").unwrap();
    assert_eq!(meq4.notable_cutoff, Some(3.5));
    assert_eq!(meq4.total_range, (0.0, 5.0));
    assert_eq!(meq4.timepoints, &[Timepoint::T2]);
}

#[test]
fn time_varying_variables_cover_items_and_source_scores() {
    let variables = InstrumentRegistry::global().time_varying_variables();
    assert!(variables.contains(&"phq9_1".to_string()));
    assert!(variables.contains(&"phq9_9".to_string()));
    assert!(variables.contains(&"phq9_total".to_string()));
    assert!(variables.contains(&"meq4_mean".to_string()));
    // AUDIT long form owns only its tail items.
    assert!(variables.contains(&"auditc_1".to_string()));
    assert!(variables.contains(&"audit_4".to_string()));
    assert!(!variables.contains(&"audit_1".to_string()));
    assert!(!variables.contains(&"audit_full_1".to_string()));
}

#[test]
fn schedules_follow_the_protocol() {
    let registry = InstrumentRegistry::global();
    assert!(!registry.get("phq9").unwrap().administered_at(Timepoint::T2));
    assert!(registry.get("rrs").unwrap().administered_at(Timepoint::T2));
    assert!(registry.get("csq8").unwrap().timepoints == &[Timepoint::T3]);
    assert!(registry.get("swiss_se").unwrap().administered_at(Timepoint::T6));
    assert!(!registry.get("swiss_se").unwrap().administered_at(Timepoint::T1));
}
