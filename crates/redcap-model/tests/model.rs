use std::str::FromStr;

use redcap_model::{
    ConsentStatus, ParticipantIdentity, RawEvent, Timepoint, parse_event, timepoint_column,
};

#[test]
fn every_protocol_label_resolves() {
    let expected: [(&str, Timepoint, bool); 11] = [
        ("timepoint_1_arm_1", Timepoint::T1, false),
        ("timepoint_2_arm_1", Timepoint::T2, false),
        ("timepoint_2_r_arm_1", Timepoint::T2, true),
        ("timepoint_3_arm_1", Timepoint::T3, false),
        ("timepoint_3_r_arm_1", Timepoint::T3, true),
        ("timepoint_4_arm_1", Timepoint::T4, false),
        ("timepoint_4_r_arm_1", Timepoint::T4, true),
        ("timepoint_5_arm_1", Timepoint::T5, false),
        ("timepoint_5_r_arm_1", Timepoint::T5, true),
        ("timepoint_6_arm_1", Timepoint::T6, false),
        ("timepoint_6_r_arm_1", Timepoint::T6, true),
    ];
    for (label, timepoint, rescheduled) in expected {
        let event = parse_event(label).unwrap();
        assert_eq!(
            event,
            RawEvent {
                timepoint,
                rescheduled
            },
            "label {label}"
        );
    }
}

#[test]
fn keys_round_trip_through_from_str() {
    for timepoint in Timepoint::ALL {
        assert_eq!(Timepoint::from_str(timepoint.key()).unwrap(), timepoint);
        assert_eq!(Timepoint::from_index(timepoint.index()), Some(timepoint));
    }
    assert!(Timepoint::from_str("t7").is_err());
    assert_eq!(Timepoint::from_index(0), None);
}

#[test]
fn labels_are_unique_and_human_readable() {
    let labels: Vec<&str> = Timepoint::ALL.iter().map(|tp| tp.label()).collect();
    assert_eq!(labels, vec!["bl", "3d", "1mo", "3mo", "6mo", "12mo"]);
    let mut deduped = labels.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), labels.len());
}

#[test]
fn follow_ups_exclude_baseline_and_dosing() {
    assert!(!Timepoint::FOLLOW_UPS.contains(&Timepoint::T1));
    assert!(!Timepoint::FOLLOW_UPS.contains(&Timepoint::T2));
    assert_eq!(Timepoint::FOLLOW_UPS.len(), 4);
}

#[test]
fn identity_serializes_round_trip() {
    let mut identity = ParticipantIdentity::without_baseline("42");
    identity.timepoints.insert(Timepoint::T3);
    let json = serde_json::to_string(&identity).unwrap();
    let round: ParticipantIdentity = serde_json::from_str(&json).unwrap();
    assert_eq!(round.record_id, "42");
    assert_eq!(round.consent_status, ConsentStatus::NoBaseline);
    assert!(round.timepoints.contains(&Timepoint::T3));
}

#[test]
fn column_helper_qualifies_by_label() {
    assert_eq!(timepoint_column("who5_total", Timepoint::T4), "who5_total_3mo");
}
