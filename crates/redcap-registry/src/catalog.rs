//! The protocol's instrument catalog.
//!
//! One immutable table, consulted by every downstream stage. Entries are
//! grouped the way the protocol groups them; the order here is the order
//! instrument blocks appear in the wide output.

use redcap_model::Timepoint;

use crate::instrument::{Instrument, ScoringRule, SeverityBand};

/// Administered at baseline and all post-dosing follow-ups.
const SCHEDULE_STANDARD: &[Timepoint] = &[
    Timepoint::T1,
    Timepoint::T3,
    Timepoint::T4,
    Timepoint::T5,
    Timepoint::T6,
];

/// Dosing-session measures only.
const SCHEDULE_DOSING: &[Timepoint] = &[Timepoint::T2];

/// Administered at every occasion.
const SCHEDULE_ALL: &[Timepoint] = &[
    Timepoint::T1,
    Timepoint::T2,
    Timepoint::T3,
    Timepoint::T4,
    Timepoint::T5,
    Timepoint::T6,
];

/// Satisfaction measure, 1-month visit only.
const SCHEDULE_ONE_MONTH: &[Timepoint] = &[Timepoint::T3];

/// Baseline only.
const SCHEDULE_BASELINE: &[Timepoint] = &[Timepoint::T1];

/// Side effects, dosing session onward.
const SCHEDULE_POST_DOSING: &[Timepoint] = &[
    Timepoint::T2,
    Timepoint::T3,
    Timepoint::T4,
    Timepoint::T5,
    Timepoint::T6,
];

const PHQ9_BANDS: &[SeverityBand] = &[
    SeverityBand { min: 0.0, max: 4.0, label: "None-minimal" },
    SeverityBand { min: 5.0, max: 9.0, label: "Mild" },
    SeverityBand { min: 10.0, max: 14.0, label: "Moderate" },
    SeverityBand { min: 15.0, max: 19.0, label: "Moderately severe" },
    SeverityBand { min: 20.0, max: 27.0, label: "Severe" },
];

const GAD7_BANDS: &[SeverityBand] = &[
    SeverityBand { min: 0.0, max: 4.0, label: "Minimal" },
    SeverityBand { min: 5.0, max: 9.0, label: "Mild" },
    SeverityBand { min: 10.0, max: 14.0, label: "Moderate" },
    SeverityBand { min: 15.0, max: 21.0, label: "Severe" },
];

/// Template entry: standard-schedule sum-scored symptom scale. Every
/// catalog entry overrides the fields that differ.
const BASE: Instrument = Instrument {
    key: "",
    name: "",
    items: 0,
    item_range: (0.0, 0.0),
    total_range: (0.0, 0.0),
    scoring: ScoringRule::Sum,
    timepoints: SCHEDULE_STANDARD,
    higher_is_worse: true,
    interpretation: None,
    severity_bands: &[],
    notable_cutoff: None,
    item_prefix: None,
    short_form: None,
    shared_items: 0,
};

const fn nida(key: &'static str, name: &'static str) -> Instrument {
    Instrument {
        key,
        name,
        items: 5,
        item_range: (0.0, 4.0),
        total_range: (0.0, 20.0),
        ..BASE
    }
}

pub const CATALOG: &[Instrument] = &[
    // Primary outcome measures
    Instrument {
        key: "phq9",
        name: "PHQ-9 (Depression)",
        items: 9,
        item_range: (0.0, 3.0),
        total_range: (0.0, 27.0),
        interpretation: Some(
            "0-4: None-minimal, 5-9: Mild, 10-14: Moderate, 15-19: Moderately severe, 20-27: Severe",
        ),
        severity_bands: PHQ9_BANDS,
        ..BASE
    },
    Instrument {
        key: "gad7",
        name: "GAD-7 (Anxiety)",
        items: 7,
        item_range: (0.0, 3.0),
        total_range: (0.0, 21.0),
        interpretation: Some("0-4: Minimal, 5-9: Mild, 10-14: Moderate, 15-21: Severe"),
        severity_bands: GAD7_BANDS,
        ..BASE
    },
    Instrument {
        key: "who5",
        name: "WHO-5 (Wellbeing)",
        items: 5,
        item_range: (0.0, 5.0),
        total_range: (0.0, 100.0),
        scoring: ScoringRule::SumTimes4,
        higher_is_worse: false,
        interpretation: Some("<28: Poor wellbeing, Higher = better"),
        ..BASE
    },
    Instrument {
        key: "psyflex",
        name: "PsyFlex (Psychological Flexibility)",
        items: 6,
        item_range: (1.0, 5.0),
        total_range: (6.0, 30.0),
        higher_is_worse: false,
        ..BASE
    },
    Instrument {
        key: "auditc",
        name: "AUDIT-C (Alcohol Use - Short)",
        items: 3,
        item_range: (0.0, 4.0),
        total_range: (0.0, 12.0),
        ..BASE
    },
    Instrument {
        key: "audit_full",
        name: "AUDIT (Alcohol Use - Full)",
        items: 10,
        item_range: (0.0, 4.0),
        total_range: (0.0, 40.0),
        // Items 1-3 are auditc_1..3; the owned tail is audit_4..10.
        item_prefix: Some("audit"),
        short_form: Some("auditc"),
        shared_items: 3,
        ..BASE
    },
    // Dosing session measures
    Instrument {
        key: "meq4",
        name: "MEQ-4 (Mystical Experience)",
        items: 4,
        item_range: (0.0, 5.0),
        total_range: (0.0, 5.0),
        scoring: ScoringRule::Mean,
        timepoints: SCHEDULE_DOSING,
        higher_is_worse: false,
        interpretation: Some(">=3.5: Complete mystical experience"),
        notable_cutoff: Some(3.5),
        ..BASE
    },
    Instrument {
        key: "ebi",
        name: "EBI (Emotional Breakthrough)",
        items: 6,
        item_range: (0.0, 5.0),
        total_range: (0.0, 30.0),
        timepoints: SCHEDULE_DOSING,
        higher_is_worse: false,
        ..BASE
    },
    Instrument {
        key: "ceq",
        name: "CEQ-7 (Challenging Experience)",
        items: 7,
        item_range: (0.0, 5.0),
        total_range: (0.0, 35.0),
        timepoints: SCHEDULE_DOSING,
        ..BASE
    },
    Instrument {
        key: "piq",
        name: "PIQ (Psychological Insight)",
        items: 23,
        item_range: (1.0, 5.0),
        total_range: (23.0, 115.0),
        timepoints: SCHEDULE_DOSING,
        higher_is_worse: false,
        ..BASE
    },
    Instrument {
        key: "sscs",
        name: "SSCS-S (State Self-Compassion)",
        items: 6,
        item_range: (1.0, 5.0),
        total_range: (6.0, 30.0),
        timepoints: SCHEDULE_DOSING,
        higher_is_worse: false,
        ..BASE
    },
    Instrument {
        key: "mpod_s",
        name: "MPoD-S (State Decentering)",
        items: 3,
        item_range: (1.0, 5.0),
        total_range: (3.0, 15.0),
        timepoints: SCHEDULE_DOSING,
        higher_is_worse: false,
        ..BASE
    },
    // Depression / mood
    Instrument {
        key: "epds",
        name: "EPDS (Edinburgh Postnatal Depression)",
        items: 10,
        item_range: (0.0, 3.0),
        total_range: (0.0, 30.0),
        ..BASE
    },
    // The published YMRS scores four items 0-8; this export flattens all
    // eleven to 0-4, so the reachable total tops out at 44.
    Instrument {
        key: "ymrs",
        name: "YMRS (Young Mania Rating)",
        items: 11,
        item_range: (0.0, 4.0),
        total_range: (0.0, 44.0),
        ..BASE
    },
    // Anxiety
    Instrument {
        key: "pdss",
        name: "PDSS (Panic Disorder Severity)",
        items: 7,
        item_range: (0.0, 4.0),
        total_range: (0.0, 28.0),
        ..BASE
    },
    Instrument {
        key: "spin",
        name: "SPIN (Social Phobia Inventory)",
        items: 17,
        item_range: (0.0, 4.0),
        total_range: (0.0, 68.0),
        ..BASE
    },
    Instrument {
        key: "specific_phobia",
        name: "APA Specific Phobia Severity",
        items: 10,
        item_range: (0.0, 4.0),
        total_range: (0.0, 40.0),
        ..BASE
    },
    // Trauma
    Instrument {
        key: "pcl",
        name: "PCL-S (PTSD Checklist)",
        items: 20,
        item_range: (1.0, 5.0),
        total_range: (20.0, 100.0),
        ..BASE
    },
    Instrument {
        key: "ies_r",
        name: "IES-R (Impact of Events)",
        items: 22,
        item_range: (0.0, 4.0),
        total_range: (0.0, 88.0),
        ..BASE
    },
    Instrument {
        key: "pg13",
        name: "PG-13-R (Prolonged Grief)",
        items: 13,
        item_range: (1.0, 5.0),
        total_range: (13.0, 65.0),
        ..BASE
    },
    // Personality / functioning
    Instrument {
        key: "lpfs",
        name: "LPFS-BF (Personality Functioning)",
        items: 12,
        item_range: (1.0, 4.0),
        total_range: (12.0, 48.0),
        ..BASE
    },
    Instrument {
        key: "bsl23",
        name: "BSL-23 (Borderline Symptoms)",
        items: 23,
        item_range: (0.0, 4.0),
        total_range: (0.0, 92.0),
        ..BASE
    },
    // Behavioral addictions
    Instrument {
        key: "iat",
        name: "IAT (Internet Addiction)",
        items: 20,
        item_range: (1.0, 5.0),
        total_range: (20.0, 100.0),
        ..BASE
    },
    Instrument {
        key: "sogs",
        name: "SOGS (South Oaks Gambling)",
        items: 20,
        item_range: (0.0, 1.0),
        total_range: (0.0, 20.0),
        ..BASE
    },
    Instrument {
        key: "hrs",
        name: "HRS (Hoarding Rating)",
        items: 5,
        item_range: (0.0, 8.0),
        total_range: (0.0, 40.0),
        ..BASE
    },
    // OCD
    Instrument {
        key: "ybocs",
        name: "Y-BOCS (OCD Severity)",
        items: 10,
        item_range: (0.0, 4.0),
        total_range: (0.0, 40.0),
        ..BASE
    },
    // Neurodevelopmental
    Instrument {
        key: "asq",
        name: "ASQ (Autism Spectrum Quotient)",
        items: 28,
        item_range: (0.0, 1.0),
        total_range: (0.0, 28.0),
        ..BASE
    },
    Instrument {
        key: "asrs",
        name: "ASRS (ADHD Self-Report)",
        items: 18,
        item_range: (0.0, 4.0),
        total_range: (0.0, 72.0),
        ..BASE
    },
    Instrument {
        key: "atq",
        name: "ATQ (Adult Tic Questionnaire)",
        items: 20,
        item_range: (0.0, 4.0),
        total_range: (0.0, 80.0),
        ..BASE
    },
    Instrument {
        key: "cpib",
        name: "CPIB-SF (Communicative Participation)",
        items: 10,
        item_range: (0.0, 3.0),
        total_range: (0.0, 30.0),
        higher_is_worse: false,
        ..BASE
    },
    // Psychotic
    Instrument {
        key: "panss",
        name: "PANSS (Positive/Negative Syndrome)",
        items: 30,
        item_range: (1.0, 7.0),
        total_range: (30.0, 210.0),
        ..BASE
    },
    // Dissociative / eating
    Instrument {
        key: "dss",
        name: "DSS-B (Dissociative Symptoms)",
        items: 8,
        item_range: (0.0, 4.0),
        total_range: (0.0, 32.0),
        ..BASE
    },
    Instrument {
        key: "edeqs",
        name: "EDE-QS (Eating Disorder)",
        items: 12,
        item_range: (0.0, 3.0),
        total_range: (0.0, 36.0),
        ..BASE
    },
    // Sleep / cognitive
    Instrument {
        key: "psqi",
        name: "PSQI (Sleep Quality)",
        items: 7,
        item_range: (0.0, 3.0),
        total_range: (0.0, 21.0),
        ..BASE
    },
    Instrument {
        key: "cfq",
        name: "CFQ (Cognitive Failures)",
        items: 25,
        item_range: (0.0, 4.0),
        total_range: (0.0, 100.0),
        ..BASE
    },
    // Pain
    Instrument {
        key: "peg",
        name: "PEG (Pain Scale)",
        items: 3,
        item_range: (0.0, 10.0),
        total_range: (0.0, 30.0),
        ..BASE
    },
    // Administered at every timepoint
    Instrument {
        key: "rrs",
        name: "RRS (Rumination)",
        items: 22,
        item_range: (1.0, 4.0),
        total_range: (22.0, 88.0),
        timepoints: SCHEDULE_ALL,
        ..BASE
    },
    Instrument {
        key: "bcss",
        name: "BCSS (Brief Core Schema)",
        items: 24,
        item_range: (0.0, 4.0),
        total_range: (0.0, 96.0),
        timepoints: SCHEDULE_ALL,
        ..BASE
    },
    Instrument {
        key: "bis",
        name: "BIS (Impulsiveness)",
        items: 8,
        item_range: (1.0, 4.0),
        total_range: (8.0, 32.0),
        timepoints: SCHEDULE_ALL,
        ..BASE
    },
    Instrument {
        key: "bfi10",
        name: "BFI-10 (Big Five Personality)",
        items: 10,
        item_range: (1.0, 5.0),
        total_range: (10.0, 50.0),
        timepoints: SCHEDULE_ALL,
        higher_is_worse: false,
        ..BASE
    },
    Instrument {
        key: "mpod_t",
        name: "MPoD-T (Trait Decentering)",
        items: 15,
        item_range: (1.0, 5.0),
        total_range: (15.0, 75.0),
        timepoints: SCHEDULE_ALL,
        higher_is_worse: false,
        ..BASE
    },
    // Satisfaction
    Instrument {
        key: "csq8",
        name: "CSQ-8 (Client Satisfaction)",
        items: 8,
        item_range: (1.0, 4.0),
        total_range: (8.0, 32.0),
        timepoints: SCHEDULE_ONE_MONTH,
        higher_is_worse: false,
        ..BASE
    },
    // Baseline only
    Instrument {
        key: "expectancy",
        name: "Expectancy Measure",
        items: 1,
        item_range: (0.0, 10.0),
        total_range: (0.0, 10.0),
        scoring: ScoringRule::SingleValue,
        timepoints: SCHEDULE_BASELINE,
        higher_is_worse: false,
        ..BASE
    },
    // Side effects
    Instrument {
        key: "swiss_se",
        name: "Swiss Psychedelic Side Effects",
        items: 32,
        item_range: (0.0, 5.0),
        total_range: (0.0, 160.0),
        timepoints: SCHEDULE_POST_DOSING,
        ..BASE
    },
    // Substance use screeners
    nida("nida_cannabis", "NIDA-ASSIST Cannabis"),
    nida("nida_cocaine", "NIDA-ASSIST Cocaine"),
    nida("nida_stimulants", "NIDA-ASSIST Stimulants"),
    nida("nida_meth", "NIDA-ASSIST Methamphetamine"),
    nida("nida_inhalants", "NIDA-ASSIST Inhalants"),
    nida("nida_sedatives", "NIDA-ASSIST Sedatives"),
    nida("nida_hallucinogens", "NIDA-ASSIST Hallucinogens"),
    nida("nida_street_opioids", "NIDA-ASSIST Street Opioids"),
    nida("nida_rx_opioids", "NIDA-ASSIST Prescription Opioids"),
];
