use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use chrono::{Days, Local};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use redcap_ingest::{EVENT_NAME, LongTable, RECORD_ID};
use redcap_model::Timepoint;
use redcap_registry::{Instrument, InstrumentRegistry, ScoringRule};

use crate::error::{Result, SampleError};

/// Symptom profiles with baseline PHQ-9 ranges and response probability.
/// Weights sum to 100.
const PROFILES: [Profile; 6] = [
    Profile { name: "severe_depression", weight: 20, phq9_baseline: (15, 23), response_prob: 0.65 },
    Profile { name: "moderate_depression", weight: 25, phq9_baseline: (10, 18), response_prob: 0.75 },
    Profile { name: "high_anxiety", weight: 20, phq9_baseline: (8, 15), response_prob: 0.70 },
    Profile { name: "comorbid", weight: 15, phq9_baseline: (14, 22), response_prob: 0.55 },
    Profile { name: "mild_symptoms", weight: 15, phq9_baseline: (5, 11), response_prob: 0.80 },
    Profile { name: "subclinical", weight: 5, phq9_baseline: (0, 6), response_prob: 0.85 },
];

#[derive(Debug, Clone, Copy)]
struct Profile {
    name: &'static str,
    weight: u32,
    phq9_baseline: (i64, i64),
    response_prob: f64,
}

const FIRST_NAMES: [&str; 16] = [
    "Albert", "Maria", "Stanislav", "Amanda", "Roland", "Robin", "Rosalind", "Franz", "Mary",
    "William", "Natalie", "Frederick", "Ingmar", "Talia", "Mendel", "Leor",
];

const LAST_NAMES: [&str; 16] = [
    "Hofmann", "Sabina", "Grof", "Feilding", "Griffiths", "Carhart-Harris", "Watts",
    "Vollenweider", "Cosimano", "Richards", "Gukasyan", "Barrett", "Gorman", "Puzantian",
    "Kaelen", "Roseman",
];

/// Probability that any given questionnaire was completed at a visit.
const COMPLETION_RATE: f64 = 0.85;
/// Probability of a single dropped item in an otherwise completed
/// questionnaire (exercises complete-case scoring downstream).
const PARTIAL_ITEM_RATE: f64 = 0.03;

#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub participants: usize,
    pub seed: u64,
    /// Fraction of participants whose dosing session was rescheduled.
    pub rescheduled_rate: f64,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            participants: 120,
            seed: 42,
            rescheduled_rate: 0.15,
        }
    }
}

/// Generate a synthetic long-format export: realistic profiles, responder
/// trajectories, rescheduled dosing patterns, and occasional missing items.
/// Deterministic for a fixed seed.
pub fn generate_sample(options: &SampleOptions) -> Result<LongTable> {
    if options.participants == 0 {
        return Err(SampleError::NoParticipants);
    }
    if !(0.0..=1.0).contains(&options.rescheduled_rate) {
        return Err(SampleError::InvalidRate(options.rescheduled_rate));
    }
    let registry = InstrumentRegistry::global();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let headers = build_headers(registry);
    let mut rows: Vec<BTreeMap<String, String>> = Vec::new();

    let mut rescheduled_count = 0usize;
    let mut profile_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for participant in 1..=options.participants {
        let profile = pick_profile(&mut rng);
        *profile_counts.entry(profile.name).or_insert(0) += 1;
        let is_responder = rng.gen_bool(profile.response_prob);
        let baseline_phq9 = rng.gen_range(profile.phq9_baseline.0..=profile.phq9_baseline.1);
        let rescheduled = rng.gen_bool(options.rescheduled_rate);
        if rescheduled {
            rescheduled_count += 1;
        }

        for timepoint in timepoint_pattern(&mut rng) {
            let mut row = BTreeMap::new();
            row.insert(RECORD_ID.to_string(), participant.to_string());
            row.insert(
                EVENT_NAME.to_string(),
                event_label(timepoint, rescheduled),
            );
            if timepoint == Timepoint::T1 {
                fill_baseline(&mut row, &mut rng, participant);
            }
            if timepoint == Timepoint::T2 {
                row.insert("treatment_date".to_string(), past_date(&mut rng, 60, 150));
                row.insert("treatment_status".to_string(), "1".to_string());
            }
            for instrument in registry.iter() {
                fill_instrument(
                    &mut row,
                    &mut rng,
                    instrument,
                    timepoint,
                    baseline_phq9,
                    is_responder,
                );
            }
            rows.push(row);
        }
    }

    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|row| {
            headers
                .iter()
                .map(|header| row.get(header).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    info!(
        participants = options.participants,
        rescheduled = rescheduled_count,
        rows = rows.len(),
        profiles = ?profile_counts,
        "sample generated"
    );
    Ok(LongTable { headers, rows })
}

/// Write a generated table as a CSV export.
pub fn write_sample_csv(path: &Path, table: &LongTable) -> Result<()> {
    let file = File::create(path).map_err(SampleError::Io)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(SampleError::Io)?;
    Ok(())
}

fn build_headers(registry: &InstrumentRegistry) -> Vec<String> {
    let mut headers = vec![RECORD_ID.to_string(), EVENT_NAME.to_string()];
    headers.extend(
        [
            "consent_nameprint",
            "consent_age",
            "consent_psilocybintherapy",
            "email",
            "consent_date",
            "age",
            "gender",
            "sex",
            "education",
            "relat",
            "latino",
            "income_est",
            "military_service",
        ]
        .map(String::from),
    );
    for option in 1..=6 {
        headers.push(format!("race1___{option}"));
    }
    for option in 1..=9 {
        headers.push(format!("employ___{option}"));
    }
    for option in 1..=8 {
        headers.push(format!("psychiatric_medications___{option}"));
    }
    for option in 1..=9 {
        headers.push(format!("psychedelics_used___{option}"));
    }
    headers.push("treatment_date".to_string());
    headers.push("treatment_status".to_string());
    for instrument in registry.iter() {
        headers.extend(instrument.item_variables());
        // Long forms have no precomputed column of their own in exports.
        if instrument.short_form.is_none() {
            headers.push(instrument.source_score_variable());
        }
    }
    headers
}

fn pick_profile(rng: &mut StdRng) -> Profile {
    let total: u32 = PROFILES.iter().map(|profile| profile.weight).sum();
    let mut roll = rng.gen_range(0..total);
    for profile in PROFILES {
        if roll < profile.weight {
            return profile;
        }
        roll -= profile.weight;
    }
    PROFILES[PROFILES.len() - 1]
}

/// Baseline and dosing always attended; one to five of the four follow-ups,
/// weighted towards fuller attendance.
fn timepoint_pattern(rng: &mut StdRng) -> Vec<Timepoint> {
    let mut pattern = vec![Timepoint::T1, Timepoint::T2];
    let mut followups = Timepoint::FOLLOW_UPS.to_vec();
    followups.shuffle(rng);
    let count = weighted_pick(rng, &[(1, 5), (2, 15), (3, 30), (4, 50)]);
    let mut selected: Vec<Timepoint> = followups.into_iter().take(count).collect();
    selected.sort();
    pattern.extend(selected);
    pattern
}

fn weighted_pick(rng: &mut StdRng, choices: &[(usize, u32)]) -> usize {
    let total: u32 = choices.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total);
    for (value, weight) in choices {
        if roll < *weight {
            return *value;
        }
        roll -= weight;
    }
    choices[choices.len() - 1].0
}

/// Rescheduled participants carry the `_r` spelling for every non-baseline
/// visit; baseline has no such spelling.
fn event_label(timepoint: Timepoint, rescheduled: bool) -> String {
    if rescheduled && timepoint != Timepoint::T1 {
        format!("timepoint_{}_r_arm_1", timepoint.index())
    } else {
        format!("timepoint_{}_arm_1", timepoint.index())
    }
}

fn fill_baseline(row: &mut BTreeMap<String, String>, rng: &mut StdRng, participant: usize) {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
    row.insert(
        "consent_nameprint".to_string(),
        format!("{first} {last} {participant}"),
    );
    row.insert("consent_age".to_string(), "1".to_string());
    row.insert("consent_psilocybintherapy".to_string(), "1".to_string());
    row.insert(
        "email".to_string(),
        format!(
            "{}.{}{participant}@example.com",
            first.to_lowercase(),
            last.to_lowercase().replace(' ', ".")
        ),
    );
    row.insert("consent_date".to_string(), past_date(rng, 30, 180));
    row.insert("age".to_string(), rng.gen_range(21..=68).to_string());
    row.insert(
        "gender".to_string(),
        [1, 1, 1, 2, 2, 2, 2, 3, 4][rng.gen_range(0..9)].to_string(),
    );
    row.insert("sex".to_string(), rng.gen_range(1..=2).to_string());
    row.insert(
        "education".to_string(),
        weighted_pick(rng, &[(2, 10), (3, 25), (4, 40), (5, 25)]).to_string(),
    );
    row.insert("relat".to_string(), rng.gen_range(0..=4).to_string());
    row.insert(
        "latino".to_string(),
        if rng.gen_bool(0.25) { "1" } else { "0" }.to_string(),
    );
    row.insert("income_est".to_string(), rng.gen_range(2..=6).to_string());
    row.insert(
        "military_service".to_string(),
        if rng.gen_bool(0.25) { "1" } else { "0" }.to_string(),
    );

    let race = weighted_pick(rng, &[(5, 60), (3, 15), (2, 10), (1, 5), (4, 5), (6, 5)]);
    for option in 1..=6 {
        row.insert(
            format!("race1___{option}"),
            if option == race { "1" } else { "0" }.to_string(),
        );
    }
    fill_multiselect(row, rng, "employ", 9, 1, 2);
    fill_multiselect(row, rng, "psychiatric_medications", 8, 0, 2);
    fill_multiselect(row, rng, "psychedelics_used", 9, 0, 3);
}

fn fill_multiselect(
    row: &mut BTreeMap<String, String>,
    rng: &mut StdRng,
    prefix: &str,
    options: u32,
    min_selected: u32,
    max_selected: u32,
) {
    let count = rng.gen_range(min_selected..=max_selected);
    let mut pool: Vec<u32> = (1..=options).collect();
    pool.shuffle(rng);
    let selected: Vec<u32> = pool.into_iter().take(count as usize).collect();
    for option in 1..=options {
        row.insert(
            format!("{prefix}___{option}"),
            if selected.contains(&option) { "1" } else { "0" }.to_string(),
        );
    }
}

fn fill_instrument(
    row: &mut BTreeMap<String, String>,
    rng: &mut StdRng,
    instrument: &Instrument,
    timepoint: Timepoint,
    baseline_phq9: i64,
    is_responder: bool,
) {
    if !instrument.administered_at(timepoint) {
        return;
    }
    if !rng.gen_bool(COMPLETION_RATE) {
        return;
    }
    let raw_total = target_raw_total(rng, instrument, timepoint, baseline_phq9, is_responder);
    let mut items = items_from_total(rng, instrument, raw_total);

    let dropped = rng.gen_bool(PARTIAL_ITEM_RATE).then(|| rng.gen_range(0..items.len()));
    if let Some(index) = dropped {
        items[index] = None;
    }
    for (variable, item) in instrument.item_variables().iter().zip(&items) {
        if let Some(value) = item {
            row.insert(variable.clone(), value.to_string());
        }
    }
    // Exports carry the site-computed score alongside the items; omit it
    // when an item is missing, as the EDC would.
    if instrument.short_form.is_none() && dropped.is_none() {
        let sum: i64 = items.iter().flatten().sum();
        let value = match instrument.scoring {
            ScoringRule::Mean => {
                let mean = sum as f64 / items.len() as f64;
                format!("{:.2}", mean)
            }
            ScoringRule::SumTimes4 => (sum * 4).to_string(),
            _ => sum.to_string(),
        };
        row.insert(instrument.source_score_variable(), value);
    }
}

/// Target a raw item-sum consistent with the profile's severity, the
/// responder trajectory, and the instrument's polarity, with 10% noise.
fn target_raw_total(
    rng: &mut StdRng,
    instrument: &Instrument,
    timepoint: Timepoint,
    baseline_phq9: i64,
    is_responder: bool,
) -> i64 {
    let shared = instrument.shared_items as i64;
    let items = i64::from(instrument.items) - shared;
    let (item_min, item_max) = instrument.item_range;
    let raw_min = items * item_min as i64;
    let raw_max = items * item_max as i64;

    let mut severity = baseline_phq9 as f64 / 27.0;
    if timepoint != Timepoint::T1 {
        if is_responder {
            let reduction = match timepoint {
                Timepoint::T2 => rng.gen_range(0.10..0.20),
                Timepoint::T3 => rng.gen_range(0.35..0.50),
                Timepoint::T4 => rng.gen_range(0.45..0.60),
                _ => rng.gen_range(0.40..0.55),
            };
            severity *= 1.0 - reduction;
        } else {
            severity *= rng.gen_range(0.85..1.10);
        }
    }

    let span = (raw_max - raw_min) as f64;
    let mut target = if instrument.higher_is_worse {
        raw_min as f64 + span * severity
    } else {
        raw_max as f64 - span * severity
    };
    target += rng.gen_range(-0.1..0.1) * span;
    (target.round() as i64).clamp(raw_min, raw_max)
}

/// Distribute a raw sum across items within the item range.
fn items_from_total(rng: &mut StdRng, instrument: &Instrument, total: i64) -> Vec<Option<i64>> {
    let count = instrument.item_variables().len();
    let item_min = instrument.item_range.0 as i64;
    let item_max = instrument.item_range.1 as i64;
    let span = item_max - item_min;

    let mut remaining = (total - count as i64 * item_min).max(0);
    let mut items = Vec::with_capacity(count);
    for index in 0..count.saturating_sub(1) {
        let slots_after = (count - index - 1) as i64;
        // Each slot takes enough that the rest stays representable.
        let low = (remaining - span * slots_after).max(0);
        let high = span.min(remaining);
        let value = if high > low { rng.gen_range(low..=high) } else { low };
        items.push(Some(item_min + value));
        remaining -= value;
    }
    items.push(Some(item_min + remaining.clamp(0, span)));
    items.shuffle(rng);
    items
}

fn past_date(rng: &mut StdRng, min_days: u64, max_days: u64) -> String {
    let days = rng.gen_range(min_days..=max_days);
    let today = Local::now().date_naive();
    let date = today.checked_sub_days(Days::new(days)).unwrap_or(today);
    date.format("%m/%d/%y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let options = SampleOptions {
            participants: 5,
            ..SampleOptions::default()
        };
        let first = generate_sample(&options).unwrap();
        let second = generate_sample(&options).unwrap();
        assert_eq!(first.headers, second.headers);
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn every_event_label_resolves() {
        let options = SampleOptions {
            participants: 20,
            ..SampleOptions::default()
        };
        let table = generate_sample(&options).unwrap();
        let event_index = table.column_index(EVENT_NAME).unwrap();
        for row in 0..table.row_count() {
            let label = table.value(row, event_index);
            assert!(
                redcap_model::parse_event(label).is_ok(),
                "unresolvable label {label}"
            );
        }
    }

    #[test]
    fn zero_participants_is_rejected() {
        let options = SampleOptions {
            participants: 0,
            ..SampleOptions::default()
        };
        assert!(generate_sample(&options).is_err());
    }
}
