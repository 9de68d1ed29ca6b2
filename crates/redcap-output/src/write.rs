use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::info;

use redcap_ingest::format_numeric;
use redcap_report::{
    CalculationRow, CompletenessRow, DemographicsRow, ImprovementRow, KEY_SCALES,
    ParticipantSummaryRow, ScaleSummaryRow, display_score,
};

/// One instrument's pair of analysis sheets.
#[derive(Debug, Clone)]
pub struct ScaleReport {
    /// Sheet name stem (`phq9`).
    pub key: String,
    pub summary: Vec<ScaleSummaryRow>,
    pub outcomes: Vec<ImprovementRow>,
}

/// Everything the workbook holds besides the main wide table.
#[derive(Debug, Clone)]
pub struct WorkbookTables {
    pub summary: Vec<ParticipantSummaryRow>,
    pub demographics: Vec<DemographicsRow>,
    pub completeness: Vec<CompletenessRow>,
    pub scale_reports: Vec<ScaleReport>,
    pub calculations: Vec<CalculationRow>,
}

/// Write the primary flat CSV (the wide table alone).
pub fn write_flat_csv(output_dir: &Path, frame: &mut DataFrame) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;
    let path = output_dir.join("insights.csv");
    let mut file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = frame.height(), "flat csv written");
    Ok(path)
}

/// Write the analytical workbook as a directory of per-sheet CSVs (the
/// corpus carries no spreadsheet writer): the main wide table plus every
/// analysis tab.
pub fn write_workbook(
    output_dir: &Path,
    frame: &mut DataFrame,
    tables: &WorkbookTables,
) -> Result<PathBuf> {
    let workbook_dir = output_dir.join("insights_workbook");
    fs::create_dir_all(&workbook_dir)
        .with_context(|| format!("create {}", workbook_dir.display()))?;

    let main_path = workbook_dir.join("main_data.csv");
    let mut file =
        File::create(&main_path).with_context(|| format!("create {}", main_path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)
        .with_context(|| format!("write {}", main_path.display()))?;

    write_summary_sheet(&workbook_dir.join("summary.csv"), &tables.summary)?;
    write_demographics_sheet(&workbook_dir.join("demographics.csv"), &tables.demographics)?;
    write_completeness_sheet(
        &workbook_dir.join("data_completeness.csv"),
        &tables.completeness,
    )?;
    for report in &tables.scale_reports {
        if !report.summary.is_empty() {
            write_scale_summary_sheet(
                &workbook_dir.join(format!("{}_summary.csv", report.key)),
                &report.summary,
            )?;
        }
        if !report.outcomes.is_empty() {
            write_outcomes_sheet(
                &workbook_dir.join(format!("{}_outcomes.csv", report.key)),
                &report.outcomes,
            )?;
        }
    }
    write_calculations_sheet(&workbook_dir.join("calculations.csv"), &tables.calculations)?;

    info!(path = %workbook_dir.display(), "workbook written");
    Ok(workbook_dir)
}

fn sheet_writer(path: &Path) -> Result<csv::Writer<File>> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(csv::Writer::from_writer(file))
}

fn write_summary_sheet(path: &Path, rows: &[ParticipantSummaryRow]) -> Result<()> {
    let mut writer = sheet_writer(path)?;
    let mut header = vec![
        "record_id".to_string(),
        "consent_nameprint".to_string(),
        "consent_status".to_string(),
        "dosing_rescheduled".to_string(),
        "age".to_string(),
        "gender".to_string(),
        "n_events".to_string(),
        "timepoints".to_string(),
    ];
    if let Some(first) = rows.first() {
        for scale in &first.scales {
            header.push(format!("{}_first", scale.scale));
            header.push(format!("{}_last", scale.scale));
            header.push(format!("{}_change", scale.scale));
        }
    }
    writer.write_record(&header)?;
    for row in rows {
        let mut record = vec![
            row.record_id.clone(),
            row.consent_name.clone().unwrap_or_default(),
            row.consent_status.clone(),
            row.dosing_rescheduled.to_string(),
            row.age.clone().unwrap_or_default(),
            row.gender.clone().unwrap_or_default(),
            row.n_events.to_string(),
            row.timepoints.clone(),
        ];
        for scale in &row.scales {
            record.push(display_score(scale.first));
            record.push(display_score(scale.last));
            record.push(display_score(scale.change));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_demographics_sheet(path: &Path, rows: &[DemographicsRow]) -> Result<()> {
    let mut writer = sheet_writer(path)?;
    writer.write_record(["Variable", "Category", "N", "Percent"])?;
    for row in rows {
        writer.write_record([&row.variable, &row.category, &row.n, &row.percent])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_completeness_sheet(path: &Path, rows: &[CompletenessRow]) -> Result<()> {
    let mut writer = sheet_writer(path)?;
    let mut header = vec!["Timepoint".to_string()];
    header.extend(KEY_SCALES.iter().map(|scale| (*scale).to_string()));
    writer.write_record(&header)?;
    for row in rows {
        let mut record = vec![row.timepoint.label().to_string()];
        record.extend(row.counts.iter().map(|count| count.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_scale_summary_sheet(path: &Path, rows: &[ScaleSummaryRow]) -> Result<()> {
    let mut writer = sheet_writer(path)?;
    writer.write_record(["Timepoint", "N", "Mean", "SD", "Median", "Min", "Max"])?;
    for row in rows {
        writer.write_record([
            row.timepoint.label().to_string(),
            row.n.to_string(),
            format_numeric(row.mean),
            row.sd.map(format_numeric).unwrap_or_default(),
            format_numeric(row.median),
            format_numeric(row.min),
            format_numeric(row.max),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_outcomes_sheet(path: &Path, rows: &[ImprovementRow]) -> Result<()> {
    let mut writer = sheet_writer(path)?;
    writer.write_record([
        "Comparison",
        "N_paired",
        "Mean_baseline",
        "Mean_followup",
        "Mean_change",
        "Improved_N",
        "Improved_pct",
        "Responders_N",
        "Responder_eligible",
        "Responders_pct",
    ])?;
    for row in rows {
        writer.write_record([
            row.comparison.clone(),
            row.n_paired.to_string(),
            format_numeric(row.mean_baseline),
            format_numeric(row.mean_followup),
            format_numeric(row.mean_change),
            row.improved_n.to_string(),
            format_numeric(row.improved_pct),
            row.responders_n.to_string(),
            row.responder_eligible.to_string(),
            format_numeric(row.responders_pct),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_calculations_sheet(path: &Path, rows: &[CalculationRow]) -> Result<()> {
    let mut writer = sheet_writer(path)?;
    writer.write_record([
        "Measure",
        "Score Name",
        "Calculation",
        "Item Range",
        "Total Range",
        "Timepoints",
        "Higher is Worse",
        "Interpretation",
    ])?;
    for row in rows {
        writer.write_record([
            row.measure.clone(),
            row.score_name.clone(),
            row.calculation.clone(),
            row.item_range.clone(),
            row.total_range.clone(),
            row.timepoints.clone(),
            row.higher_is_worse.to_string(),
            row.interpretation.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
