use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use redcap_cli::pipeline::IntegrateResult;
use redcap_model::{IssueKind, IssueSeverity};

pub fn print_summary(result: &IntegrateResult) {
    println!("Output: {}", result.output_dir.display());
    if let Some(path) = &result.flat_csv {
        println!("Flat CSV: {}", path.display());
    }
    if let Some(path) = &result.workbook_dir {
        println!("Workbook: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Rows read"), Cell::new(result.report.rows_read)]);
    table.add_row(vec![
        Cell::new("Rows excluded"),
        count_cell(result.report.rows_excluded, comfy_table::Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Participants"),
        Cell::new(result.participants),
    ]);
    table.add_row(vec![
        Cell::new("With baseline"),
        Cell::new(result.with_baseline),
    ]);
    table.add_row(vec![
        Cell::new("No baseline"),
        count_cell(result.no_baseline, comfy_table::Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Consent passed"),
        Cell::new(result.consent_passed),
    ]);
    table.add_row(vec![
        Cell::new("Dosing rescheduled"),
        Cell::new(result.rescheduled),
    ]);
    table.add_row(vec![Cell::new("Output columns"), Cell::new(result.columns)]);
    println!("{table}");

    if !result.availability.is_empty() {
        println!();
        println!("Data availability (participants with any observation):");
        for (scale, count) in &result.availability {
            println!("  - {scale}: {count}");
        }
    }

    print_issue_table(result);
}

fn print_issue_table(result: &IntegrateResult) {
    if result.report.issues.is_empty() {
        return;
    }
    // Aggregate by kind; individual rows stay available at debug level.
    let mut grouped: BTreeMap<IssueKind, (IssueSeverity, usize, String)> = BTreeMap::new();
    for issue in &result.report.issues {
        let entry = grouped
            .entry(issue.kind)
            .or_insert_with(|| (issue.severity, 0, issue.message.clone()));
        entry.1 += 1;
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Count"),
        header_cell("Example"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    let mut rows: Vec<_> = grouped.into_iter().collect();
    rows.sort_by_key(|(kind, (severity, _, _))| {
        (std::cmp::Reverse(severity_rank(*severity)), *kind)
    });
    for (kind, (severity, count, example)) in rows {
        table.add_row(vec![
            severity_cell(severity),
            Cell::new(kind.code()),
            count_cell(count, severity_color(severity)),
            Cell::new(example),
        ]);
    }
    println!();
    println!("Data-quality issues:");
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(comfy_table::Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: comfy_table::Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        Cell::new(count).fg(comfy_table::Color::DarkGrey)
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR").fg(comfy_table::Color::Red),
        IssueSeverity::Warning => Cell::new("WARN").fg(comfy_table::Color::Yellow),
    }
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 2,
        IssueSeverity::Warning => 1,
    }
}

fn severity_color(severity: IssueSeverity) -> comfy_table::Color {
    match severity {
        IssueSeverity::Error => comfy_table::Color::Red,
        IssueSeverity::Warning => comfy_table::Color::Yellow,
    }
}
