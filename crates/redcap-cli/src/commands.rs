use anyhow::{Context, Result, bail};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use redcap_cli::pipeline::{IntegrateOptions, IntegrateResult, run_integrate};
use redcap_registry::InstrumentRegistry;
use redcap_sample::{SampleOptions, generate_sample, write_sample_csv};

use crate::cli::{GenerateArgs, IntegrateArgs, OutputFormatArg};

pub fn run_integrate_command(args: &IntegrateArgs) -> Result<IntegrateResult> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => args
            .input
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_else(|| std::path::PathBuf::from(".")),
    };
    let (write_flat, write_workbook) = match args.format {
        OutputFormatArg::Csv => (true, false),
        OutputFormatArg::Workbook => (false, true),
        OutputFormatArg::Both => (true, true),
    };
    run_integrate(&IntegrateOptions {
        input: &args.input,
        output_dir: &output_dir,
        write_flat,
        write_workbook,
        dry_run: args.dry_run,
    })
}

/// Print the instrument catalog as a table.
pub fn run_instruments() -> Result<()> {
    let registry = InstrumentRegistry::global();
    let problems = registry.validate();
    if !problems.is_empty() {
        bail!("instrument catalog is inconsistent: {}", problems.join("; "));
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Name"),
        header_cell("Items"),
        header_cell("Item Range"),
        header_cell("Total Range"),
        header_cell("Scoring"),
        header_cell("Timepoints"),
        header_cell("Worse"),
    ]);
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
    if let Some(column) = table.column_mut(2) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    for instrument in registry.iter() {
        let timepoints: Vec<&str> = instrument
            .timepoints
            .iter()
            .map(|timepoint| timepoint.label())
            .collect();
        table.add_row(vec![
            Cell::new(instrument.key).add_attribute(Attribute::Bold),
            Cell::new(instrument.name),
            Cell::new(instrument.items),
            Cell::new(instrument.item_range_label()),
            Cell::new(instrument.total_range_label()),
            Cell::new(instrument.scoring.to_string()),
            Cell::new(timepoints.join(", ")),
            Cell::new(if instrument.higher_is_worse { "higher" } else { "lower" }),
        ]);
    }
    println!("{table}");
    println!("{} instruments", registry.len());
    Ok(())
}

pub fn run_generate(args: &GenerateArgs) -> Result<()> {
    let options = SampleOptions {
        participants: args.participants,
        seed: args.seed,
        rescheduled_rate: args.rescheduled_rate,
    };
    let sample = generate_sample(&options).context("generate sample data")?;
    write_sample_csv(&args.output, &sample)
        .with_context(|| format!("write {}", args.output.display()))?;
    println!(
        "Generated {} rows for {} participants: {}",
        sample.row_count(),
        args.participants,
        args.output.display()
    );
    Ok(())
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(comfy_table::Color::Cyan)
        .add_attribute(Attribute::Bold)
}
