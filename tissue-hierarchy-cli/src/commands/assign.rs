use crate::cli::{PolicyArgs, SummaryFormat};
use crate::error::CliResult;
use crate::{config, input, output};
use colored::Colorize;
use std::path::Path;
use tissue_hierarchy::HierarchyEngine;

pub fn run(
    input_path: &Path,
    policy: &PolicyArgs,
    output_path: Option<&Path>,
    format: SummaryFormat,
    quiet: bool,
) -> CliResult<()> {
    let engine = HierarchyEngine::new(config::resolve(policy)?)?;
    let records = input::load_records(input_path)?;
    let run = engine.run(records)?;
    run.summary.log();

    if !run.skipped.is_empty() && !quiet {
        eprintln!(
            "{} {} object(s) skipped; run 'tissue-hier validate' for details",
            "warning:".yellow().bold(),
            run.skipped.len()
        );
    }

    match format {
        SummaryFormat::Table => {
            println!("{}", output::format_summary_table(&run.summary, &run.stats))
        }
        SummaryFormat::Json => {
            println!("{}", output::format_summary_json(&run.summary, &run.stats)?)
        }
    }

    if let Some(path) = output_path {
        output::write_run(path, &run)?;
        if !quiet {
            eprintln!(
                "Wrote {} assignments to {}",
                run.relation.len(),
                path.display()
            );
        }
    }

    Ok(())
}
