use crate::cli::PolicyArgs;
use crate::error::CliResult;
use crate::{config, input, output};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use std::collections::BTreeMap;
use std::path::Path;
use tissue_hierarchy::{HierarchyEngine, Tier};

pub fn run(input_path: &Path, policy: &PolicyArgs, quiet: bool) -> CliResult<()> {
    let engine = HierarchyEngine::new(config::resolve(policy)?)?;
    let set = engine.load(input::load_records(input_path)?);
    let missing = engine.config().validate_against_labels(set.labels())?;
    let partition = engine.priority().partition(set.objects());

    let mut per_tier: BTreeMap<Tier, usize> = BTreeMap::new();
    for &(_, tier) in &partition.parents {
        *per_tier.entry(tier).or_default() += 1;
    }

    let stats = set.stats();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["", "COUNT"]);
    table.add_row(vec!["records".to_string(), stats.records_processed.to_string()]);
    table.add_row(vec!["loaded".to_string(), stats.objects_loaded.to_string()]);
    table.add_row(vec!["skipped".to_string(), stats.records_skipped.to_string()]);
    for (tier, count) in &per_tier {
        table.add_row(vec![format!("parents ({})", tier.as_str()), count.to_string()]);
    }
    table.add_row(vec![
        "children".to_string(),
        partition.children.len().to_string(),
    ]);
    println!("{table}");

    if !quiet {
        if !missing.is_empty() {
            eprintln!(
                "{} configured labels absent from data: {}",
                "warning:".yellow().bold(),
                missing.join(", ")
            );
        }
        if !set.skipped().is_empty() {
            println!("\nSkipped objects:");
            println!("{}", output::format_skipped(set.skipped()));
        }
    }

    println!(
        "{} configuration ({}) is consistent with the data",
        "ok:".green().bold(),
        engine.config().mode.as_str()
    );
    Ok(())
}
