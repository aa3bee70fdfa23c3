use crate::error::{CliError, CliResult};
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;
use std::path::Path;
use tissue_hierarchy::{
    AssignmentRelation, HierarchyRun, HierarchySummary, ObjectId, ResolveStats, SkippedObject,
};

/// Document written by `assign --output`.
#[derive(Serialize)]
pub struct RunDocument<'a> {
    pub relation: &'a AssignmentRelation,
    pub summary: &'a HierarchySummary,
    pub unassigned: &'a [ObjectId],
    pub skipped: &'a [SkippedObject],
}

impl<'a> From<&'a HierarchyRun> for RunDocument<'a> {
    fn from(run: &'a HierarchyRun) -> Self {
        Self {
            relation: &run.relation,
            summary: &run.summary,
            unassigned: &run.unassigned,
            skipped: &run.skipped,
        }
    }
}

/// Write the run as pretty JSON.
pub fn write_run(path: &Path, run: &HierarchyRun) -> CliResult<()> {
    let json = serde_json::to_string_pretty(&RunDocument::from(run))
        .map_err(|e| CliError::Output(format!("failed to serialize run: {e}")))?;
    std::fs::write(path, json + "\n")
        .map_err(|e| CliError::Output(format!("failed to write {}: {e}", path.display())))
}

/// Summary plus resolver counters, for `--format json`.
pub fn format_summary_json(summary: &HierarchySummary, stats: &ResolveStats) -> CliResult<String> {
    #[derive(Serialize)]
    struct Report<'a> {
        summary: &'a HierarchySummary,
        stats: &'a ResolveStats,
    }
    serde_json::to_string_pretty(&Report { summary, stats })
        .map_err(|e| CliError::Output(format!("failed to serialize summary: {e}")))
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Human-readable summary: totals, per-tier and per-class tables.
pub fn format_summary_table(summary: &HierarchySummary, stats: &ResolveStats) -> String {
    let mut totals = new_table(vec!["", "COUNT"]);
    totals.add_row(vec!["mode".to_string(), summary.mode.as_str().to_string()]);
    totals.add_row(vec![
        "parents".to_string(),
        if summary.aborted {
            format!("{} ({} processed)", summary.parents, summary.parents_processed)
        } else {
            summary.parents.to_string()
        },
    ]);
    totals.add_row(vec!["children".to_string(), summary.children.to_string()]);
    totals.add_row(vec!["assigned".to_string(), summary.assigned.to_string()]);
    totals.add_row(vec!["unassigned".to_string(), summary.unassigned.to_string()]);
    totals.add_row(vec!["skipped".to_string(), summary.skipped.to_string()]);
    totals.add_row(vec![
        "candidates".to_string(),
        stats.candidates_returned.to_string(),
    ]);
    totals.add_row(vec![
        "selectivity".to_string(),
        format!("{:.1}%", stats.selectivity() * 100.0),
    ]);

    let mut tiers = new_table(vec!["TIER", "PARENTS", "WITH CHILDREN", "ASSIGNED"]);
    for (tier, t) in &summary.per_tier {
        tiers.add_row(vec![
            tier.as_str().to_string(),
            t.parents.to_string(),
            t.parents_with_children.to_string(),
            t.assigned.to_string(),
        ]);
    }

    let mut out = format!("{totals}\n\n{tiers}");

    if !summary.per_class.is_empty() {
        let mut classes = new_table(vec!["CLASS", "PARENTS", "ASSIGNED", "AREA", "DENSITY"]);
        for (label, c) in &summary.per_class {
            classes.add_row(vec![
                label.clone(),
                c.parents.to_string(),
                c.assigned.to_string(),
                format!("{:.1}", c.area),
                format!("{:.6}", c.density),
            ]);
        }
        out.push_str(&format!("\n\n{classes}"));
    }

    out
}

/// Table of skipped objects with reasons.
pub fn format_skipped(skipped: &[SkippedObject]) -> String {
    let mut table = new_table(vec!["ID", "REASON"]);
    for s in skipped {
        table.add_row(vec![s.id.clone(), s.reason.clone()]);
    }
    table.to_string()
}
