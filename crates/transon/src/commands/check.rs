//! Check command - compile a template without input data

use super::build_transformer;
use crate::context::Context;
use crate::output::{print_json, print_text};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct CheckReport {
    template: String,
    marker: String,
    max_depth: usize,
    linked: Vec<String>,
}

/// Execute `transon check` command
///
/// Fails with the compile or link error; prints the named templates the
/// template always includes otherwise.
pub fn run(ctx: &Context, template: PathBuf, templates: Option<PathBuf>, json: bool) -> Result<()> {
    let transformer = build_transformer(ctx, &template, templates)?;

    let report = CheckReport {
        template: template.display().to_string(),
        marker: transformer.options().marker.clone(),
        max_depth: transformer.options().max_depth,
        linked: transformer.registry().cached_names(),
    };

    if json {
        print_json(&serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    print_text(&format!("{} {}", "✓".green(), report.template))?;
    if ctx.verbose {
        print_text(&format!(
            "  marker: {:?}, max depth: {}",
            report.marker, report.max_depth
        ))?;
    }
    if report.linked.is_empty() {
        print_text("  no named templates linked")?;
    } else {
        print_text("  linked templates:")?;
        for name in &report.linked {
            print_text(&format!("    - {}", name.cyan()))?;
        }
    }
    Ok(())
}
