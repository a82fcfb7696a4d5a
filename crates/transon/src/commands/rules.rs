//! Rules command - list the rule vocabulary

use crate::output::{print_json, print_text};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use transon_core::RuleKind;

#[derive(Debug, Serialize)]
struct RuleInfo {
    name: &'static str,
    params: &'static [&'static str],
    summary: &'static str,
}

/// Execute `transon rules` command
pub fn run(json: bool) -> Result<()> {
    let rules: Vec<RuleInfo> = RuleKind::ALL
        .into_iter()
        .map(|kind| RuleInfo {
            name: kind.name(),
            params: kind.params(),
            summary: kind.summary(),
        })
        .collect();

    if json {
        print_json(&serde_json::to_string_pretty(&rules)?)?;
        return Ok(());
    }

    let width = rules.iter().map(|r| r.name.len()).max().unwrap_or(0);
    for rule in &rules {
        let params = if rule.params.is_empty() {
            String::new()
        } else {
            format!(" [{}]", rule.params.join(", "))
        };
        print_text(&format!(
            "{}  {}{}",
            format!("{:width$}", rule.name).bold(),
            rule.summary,
            params.dimmed()
        ))?;
    }
    Ok(())
}
