use std::path::Path;

use serde_json::json;

use storgrid_placement::deselect as choose_victim;

use crate::scenario::Scenario;

/// Treats the scenario's candidates as the pools currently in use.
pub fn deselect(path: &str, format: &str) -> anyhow::Result<()> {
    let scenario = Scenario::from_file(Path::new(path))?;
    println!("{}", render(&scenario, format)?);
    Ok(())
}

pub fn render(scenario: &Scenario, format: &str) -> anyhow::Result<String> {
    let victim = choose_victim(&scenario.all_candidates(), &scenario.fixed_nodes);

    if format == "json" {
        return Ok(serde_json::to_string_pretty(&json!({ "node": victim }))?);
    }
    Ok(match victim {
        Some(node) => format!("✓ Remove replica from node {node}"),
        None => "No replica to remove".to_string(),
    })
}
