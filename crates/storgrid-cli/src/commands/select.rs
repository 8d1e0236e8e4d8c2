use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use tracing::warn;

use storgrid_core::DefaultMixingPolicy;
use storgrid_placement::{PlacementError, Selection, Selector};

use crate::scenario::Scenario;

pub fn select(path: &str, format: &str, timeout_ms: Option<u64>) -> anyhow::Result<()> {
    let scenario = Scenario::from_file(Path::new(path))?;

    let selection = match timeout_ms {
        Some(ms) => evaluate_with_timeout(scenario, Duration::from_millis(ms))?,
        None => evaluate(&scenario)?,
    };
    let selection = selection.ok_or(PlacementError::NoFeasibleSelection)?;

    println!("{}", render(&selection, format)?);
    Ok(())
}

/// Run the selection engine over a scenario.
pub fn evaluate(scenario: &Scenario) -> Result<Option<Selection>, PlacementError> {
    let selector = Selector::new(&scenario.cluster, &DefaultMixingPolicy);
    let candidates = scenario.all_candidates();

    match &scenario.resource {
        Some(name) => selector.select_for(&scenario.filter, name, &scenario.cluster, &candidates),
        None => selector.select(&scenario.filter, None, &candidates),
    }
}

/// Like [`evaluate`], bounded by `limit`. A search that runs out of time
/// is reported as no feasible selection.
pub fn evaluate_with_timeout(
    scenario: Scenario,
    limit: Duration,
) -> anyhow::Result<Option<Selection>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let outcome = runtime.block_on(async move {
        let search = tokio::task::spawn_blocking(move || evaluate(&scenario));
        match tokio::time::timeout(limit, search).await {
            Ok(joined) => Ok::<_, anyhow::Error>(joined.context("selection task failed")??),
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "selection timed out");
                Ok(None)
            }
        }
    });

    // Do not wait for a search that is still running.
    runtime.shutdown_background();
    outcome
}

pub fn render(selection: &Selection, format: &str) -> anyhow::Result<String> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(selection)?);
    }

    if selection.is_empty() {
        return Ok("✓ Replica count already satisfied, nothing to place".to_string());
    }

    let mut out = format!(
        "✓ Selected {} storage pool(s), total score {:.2}",
        selection.len(),
        selection.score
    );
    for c in &selection.candidates {
        out.push_str(&format!(
            "\n  {} on {} ({}, score {:.2})",
            c.stor_pool, c.node, c.provider_kind, c.score
        ));
    }
    Ok(out)
}
