pub mod catalog;
pub mod diff;
pub mod driver;
pub mod engine;
pub mod error;
pub mod frame;
pub mod reduce;
pub mod run;
pub mod stress;
pub mod tipping;

use anyhow::{ensure, Result};
use rand::Rng;

use catalog::Catalog;
use diff::TickDiff;
use reduce::apply;
use run::SimulationRun;

/// Execute a single simulation tick.
///
/// Computes the tick's diff from a snapshot of the prior state, commits it
/// via [`reduce::apply`], and returns the [`TickDiff`] so callers can build
/// frames and chronicle lines from what changed.
pub fn tick_once<R: Rng>(
    run: &mut SimulationRun,
    catalog: &Catalog,
    rng: &mut R,
) -> Result<TickDiff> {
    ensure!(
        run.running && !run.terminal,
        "tick_once called on a run that is not running (year={})",
        run.year
    );

    let diff = engine::step(run, catalog, rng)?;
    apply(run, &diff);
    Ok(diff)
}

/// Human-readable notes for a tick, one line per newly tipped element.
pub fn collect_chronicle(catalog: &Catalog, diff: &TickDiff) -> Vec<String> {
    diff.events
        .iter()
        .map(|event| {
            let name = catalog
                .element(&event.element_id)
                .map(|element| element.name.as_str())
                .unwrap_or(event.element_id.as_str());
            if event.is_cascade {
                format!(
                    "{} tipped at +{:.2}°C in {}, pushed over by an earlier tipping.",
                    name, event.temperature_c, event.year
                )
            } else {
                format!(
                    "{} tipped at +{:.2}°C in {}.",
                    name, event.temperature_c, event.year
                )
            }
        })
        .collect()
}
