use anyhow::Result;
use rand::Rng;

use crate::catalog::Catalog;
use crate::diff::TickDiff;
use crate::error::SimError;
use crate::run::{CascadeEvent, SimulationRun};
use crate::stress::compute_stress;
use crate::tipping::should_tip;

/// Compute one tick's changes from a consistent snapshot of `run`.
///
/// The year advances by one, the temperature follows the scenario's linear
/// ramp (clamped at the target once `years_to_target` ticks have elapsed,
/// never below the run's starting baseline), and every element's stress and
/// tipping decision reads only the prior tick's tipped flags. Element order
/// therefore cannot influence the outcome.
pub fn step<R: Rng>(run: &SimulationRun, catalog: &Catalog, rng: &mut R) -> Result<TickDiff> {
    let scenario = catalog
        .scenario(&run.scenario_id)
        .ok_or_else(|| SimError::invalid_reference("scenario", &run.scenario_id))?;

    let year = run.year + 1;
    let elapsed = f64::from(year - run.start_year);
    let progress = (elapsed / f64::from(scenario.years_to_target)).clamp(0.0, 1.0);
    // Set the target directly at the end of the ramp so float residue from
    // the interpolation cannot make the plateau drift. Published temperatures
    // never regress below the run's starting baseline, whatever the catalog's
    // scenario targets say.
    let temperature_c = if progress >= 1.0 {
        scenario.target_temp_c
    } else {
        run.start_temp_c + (scenario.target_temp_c - run.start_temp_c) * progress
    }
    .max(run.start_temp_c);

    let mut diff = TickDiff {
        year,
        temperature_c,
        stress: Vec::with_capacity(run.elements.len()),
        newly_tipped: Vec::new(),
        events: Vec::new(),
        terminal: false,
    };

    let previously_tipped = run.any_tipped();
    for index in 0..run.elements.len() {
        let stress = compute_stress(index, run, catalog, temperature_c);
        diff.stress.push(stress);
        if should_tip(stress, run.elements[index].tipped, rng) {
            diff.newly_tipped.push(index);
            diff.events.push(CascadeEvent {
                year,
                element_id: catalog.elements[index].id.clone(),
                temperature_c,
                is_cascade: previously_tipped,
            });
        }
    }

    diff.terminal = !run.elements.is_empty()
        && run
            .elements
            .iter()
            .enumerate()
            .all(|(index, state)| state.tipped || diff.newly_tipped.contains(&index));

    Ok(diff)
}
