use crate::diff::TickDiff;
use crate::run::SimulationRun;
use crate::stress::{clamp_stress, STRESS_MAX};

/// Commit a tick's diff to the run.
///
/// The engine never writes to the run directly; this is the sole mutation
/// point, so a tick lands atomically. Newly tipped elements are pinned at
/// maximum stress, and a terminal diff forces the running flag down.
pub fn apply(run: &mut SimulationRun, diff: &TickDiff) {
    run.year = diff.year;
    run.temperature_c = diff.temperature_c;

    for (index, stress) in diff.stress.iter().enumerate() {
        if let Some(state) = run.elements.get_mut(index) {
            state.stress = clamp_stress(*stress);
        }
    }

    for &index in &diff.newly_tipped {
        if let Some(state) = run.elements.get_mut(index) {
            state.tipped = true;
            state.stress = STRESS_MAX;
        }
    }

    run.events.extend(diff.events.iter().cloned());

    if diff.terminal {
        run.terminal = true;
        run.running = false;
    }
}
