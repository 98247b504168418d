use crate::catalog::{Catalog, InteractionKind};
use crate::run::SimulationRun;

/// Upper bound of the stress gauge.
pub const STRESS_MAX: f64 = 100.0;

/// Zero point of the baseline ratio; the lowest plausible threshold floor
/// across all elements. Temperatures at or below it contribute no baseline
/// stress.
pub const RATIO_FLOOR_C: f64 = 0.8;

/// Maximum baseline contribution, leaving headroom for interaction effects
/// to push stress into the tipping zone.
pub const BASELINE_SPAN: f64 = 55.0;

/// Global scale applied to every interaction contribution.
pub const INTERACTION_SCALE: f64 = 0.35;

const DESTABILIZING_WEIGHT: f64 = 10.0;
const STABILIZING_WEIGHT: f64 = 12.0;
const UNCERTAIN_WEIGHT: f64 = 4.0;

pub fn clamp_stress(value: f64) -> f64 {
    value.clamp(0.0, STRESS_MAX)
}

/// Stress for the element at `index`, evaluated against `temperature_c`.
///
/// Pure over a consistent snapshot of `run`: only the snapshot's tipped flags
/// feed the interaction terms, so callers may invoke this repeatedly within
/// one tick without affecting the outcome. Tipped elements return exactly
/// [`STRESS_MAX`].
pub fn compute_stress(
    index: usize,
    run: &SimulationRun,
    catalog: &Catalog,
    temperature_c: f64,
) -> f64 {
    let state = &run.elements[index];
    if state.tipped {
        return STRESS_MAX;
    }

    let element = &catalog.elements[index];
    let span = state.threshold_c - RATIO_FLOOR_C;
    let temp_ratio = ((temperature_c - RATIO_FLOOR_C) / span).max(0.0);
    let mut stress = temp_ratio * BASELINE_SPAN;

    for interaction in &catalog.interactions {
        if interaction.to != element.id {
            continue;
        }
        let Some(from_index) = catalog.element_index(&interaction.from) else {
            // Unreachable for validated catalogs; a dangling endpoint here is
            // a programmer error, not something to default around.
            debug_assert!(
                false,
                "interaction {:?} references unknown element {:?}",
                interaction.label, interaction.from
            );
            continue;
        };
        if !run.elements[from_index].tipped {
            continue;
        }
        let scaled = interaction.strength * INTERACTION_SCALE;
        stress += match interaction.kind {
            InteractionKind::Destabilizing => scaled * DESTABILIZING_WEIGHT,
            InteractionKind::Stabilizing => -(scaled * STABILIZING_WEIGHT),
            InteractionKind::Uncertain => scaled * UNCERTAIN_WEIGHT,
        };
    }

    clamp_stress(stress)
}
