use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::SimError;

/// Simulated year a fresh run starts in.
pub const START_YEAR: u32 = 2025;

/// Global temperature anomaly at run start, degrees above pre-industrial.
pub const BASELINE_TEMP_C: f64 = 1.1;

/// Per-element dynamic state for one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementRunState {
    /// Proximity to tipping, `[0, 100]`. Pinned at 100 once tipped.
    pub stress: f64,
    /// Monotonic false -> true; only a full reset clears it.
    pub tipped: bool,
    /// Threshold sampled once per run from the element's plausible range,
    /// fixed for the run's lifetime.
    pub threshold_c: f64,
}

/// One tipping event, recorded the tick it happened.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CascadeEvent {
    pub year: u32,
    pub element_id: String,
    pub temperature_c: f64,
    /// True unless this was the first tipping event of the run.
    pub is_cascade: bool,
}

/// The mutable aggregate for one simulation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationRun {
    pub scenario_id: String,
    pub start_year: u32,
    pub start_temp_c: f64,
    pub year: u32,
    pub temperature_c: f64,
    pub running: bool,
    /// Set the instant every element has tipped; one-way until reset.
    pub terminal: bool,
    /// Parallel to `Catalog::elements`.
    pub elements: Vec<ElementRunState>,
    /// Oldest-first event log.
    pub events: Vec<CascadeEvent>,
}

impl SimulationRun {
    /// Create a fresh run bound to `scenario_id`, sampling each element's
    /// threshold uniformly from its catalog range.
    pub fn start<R: Rng>(
        catalog: &Catalog,
        scenario_id: &str,
        rng: &mut R,
    ) -> Result<Self, SimError> {
        if catalog.scenario(scenario_id).is_none() {
            return Err(SimError::invalid_reference("scenario", scenario_id));
        }

        let elements = catalog
            .elements
            .iter()
            .map(|element| ElementRunState {
                stress: 0.0,
                tipped: false,
                threshold_c: rng.gen_range(element.threshold_min_c..element.threshold_max_c),
            })
            .collect();

        Ok(Self {
            scenario_id: scenario_id.to_string(),
            start_year: START_YEAR,
            start_temp_c: BASELINE_TEMP_C,
            year: START_YEAR,
            temperature_c: BASELINE_TEMP_C,
            running: true,
            terminal: false,
            elements,
            events: Vec::new(),
        })
    }

    pub fn any_tipped(&self) -> bool {
        self.elements.iter().any(|state| state.tipped)
    }

    pub fn all_tipped(&self) -> bool {
        !self.elements.is_empty() && self.elements.iter().all(|state| state.tipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn start_initialises_baseline_state() {
        let catalog = Catalog::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let run = SimulationRun::start(&catalog, "high", &mut rng).expect("scenario exists");

        assert_eq!(run.year, START_YEAR);
        assert_eq!(run.temperature_c, BASELINE_TEMP_C);
        assert!(run.running);
        assert!(!run.terminal);
        assert!(run.events.is_empty());
        assert_eq!(run.elements.len(), catalog.elements.len());
        for state in &run.elements {
            assert_eq!(state.stress, 0.0);
            assert!(!state.tipped);
        }
    }

    #[test]
    fn start_samples_thresholds_within_catalog_ranges() {
        let catalog = Catalog::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let run = SimulationRun::start(&catalog, "paris", &mut rng).expect("scenario exists");

        for (state, element) in run.elements.iter().zip(&catalog.elements) {
            assert!(
                state.threshold_c >= element.threshold_min_c
                    && state.threshold_c < element.threshold_max_c,
                "threshold {} outside [{}, {}) for {}",
                state.threshold_c,
                element.threshold_min_c,
                element.threshold_max_c,
                element.id
            );
        }
    }

    #[test]
    fn start_refuses_unknown_scenario() {
        let catalog = Catalog::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let err = SimulationRun::start(&catalog, "nonesuch", &mut rng).unwrap_err();
        assert_eq!(err, SimError::invalid_reference("scenario", "nonesuch"));
    }
}
