use rand::Rng;

use crate::catalog::Catalog;
use crate::diff::TickDiff;
use crate::error::SimError;
use crate::run::SimulationRun;
use crate::tick_once;

/// Lifecycle phase of the controller's run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Terminal,
}

/// Owns the authoritative run and mediates every inbound command.
///
/// The scheduler driving [`Controller::tick`] is expected to be the only
/// caller mutating the controller, which gives the serialized-tick guarantee
/// for free; the daemon satisfies that by keeping the controller on a single
/// task.
#[derive(Clone, Debug)]
pub struct Controller {
    catalog: Catalog,
    run: Option<SimulationRun>,
}

impl Controller {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog, run: None }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn run(&self) -> Option<&SimulationRun> {
        self.run.as_ref()
    }

    pub fn phase(&self) -> Phase {
        match &self.run {
            None => Phase::Idle,
            Some(run) if run.terminal => Phase::Terminal,
            Some(run) if run.running => Phase::Running,
            Some(_) => Phase::Paused,
        }
    }

    /// Replace any current run with a fresh one bound to `scenario_id`,
    /// resampling every element's threshold. Refuses unknown ids without
    /// touching the current run.
    pub fn select_scenario<R: Rng>(
        &mut self,
        scenario_id: &str,
        rng: &mut R,
    ) -> Result<(), SimError> {
        let run = SimulationRun::start(&self.catalog, scenario_id, rng)?;
        self.run = Some(run);
        Ok(())
    }

    /// Stop ticking without altering run content. No-op in Idle or Terminal.
    pub fn pause(&mut self) {
        if let Some(run) = self.run.as_mut() {
            if !run.terminal {
                run.running = false;
            }
        }
    }

    /// Resume ticking. Wall-clock time spent paused does not advance
    /// simulated years. No-op in Idle or Terminal.
    pub fn resume(&mut self) {
        if let Some(run) = self.run.as_mut() {
            if !run.terminal {
                run.running = true;
            }
        }
    }

    /// Discard the current run and return to Idle.
    pub fn reset(&mut self) {
        self.run = None;
    }

    /// Advance one tick if the run is live; `Ok(None)` when there is nothing
    /// to do (Idle, Paused, or Terminal).
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> anyhow::Result<Option<TickDiff>> {
        match self.run.as_mut() {
            Some(run) if run.running && !run.terminal => {
                let diff = tick_once(run, &self.catalog, rng)?;
                Ok(Some(diff))
            }
            _ => Ok(None),
        }
    }
}
