use serde::Serialize;

use crate::run::CascadeEvent;

/// Every change one tick applies, computed from a single consistent snapshot
/// of the prior state.
///
/// No element's entry depends on another element's same-tick transition;
/// `reduce::apply` commits the whole diff in one step.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TickDiff {
    pub year: u32,
    pub temperature_c: f64,
    /// One entry per element, parallel to the catalog order.
    pub stress: Vec<f64>,
    /// Indices of elements whose Bernoulli draw came up this tick.
    pub newly_tipped: Vec<usize>,
    pub events: Vec<CascadeEvent>,
    /// True when the committed state will have every element tipped.
    pub terminal: bool,
}
