use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::catalog::{Catalog, ElementRole};
use crate::run::{CascadeEvent, SimulationRun};

/// Per-element slice of a frame: static labels plus the live gauges.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ElementView {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub role: ElementRole,
    pub stress: f64,
    pub tipped: bool,
}

/// Read-only snapshot published to the presentation layer each tick or on
/// demand. Scenario, year and temperature are absent while Idle.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize)]
pub struct Frame {
    /// Monotonic frame sequence number, independent of simulated years.
    pub t: u64,
    pub scenario: Option<String>,
    pub year: Option<u32>,
    pub temperature_c: Option<f64>,
    pub running: bool,
    pub terminal: bool,
    pub elements: Vec<ElementView>,
    /// Oldest-first; consumers wanting most-recent-first reverse it.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<CascadeEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chronicle: Vec<String>,
}

/// Build a frame for the current state; `run` is `None` while Idle, in which
/// case element gauges read zero and untipped.
pub fn make_frame(
    t: u64,
    run: Option<&SimulationRun>,
    catalog: &Catalog,
    chronicle: Vec<String>,
) -> Frame {
    let elements = catalog
        .elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let (stress, tipped) = run
                .and_then(|run| run.elements.get(index))
                .map(|state| (state.stress, state.tipped))
                .unwrap_or((0.0, false));
            ElementView {
                id: element.id.clone(),
                name: element.name.clone(),
                short_name: element.short_name.clone(),
                role: element.role,
                stress,
                tipped,
            }
        })
        .collect();

    Frame {
        t,
        scenario: run.map(|run| run.scenario_id.clone()),
        year: run.map(|run| run.year),
        temperature_c: run.map(|run| run.temperature_c),
        running: run.map(|run| run.running).unwrap_or(false),
        terminal: run.map(|run| run.terminal).unwrap_or(false),
        elements,
        events: run.map(|run| run.events.clone()).unwrap_or_default(),
        chronicle,
    }
}

impl Frame {
    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}
