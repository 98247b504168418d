use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Coarse classification of a tipping element, used by the presentation
/// layer for grouping and iconography.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRole {
    IceSheet,
    OceanCirculation,
    Biosphere,
}

/// A climate subsystem that can shift irreversibly once its temperature
/// threshold is exceeded. Immutable for the lifetime of the process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TippingElement {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub role: ElementRole,
    /// Lower bound of the plausible tipping threshold, degrees above
    /// pre-industrial. Strictly below `threshold_max_c`.
    pub threshold_min_c: f64,
    pub threshold_max_c: f64,
    /// Layout hint for the presentation layer; the engine never reads it.
    pub position: (f32, f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Destabilizing,
    Stabilizing,
    Uncertain,
}

/// Directed influence of one tipped element on another's stress.
///
/// `from` tipping affects `to`; there is no implied reverse effect. The model
/// permits several interactions per ordered pair, their contributions sum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Interaction {
    pub from: String,
    pub to: String,
    pub kind: InteractionKind,
    pub strength: f64,
    pub label: String,
}

/// A named warming trajectory: linear ramp from the run baseline to
/// `target_temp_c` over `years_to_target` simulated years.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target_temp_c: f64,
    pub years_to_target: u32,
}

/// The static catalogs feeding the simulation: element registry,
/// interaction table, and scenario list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Catalog {
    pub elements: Vec<TippingElement>,
    pub interactions: Vec<Interaction>,
    pub scenarios: Vec<Scenario>,
}

impl Catalog {
    /// Load and validate a catalog JSON document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open catalog file {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Deserialize and validate a catalog document from an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let catalog: Self = serde_json::from_reader(reader).context("invalid catalog json")?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn element_index(&self, id: &str) -> Option<usize> {
        self.elements.iter().position(|element| element.id == id)
    }

    pub fn element(&self, id: &str) -> Option<&TippingElement> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|scenario| scenario.id == id)
    }

    /// Fail-fast integrity checks, run at load time rather than during
    /// simulation.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut element_ids = HashSet::new();
        for element in &self.elements {
            if !element_ids.insert(element.id.as_str()) {
                return Err(CatalogError::DuplicateElement(element.id.clone()));
            }
            if element.threshold_min_c >= element.threshold_max_c {
                return Err(CatalogError::ThresholdRange {
                    id: element.id.clone(),
                    min: element.threshold_min_c,
                    max: element.threshold_max_c,
                });
            }
        }

        for interaction in &self.interactions {
            for endpoint in [&interaction.from, &interaction.to] {
                if !element_ids.contains(endpoint.as_str()) {
                    return Err(CatalogError::UnknownEndpoint {
                        label: interaction.label.clone(),
                        id: endpoint.clone(),
                    });
                }
            }
            if interaction.from == interaction.to {
                return Err(CatalogError::SelfInteraction {
                    label: interaction.label.clone(),
                    id: interaction.from.clone(),
                });
            }
            if interaction.strength <= 0.0 {
                return Err(CatalogError::NonPositiveStrength {
                    label: interaction.label.clone(),
                    strength: interaction.strength,
                });
            }
        }

        let mut scenario_ids = HashSet::new();
        for scenario in &self.scenarios {
            if !scenario_ids.insert(scenario.id.as_str()) {
                return Err(CatalogError::DuplicateScenario(scenario.id.clone()));
            }
            if scenario.years_to_target == 0 {
                return Err(CatalogError::EmptyTrajectory {
                    id: scenario.id.clone(),
                });
            }
        }

        Ok(())
    }

    /// The default model: four interacting tipping elements and four
    /// warming trajectories.
    pub fn builtin() -> Self {
        let elements = vec![
            TippingElement {
                id: "greenland".to_string(),
                name: "Greenland Ice Sheet".to_string(),
                short_name: "GIS".to_string(),
                description: "Surface melt lowers the ice sheet into warmer air, \
                              feeding further melt once warming passes its viability threshold."
                    .to_string(),
                role: ElementRole::IceSheet,
                threshold_min_c: 0.8,
                threshold_max_c: 3.0,
                position: (0.30, 0.15),
            },
            TippingElement {
                id: "wais".to_string(),
                name: "West Antarctic Ice Sheet".to_string(),
                short_name: "WAIS".to_string(),
                description: "Marine ice sheet grounded below sea level; grounding-line \
                              retreat can become self-sustaining."
                    .to_string(),
                role: ElementRole::IceSheet,
                threshold_min_c: 1.0,
                threshold_max_c: 3.0,
                position: (0.25, 0.85),
            },
            TippingElement {
                id: "amoc".to_string(),
                name: "Atlantic Meridional Overturning Circulation".to_string(),
                short_name: "AMOC".to_string(),
                description: "Density-driven Atlantic circulation; surface freshening \
                              can shut down deep-water formation."
                    .to_string(),
                role: ElementRole::OceanCirculation,
                threshold_min_c: 1.4,
                threshold_max_c: 8.0,
                position: (0.55, 0.45),
            },
            TippingElement {
                id: "amazon".to_string(),
                name: "Amazon Rainforest".to_string(),
                short_name: "AMAZ".to_string(),
                description: "The forest recycles much of its own rainfall; dieback \
                              past a drying threshold flips it toward savanna."
                    .to_string(),
                role: ElementRole::Biosphere,
                threshold_min_c: 2.0,
                threshold_max_c: 6.0,
                position: (0.75, 0.60),
            },
        ];

        let interactions = vec![
            Interaction {
                from: "greenland".to_string(),
                to: "amoc".to_string(),
                kind: InteractionKind::Destabilizing,
                strength: 1.0,
                label: "Meltwater freshens the North Atlantic and weakens deep-water formation"
                    .to_string(),
            },
            Interaction {
                from: "greenland".to_string(),
                to: "wais".to_string(),
                kind: InteractionKind::Destabilizing,
                strength: 0.4,
                label: "Sea-level rise lifts grounded ice off its bed".to_string(),
            },
            Interaction {
                from: "wais".to_string(),
                to: "greenland".to_string(),
                kind: InteractionKind::Destabilizing,
                strength: 0.3,
                label: "Antarctic sea-level contribution reaches the northern hemisphere"
                    .to_string(),
            },
            Interaction {
                from: "wais".to_string(),
                to: "amoc".to_string(),
                kind: InteractionKind::Uncertain,
                strength: 0.2,
                label: "Antarctic meltwater reaches the overturning's southern limb".to_string(),
            },
            Interaction {
                from: "amoc".to_string(),
                to: "greenland".to_string(),
                kind: InteractionKind::Stabilizing,
                strength: 0.6,
                label: "An overturning slowdown cools the northern high latitudes".to_string(),
            },
            Interaction {
                from: "amoc".to_string(),
                to: "wais".to_string(),
                kind: InteractionKind::Destabilizing,
                strength: 0.3,
                label: "A weaker overturning pools warm water in the Southern Ocean".to_string(),
            },
            Interaction {
                from: "amoc".to_string(),
                to: "amazon".to_string(),
                kind: InteractionKind::Uncertain,
                strength: 0.3,
                label: "Shifted tropical rainfall belts; sign and size remain debated".to_string(),
            },
        ];

        let scenarios = vec![
            Scenario {
                id: "paris".to_string(),
                name: "Paris Agreement".to_string(),
                description: "Rapid mitigation holds warming well below two degrees.".to_string(),
                target_temp_c: 1.6,
                years_to_target: 75,
            },
            Scenario {
                id: "pledges".to_string(),
                name: "Current Pledges".to_string(),
                description: "Announced national pledges, imperfectly kept.".to_string(),
                target_temp_c: 2.7,
                years_to_target: 75,
            },
            Scenario {
                id: "high".to_string(),
                name: "High Emissions".to_string(),
                description: "Fossil-fuelled development with little mitigation.".to_string(),
                target_temp_c: 4.0,
                years_to_target: 75,
            },
            Scenario {
                id: "surge".to_string(),
                name: "Accelerated Burn".to_string(),
                description: "A worst-case trajectory reaching five degrees by mid-century."
                    .to_string(),
                target_temp_c: 5.0,
                years_to_target: 50,
            },
        ];

        Self {
            elements,
            interactions,
            scenarios,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_element(id: &str) -> TippingElement {
        TippingElement {
            id: id.to_string(),
            name: id.to_string(),
            short_name: id.to_uppercase(),
            description: String::new(),
            role: ElementRole::IceSheet,
            threshold_min_c: 1.0,
            threshold_max_c: 2.0,
            position: (0.0, 0.0),
        }
    }

    #[test]
    fn builtin_catalog_validates() {
        let catalog = Catalog::builtin();
        catalog.validate().expect("builtin catalog is well-formed");
        assert_eq!(catalog.elements.len(), 4);
        assert!(catalog.scenario("high").is_some());
    }

    #[test]
    fn rejects_inverted_threshold_range() {
        let mut catalog = Catalog::builtin();
        catalog.elements[0].threshold_min_c = 5.0;
        catalog.elements[0].threshold_max_c = 1.0;
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::ThresholdRange { .. }));
    }

    #[test]
    fn rejects_unknown_interaction_endpoint() {
        let catalog = Catalog {
            elements: vec![minimal_element("a")],
            interactions: vec![Interaction {
                from: "a".to_string(),
                to: "missing".to_string(),
                kind: InteractionKind::Destabilizing,
                strength: 1.0,
                label: "dangling".to_string(),
            }],
            scenarios: Vec::new(),
        };
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownEndpoint { .. }));
    }

    #[test]
    fn rejects_self_interaction() {
        let catalog = Catalog {
            elements: vec![minimal_element("a")],
            interactions: vec![Interaction {
                from: "a".to_string(),
                to: "a".to_string(),
                kind: InteractionKind::Uncertain,
                strength: 0.5,
                label: "loop".to_string(),
            }],
            scenarios: Vec::new(),
        };
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::SelfInteraction { .. }));
    }

    #[test]
    fn rejects_non_positive_strength() {
        let catalog = Catalog {
            elements: vec![minimal_element("a"), minimal_element("b")],
            interactions: vec![Interaction {
                from: "a".to_string(),
                to: "b".to_string(),
                kind: InteractionKind::Stabilizing,
                strength: 0.0,
                label: "inert".to_string(),
            }],
            scenarios: Vec::new(),
        };
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::NonPositiveStrength { .. }));
    }

    #[test]
    fn rejects_zero_length_trajectory() {
        let mut catalog = Catalog::builtin();
        catalog.scenarios[0].years_to_target = 0;
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::EmptyTrajectory { .. }));
    }

    #[test]
    fn catalog_documents_round_trip_through_json() {
        let builtin = Catalog::builtin();
        let json = serde_json::to_string(&builtin).expect("catalog serializes");
        let reloaded = Catalog::from_reader(json.as_bytes()).expect("catalog reloads");
        assert_eq!(reloaded.elements.len(), builtin.elements.len());
        assert_eq!(reloaded.interactions.len(), builtin.interactions.len());
        assert_eq!(reloaded.scenarios.len(), builtin.scenarios.len());
    }

    #[test]
    fn from_reader_rejects_invalid_documents() {
        let err = Catalog::from_reader("not json".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid catalog json"));
    }
}
