use thiserror::Error;

/// Configuration-integrity faults detected when a catalog is loaded.
///
/// These are fail-fast errors: a catalog that trips any of them never reaches
/// the simulation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("element {id:?}: threshold range [{min}, {max}] is not ascending")]
    ThresholdRange { id: String, min: f64, max: f64 },

    #[error("duplicate element id {0:?}")]
    DuplicateElement(String),

    #[error("duplicate scenario id {0:?}")]
    DuplicateScenario(String),

    #[error("interaction {label:?}: unknown element {id:?}")]
    UnknownEndpoint { label: String, id: String },

    #[error("interaction {label:?}: element {id:?} cannot influence itself")]
    SelfInteraction { label: String, id: String },

    #[error("interaction {label:?}: strength {strength} is not positive")]
    NonPositiveStrength { label: String, strength: f64 },

    #[error("scenario {id:?}: years_to_target must be positive")]
    EmptyTrajectory { id: String },
}

/// Caller errors surfaced synchronously at the command boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("unknown {kind} id {id:?}")]
    InvalidReference { kind: &'static str, id: String },
}

impl SimError {
    pub fn invalid_reference(kind: &'static str, id: &str) -> Self {
        Self::InvalidReference {
            kind,
            id: id.to_string(),
        }
    }
}
