//! Cascade stage definitions
//!
//! Each stage declares the variables it consumes and the single variable it
//! produces. A stage may only consume raw features or outputs of earlier stages.

use crate::domain::DomainError;

/// Variables flowing through the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    PriceProxy,
    InstalledCapacity,
    Load,
    Price,
    BlackoutRisk,
}

impl Variable {
    /// Regressor name used in feature rows and persisted models
    pub const fn name(self) -> &'static str {
        match self {
            Self::PriceProxy => "price_proxy",
            Self::InstalledCapacity => "installed_capacity",
            Self::Load => "load",
            Self::Price => "price",
            Self::BlackoutRisk => "blackout_risk",
        }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The three per-district models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Load,
    Price,
    Blackout,
}

impl StageKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Price => "price",
            Self::Blackout => "blackout",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One step of the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub kind: StageKind,
    pub inputs: &'static [Variable],
    pub output: Variable,
}

impl Stage {
    /// Regressor names in declaration order
    pub fn input_names(&self) -> Vec<&'static str> {
        self.inputs.iter().map(|v| v.name()).collect()
    }
}

/// Variables available before any stage runs
pub const RAW_FEATURES: &[Variable] = &[Variable::PriceProxy, Variable::InstalledCapacity];

/// Load, then price, then blackout risk
pub const CASCADE: [Stage; 3] = [
    Stage {
        kind: StageKind::Load,
        inputs: &[Variable::PriceProxy, Variable::InstalledCapacity],
        output: Variable::Load,
    },
    Stage {
        kind: StageKind::Price,
        inputs: &[Variable::Load],
        output: Variable::Price,
    },
    Stage {
        kind: StageKind::Blackout,
        inputs: &[Variable::Load, Variable::InstalledCapacity],
        output: Variable::BlackoutRisk,
    },
];

/// Check that every stage only consumes raw features or earlier outputs
pub fn validate_cascade(stages: &[Stage]) -> Result<(), DomainError> {
    let mut available: Vec<Variable> = RAW_FEATURES.to_vec();

    for stage in stages {
        if let Some(missing) = stage.inputs.iter().find(|v| !available.contains(v)) {
            return Err(DomainError::configuration(format!(
                "stage '{}' consumes '{}' before it is produced",
                stage.kind, missing
            )));
        }

        available.push(stage.output);
    }

    Ok(())
}
