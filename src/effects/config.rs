//! Effect configuration
//!
//! Tagged-variant parameter bundles for the force effects. Configurations
//! are validated here, at the boundary, so invalid values never reach the
//! force computations (the elasticity model in particular does not guard
//! poisson_ratio -> 0.5 itself).

use std::error::Error;
use std::fmt;

use crate::math::Real;

/// Discriminant for the effect variants, used by the registry and the
/// binding-facing schema table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    Elasticity,
    ViscosityArtificial,
    ViscosityDfsph,
    ViscosityXsph,
}

/// Parameter bundle for one effect. Immutable during a step; applied
/// between steps through [`SimulationState::apply_config`].
///
/// [`SimulationState::apply_config`]: crate::core::SimulationState::apply_config
#[derive(Clone, Debug, PartialEq)]
pub enum EffectConfig {
    Elasticity {
        young_modulus: Real,
        poisson_ratio: Real,
        nonlinear_strain: bool,
    },
    ViscosityArtificial {
        fluid_viscosity_coefficient: Real,
        boundary_viscosity_coefficient: Real,
    },
    ViscosityDfsph {
        fluid_viscosity_coefficient: Real,
    },
    ViscosityXsph {
        fluid_viscosity_coefficient: Real,
        boundary_viscosity_coefficient: Real,
    },
}

impl EffectConfig {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Elasticity { .. } => EffectKind::Elasticity,
            Self::ViscosityArtificial { .. } => EffectKind::ViscosityArtificial,
            Self::ViscosityDfsph { .. } => EffectKind::ViscosityDfsph,
            Self::ViscosityXsph { .. } => EffectKind::ViscosityXsph,
        }
    }

    /// Factory with the stock defaults per effect kind.
    pub fn default_for(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Elasticity => Self::Elasticity {
                young_modulus: 100.0,
                poisson_ratio: 0.3,
                nonlinear_strain: false,
            },
            EffectKind::ViscosityArtificial => Self::ViscosityArtificial {
                fluid_viscosity_coefficient: 1.0,
                boundary_viscosity_coefficient: 0.0,
            },
            EffectKind::ViscosityDfsph => Self::ViscosityDfsph {
                fluid_viscosity_coefficient: 1.0,
            },
            EffectKind::ViscosityXsph => Self::ViscosityXsph {
                fluid_viscosity_coefficient: 1.0,
                boundary_viscosity_coefficient: 0.0,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Elasticity {
                young_modulus,
                poisson_ratio,
                ..
            } => {
                check_non_negative("young_modulus", young_modulus)?;
                if !poisson_ratio.is_finite() {
                    return Err(ConfigError::NonFinite {
                        field: "poisson_ratio",
                    });
                }
                // The linear stress tensor is singular at 0.5.
                if !(0.0..0.5).contains(&poisson_ratio) {
                    return Err(ConfigError::PoissonRatioOutOfRange {
                        value: poisson_ratio,
                    });
                }
                Ok(())
            }
            Self::ViscosityArtificial {
                fluid_viscosity_coefficient,
                boundary_viscosity_coefficient,
            }
            | Self::ViscosityXsph {
                fluid_viscosity_coefficient,
                boundary_viscosity_coefficient,
            } => {
                check_non_negative("fluid_viscosity_coefficient", fluid_viscosity_coefficient)?;
                check_non_negative(
                    "boundary_viscosity_coefficient",
                    boundary_viscosity_coefficient,
                )
            }
            Self::ViscosityDfsph {
                fluid_viscosity_coefficient,
            } => check_non_negative("fluid_viscosity_coefficient", fluid_viscosity_coefficient),
        }
    }
}

fn check_non_negative(field: &'static str, value: Real) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

/// Validation failure from [`EffectConfig::validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    NonFinite { field: &'static str },
    Negative { field: &'static str, value: Real },
    PoissonRatioOutOfRange { value: Real },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { field } => write!(f, "{field} must be finite"),
            Self::Negative { field, value } => {
                write!(f, "{field} must be non-negative, got {value}")
            }
            Self::PoissonRatioOutOfRange { value } => {
                write!(f, "poisson_ratio must be in [0, 0.5), got {value}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        for kind in [
            EffectKind::Elasticity,
            EffectKind::ViscosityArtificial,
            EffectKind::ViscosityDfsph,
            EffectKind::ViscosityXsph,
        ] {
            let config = EffectConfig::default_for(kind);
            assert_eq!(config.kind(), kind);
            assert_eq!(config.validate(), Ok(()));
        }
    }

    #[test]
    fn rejects_poisson_ratio_at_half() {
        let config = EffectConfig::Elasticity {
            young_modulus: 10.0,
            poisson_ratio: 0.5,
            nonlinear_strain: false,
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::PoissonRatioOutOfRange { value: 0.5 })
        );
    }

    #[test]
    fn rejects_negative_coefficients() {
        let config = EffectConfig::ViscosityArtificial {
            fluid_viscosity_coefficient: -0.1,
            boundary_viscosity_coefficient: 0.0,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "fluid_viscosity_coefficient",
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_finite_values() {
        let config = EffectConfig::ViscosityDfsph {
            fluid_viscosity_coefficient: Real::NAN,
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "fluid_viscosity_coefficient"
            })
        );

        let config = EffectConfig::Elasticity {
            young_modulus: Real::INFINITY,
            poisson_ratio: 0.3,
            nonlinear_strain: false,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "young_modulus"
            })
        ));
    }
}
