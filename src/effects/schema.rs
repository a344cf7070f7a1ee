//! Binding-facing property schema
//!
//! Static table describing the tunable fields of every effect kind, for a
//! host binding layer to consume when registering editor properties. The
//! core itself never reads this; validation lives in
//! [`EffectConfig::validate`](super::EffectConfig::validate).

use crate::effects::config::EffectKind;
use crate::math::Real;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    /// Float with a hard minimum and a soft editor maximum (values above
    /// the soft maximum are legal).
    Float { min: Real, ui_max: Real },
    Bool,
}

#[derive(Clone, Copy, Debug)]
pub struct PropertyDef {
    pub effect: EffectKind,
    pub name: &'static str,
    pub value: PropertyValue,
}

pub const PROPERTY_SCHEMA: &[PropertyDef] = &[
    PropertyDef {
        effect: EffectKind::Elasticity,
        name: "young_modulus",
        value: PropertyValue::Float {
            min: 0.0,
            ui_max: 1000.0,
        },
    },
    PropertyDef {
        effect: EffectKind::Elasticity,
        name: "poisson_ratio",
        value: PropertyValue::Float {
            min: 0.0,
            ui_max: 1.0,
        },
    },
    PropertyDef {
        effect: EffectKind::Elasticity,
        name: "nonlinear_strain",
        value: PropertyValue::Bool,
    },
    PropertyDef {
        effect: EffectKind::ViscosityArtificial,
        name: "fluid_viscosity_coefficient",
        value: PropertyValue::Float {
            min: 0.0,
            ui_max: 1.0,
        },
    },
    PropertyDef {
        effect: EffectKind::ViscosityArtificial,
        name: "boundary_viscosity_coefficient",
        value: PropertyValue::Float {
            min: 0.0,
            ui_max: 1.0,
        },
    },
    PropertyDef {
        effect: EffectKind::ViscosityDfsph,
        name: "fluid_viscosity_coefficient",
        value: PropertyValue::Float {
            min: 0.0,
            ui_max: 1.0,
        },
    },
    PropertyDef {
        effect: EffectKind::ViscosityXsph,
        name: "fluid_viscosity_coefficient",
        value: PropertyValue::Float {
            min: 0.0,
            ui_max: 1.0,
        },
    },
    PropertyDef {
        effect: EffectKind::ViscosityXsph,
        name: "boundary_viscosity_coefficient",
        value: PropertyValue::Float {
            min: 0.0,
            ui_max: 1.0,
        },
    },
];

/// Properties of one effect kind, in declaration order.
pub fn properties_for(kind: EffectKind) -> impl Iterator<Item = &'static PropertyDef> {
    PROPERTY_SCHEMA.iter().filter(move |def| def.effect == kind)
}
