//! # Micropile Bulb Load
//!
//! Load handed down to one micropile of the wall foundation: the vertical
//! components of all anchor forces, spread per metre of wall, plus the
//! self-weight of the wall, both over the tributary width of one pile.
//!
//! ## Assumptions
//!
//! - Anchor vertical component is P·sin|θ| regardless of the angle's sign
//! - Wall of reinforced concrete, γ = 25 kN/m³
//! - H = wall top − excavation bottom; a negative H is carried through
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::calculations::bulb_load::{aggregate, AnchorForce, BulbLoadInput};
//!
//! let forces = [AnchorForce::new(100.0, -30.0), AnchorForce::new(100.0, 30.0)];
//! let input = BulbLoadInput::new(10.0, 0.30, 2.0, 1.5);
//!
//! let result = aggregate(&forces, &input)?;
//! assert!((result.vertical_total_kn - 100.0).abs() < 1e-9);
//! assert!((result.bulb_load_kn - 187.5).abs() < 1e-9);
//! # Ok::<(), anchor_core::errors::CalcError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::equations::anchorage::{bulb_load_kn, vertical_component_kn, wall_self_load_kn_m};
use crate::errors::{CalcError, CalcResult};
use crate::project::{Anchor, ProjectGlobals};

/// Unit weight of reinforced concrete (kN/m³)
pub const CONCRETE_UNIT_WEIGHT_KN_M3: f64 = 25.0;

/// Prestress and inclination of one anchor, the only anchor data the
/// aggregation needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorForce {
    pub prestress_kn: f64,
    pub angle_deg: f64,
}

impl AnchorForce {
    pub fn new(prestress_kn: f64, angle_deg: f64) -> Self {
        AnchorForce {
            prestress_kn,
            angle_deg,
        }
    }
}

impl From<&Anchor> for AnchorForce {
    fn from(anchor: &Anchor) -> Self {
        AnchorForce::new(anchor.prestress_kn, anchor.angle_deg)
    }
}

/// Wall and foundation values for the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulbLoadInput {
    /// Wall height H (m), may be negative
    pub wall_height_m: f64,

    /// Wall thickness t (m)
    pub wall_thickness_m: f64,

    /// Horizontal spacing between anchors (m)
    pub anchor_spacing_m: f64,

    /// Tributary width per micropile A_inf (m)
    pub influence_area_m: f64,

    /// Unit weight of the wall material (kN/m³)
    #[serde(default = "default_unit_weight")]
    pub unit_weight_kn_m3: f64,
}

fn default_unit_weight() -> f64 {
    CONCRETE_UNIT_WEIGHT_KN_M3
}

impl BulbLoadInput {
    /// Create an input for a concrete wall
    pub fn new(wall_height_m: f64, wall_thickness_m: f64, anchor_spacing_m: f64, influence_area_m: f64) -> Self {
        BulbLoadInput {
            wall_height_m,
            wall_thickness_m,
            anchor_spacing_m,
            influence_area_m,
            unit_weight_kn_m3: CONCRETE_UNIT_WEIGHT_KN_M3,
        }
    }

    /// Take the wall values of a project
    pub fn from_globals(globals: &ProjectGlobals) -> Self {
        BulbLoadInput::new(
            globals.wall_height_m(),
            globals.wall_thickness_m,
            globals.anchor_spacing_m,
            globals.influence_area_m,
        )
    }

    /// Validate input parameters.
    ///
    /// Wall height is only required to be finite.
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.anchor_spacing_m.is_finite() && self.anchor_spacing_m > 0.0) {
            return Err(CalcError::invalid_spacing(self.anchor_spacing_m));
        }
        for (field, value) in [
            ("wall_height_m", self.wall_height_m),
            ("wall_thickness_m", self.wall_thickness_m),
            ("influence_area_m", self.influence_area_m),
            ("unit_weight_kn_m3", self.unit_weight_kn_m3),
        ] {
            if !value.is_finite() {
                return Err(CalcError::invalid_input(field, value.to_string(), "Value must be finite"));
            }
        }
        Ok(())
    }
}

/// Vertical component contributed by one anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalComponent {
    /// 1-based anchor number
    pub anchor: usize,
    pub prestress_kn: f64,
    pub angle_deg: f64,
    /// P·sin|θ| (kN)
    pub vertical_kn: f64,
}

/// Result of the bulb load aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulbLoadResult {
    /// Per-anchor vertical components, in input order
    pub components: Vec<VerticalComponent>,

    /// ΣV (kN)
    pub vertical_total_kn: f64,

    /// ΣV / spacing (kN/m)
    pub vertical_per_meter_kn_m: f64,

    /// H·t·γ (kN/m)
    pub wall_self_load_kn_m: f64,

    /// Load on one micropile bulb (kN)
    pub bulb_load_kn: f64,
}

/// Aggregate anchor forces into the load on one micropile bulb.
///
/// # Returns
///
/// * `Ok(BulbLoadResult)` - Aggregated load
/// * `Err(CalcError::InvalidSpacing)` - Spacing is zero, negative or not finite
pub fn aggregate(forces: &[AnchorForce], input: &BulbLoadInput) -> CalcResult<BulbLoadResult> {
    input.validate()?;

    let components: Vec<VerticalComponent> = forces
        .iter()
        .enumerate()
        .map(|(i, force)| VerticalComponent {
            anchor: i + 1,
            prestress_kn: force.prestress_kn,
            angle_deg: force.angle_deg,
            vertical_kn: vertical_component_kn(force.prestress_kn, force.angle_deg),
        })
        .collect();

    let vertical_total: f64 = components.iter().map(|c| c.vertical_kn).sum();
    let vertical_per_meter = vertical_total / input.anchor_spacing_m;
    let self_load = wall_self_load_kn_m(input.wall_height_m, input.wall_thickness_m, input.unit_weight_kn_m3);

    Ok(BulbLoadResult {
        components,
        vertical_total_kn: vertical_total,
        vertical_per_meter_kn_m: vertical_per_meter,
        wall_self_load_kn_m: self_load,
        bulb_load_kn: bulb_load_kn(vertical_per_meter, self_load, input.influence_area_m),
    })
}

/// Aggregate every anchor of a project.
pub fn aggregate_anchors(anchors: &[Anchor], globals: &ProjectGlobals) -> CalcResult<BulbLoadResult> {
    let forces: Vec<AnchorForce> = anchors.iter().map(AnchorForce::from).collect();
    aggregate(&forces, &BulbLoadInput::from_globals(globals))
}
