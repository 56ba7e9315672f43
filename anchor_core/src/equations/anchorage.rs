//! # Ground Anchor Formulas
//!
//! Closed-form expressions for prestressed ground anchors and the load they
//! hand down to the wall foundation. The functions here are deliberately
//! unchecked: they compute, the callers in [`crate::calculations`] validate.
//!
//! ## Notation
//!
//! - `A` = steel area of the tendon (mm²)
//! - `E` = elastic modulus of the strand steel (MPa)
//! - `L_free` = free (unbonded) length (m)
//! - `L_bond` = bond (grout bulb) length (m)
//! - `δ` = wedge slip at lock-off (mm)
//! - `P` = prestress at lock-off (kN)
//! - `d` = drill hole diameter (mm)
//! - `α` = bulb enlargement / bond efficiency coefficient (-)
//! - `τ` = ultimate skin friction (kN/m²)
//! - `FS` = safety factor on bond (-)
//!
//! ## References
//!
//! - EN 1537: Execution of special geotechnical works - Ground anchors
//! - Bustamante & Doix (1985), bulb skin friction method

use crate::materials::steel::ALLOWABLE_STEEL_STRESS_MPA;
use crate::units::{force_from_stress, Degrees, MegaPascals, Meters, Millimeters, Radians, SqMm};

// =============================================================================
// TENDON
// =============================================================================

/// Steel area of a multi-strand tendon
///
/// # Formula
/// A = n × A_strand
///
/// # Example
/// ```rust
/// use anchor_core::equations::anchorage::steel_area_mm2;
///
/// assert_eq!(steel_area_mm2(3, 140.0), 420.0);
/// ```
#[inline]
pub fn steel_area_mm2(strand_count: u32, strand_area_mm2: f64) -> f64 {
    f64::from(strand_count) * strand_area_mm2
}

/// Force lost when the wedges seat at lock-off
///
/// The wedge draw-in δ shortens the free length; the strain loss δ/L_free
/// times the axial stiffness EA is the force lost.
///
/// # Formula
/// ΔP = (E × A / L_free) × δ / 1000    (kN, with L_free and δ in mm)
///
/// # Arguments
/// * `e_mpa` - Strand elastic modulus (MPa)
/// * `area_mm2` - Tendon steel area (mm²)
/// * `free_length_m` - Free length (m), must be non-zero
/// * `wedge_slip_mm` - Wedge slip (mm)
///
/// # Example
/// ```rust
/// use anchor_core::equations::anchorage::slip_loss_kn;
///
/// let loss = slip_loss_kn(210_000.0, 420.0, 10.0, 6.0);
/// assert!((loss - 52.92).abs() < 1e-9);
/// ```
#[inline]
pub fn slip_loss_kn(e_mpa: f64, area_mm2: f64, free_length_m: f64, wedge_slip_mm: f64) -> f64 {
    let free_length: Millimeters = Meters(free_length_m).into();
    (e_mpa * area_mm2 / free_length.0) * wedge_slip_mm / 1000.0
}

/// Force at the anchor head after lock-off, including slip loss
///
/// # Formula
/// P_block = P + ΔP
#[inline]
pub fn block_force_kn(prestress_kn: f64, slip_loss_kn: f64) -> f64 {
    prestress_kn + slip_loss_kn
}

/// Maximum tendon force at the allowable lock-off stress
///
/// # Formula
/// P_max = A × 1440 / 1000    (kN)
///
/// # Example
/// ```rust
/// use anchor_core::equations::anchorage::max_steel_force_kn;
///
/// assert!((max_steel_force_kn(420.0) - 604.8).abs() < 1e-9);
/// ```
#[inline]
pub fn max_steel_force_kn(area_mm2: f64) -> f64 {
    force_from_stress(MegaPascals(ALLOWABLE_STEEL_STRESS_MPA), SqMm(area_mm2)).0
}

// =============================================================================
// GROUT BULB
// =============================================================================

/// Factored pull-out resistance of the grout bulb
///
/// ```text
///    ←──────── L_bond ────────→
///   ╔══════════════════════════╗
///   ║  τ acting on π·d·α·L     ║  d
///   ╚══════════════════════════╝
/// ```
///
/// # Formula
/// R = L_bond × π × (d / 1000) × α × τ / FS
///
/// # Example
/// ```rust
/// use anchor_core::equations::anchorage::bond_resistance_kn;
///
/// let r = bond_resistance_kn(10.0, 150.0, 1.4, 150.0, 1.8);
/// assert!((r - 549.78).abs() < 0.01);
/// ```
#[inline]
pub fn bond_resistance_kn(
    bond_length_m: f64,
    drill_diameter_mm: f64,
    alpha: f64,
    shear_stress_kpa: f64,
    safety_factor: f64,
) -> f64 {
    let drill: Meters = Millimeters(drill_diameter_mm).into();
    bond_length_m * std::f64::consts::PI * drill.0 * alpha * shear_stress_kpa / safety_factor
}

/// Bond length needed to carry a service load
///
/// Inverse of [`bond_resistance_kn`] solved for the length.
///
/// # Formula
/// L_min = N_sk × FS / (π × d × α × τ)
#[inline]
pub fn minimum_bond_length_m(
    service_load_kn: f64,
    drill_diameter_mm: f64,
    alpha: f64,
    shear_stress_kpa: f64,
    safety_factor: f64,
) -> f64 {
    let drill: Meters = Millimeters(drill_diameter_mm).into();
    service_load_kn * safety_factor / (std::f64::consts::PI * drill.0 * alpha * shear_stress_kpa)
}

// =============================================================================
// LOAD ON THE WALL FOUNDATION
// =============================================================================

/// Vertical component of an anchor force
///
/// Uses the magnitude of the inclination: an anchor pulls the wall down
/// by P·sin|θ| whichever way it is drawn.
///
/// # Formula
/// V = P × sin(|θ|)
#[inline]
pub fn vertical_component_kn(prestress_kn: f64, angle_deg: f64) -> f64 {
    let theta: Radians = Degrees(angle_deg.abs()).into();
    prestress_kn * theta.0.sin()
}

/// Self-weight of a concrete wall per metre run
///
/// # Formula
/// g = H × t × γ    (kN/m)
#[inline]
pub fn wall_self_load_kn_m(wall_height_m: f64, wall_thickness_m: f64, unit_weight_kn_m3: f64) -> f64 {
    wall_height_m * wall_thickness_m * unit_weight_kn_m3
}

/// Load transmitted to one micropile bulb
///
/// # Formula
/// C = V/m × A_inf + g × A_inf
#[inline]
pub fn bulb_load_kn(vertical_per_meter_kn_m: f64, wall_self_load_kn_m: f64, influence_area_m: f64) -> f64 {
    vertical_per_meter_kn_m * influence_area_m + wall_self_load_kn_m * influence_area_m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slip_loss_reference_anchor() {
        // 3 strands of 140 mm², L_free = 10 m, δ = 6 mm
        // (210000 × 420 / 10000) × 6 / 1000 = 52.92 kN
        let loss = slip_loss_kn(210_000.0, 420.0, 10.0, 6.0);
        assert!((loss - 52.92).abs() < 1e-9);
    }

    #[test]
    fn test_bond_resistance_reference_anchor() {
        // 10 × π × 0.15 × 1.4 × 150 / 1.8
        let expected = 10.0 * std::f64::consts::PI * 0.15 * 1.4 * 150.0 / 1.8;
        assert!((bond_resistance_kn(10.0, 150.0, 1.4, 150.0, 1.8) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_minimum_bond_length_inverts_resistance() {
        let l_min = minimum_bond_length_m(1000.0, 150.0, 1.2, 300.0, 2.0);
        let r = bond_resistance_kn(l_min, 150.0, 1.2, 300.0, 2.0);
        assert!((r - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertical_component_ignores_sign() {
        let down = vertical_component_kn(500.0, -35.0);
        let up = vertical_component_kn(500.0, 35.0);
        assert_eq!(down, up);
        assert!((up - 500.0 * 35f64.to_radians().sin()).abs() < 1e-12);
        assert!((vertical_component_kn(500.0, 90.0) - 500.0).abs() < 1e-12);
    }

    #[test]
    fn test_wall_and_bulb_load() {
        let g = wall_self_load_kn_m(10.0, 0.30, 25.0);
        assert!((g - 75.0).abs() < 1e-12);
        assert!((bulb_load_kn(100.0, g, 1.5) - 262.5).abs() < 1e-12);
    }
}
