//! # Anchor Safety Checks
//!
//! Two checks per anchor, both at lock-off:
//!
//! 1. **Block check** - the head force including wedge-slip loss must stay
//!    below the tendon capacity at 1440 MPa.
//! 2. **Bond check** - the factored pull-out resistance of the grout bulb
//!    must exceed that head force.
//!
//! Both comparisons are strict: equality fails.
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::calculations::safety::{evaluate, CheckStatus};
//! use anchor_core::project::Anchor;
//!
//! let anchor = Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0);
//! let result = evaluate(&anchor, 210_000.0, 140.0, 6.0)?;
//!
//! assert_eq!(result.steel_area_mm2, 420.0);
//! assert_eq!(result.block_check, CheckStatus::Ok);
//! assert_eq!(result.bond_check, CheckStatus::Ok);
//! # Ok::<(), anchor_core::errors::CalcError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::equations::anchorage::{
    block_force_kn, bond_resistance_kn, max_steel_force_kn, slip_loss_kn, steel_area_mm2,
};
use crate::errors::{CalcError, CalcResult};
use crate::project::{Anchor, ProjectGlobals};

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "FAIL")]
    Fail,
}

impl CheckStatus {
    fn from_pass(pass: bool) -> Self {
        if pass {
            CheckStatus::Ok
        } else {
            CheckStatus::Fail
        }
    }

    /// Check if this is a pass
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckStatus::Ok)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Ok => write!(f, "OK"),
            CheckStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Results of the safety checks for one anchor.
///
/// ## JSON Example
///
/// ```json
/// {
///   "steel_area_mm2": 420.0,
///   "slip_loss_kn": 52.92,
///   "block_force_kn": 152.92,
///   "max_steel_force_kn": 604.8,
///   "block_check": "OK",
///   "bond_resistance_kn": 549.78,
///   "bond_check": "OK"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyResult {
    /// Tendon steel area (mm²)
    pub steel_area_mm2: f64,

    /// Force lost to wedge slip (kN)
    pub slip_loss_kn: f64,

    /// Head force after lock-off, P + ΔP (kN)
    pub block_force_kn: f64,

    /// Tendon capacity at the allowable stress (kN)
    pub max_steel_force_kn: f64,

    /// block_force < max_steel_force
    pub block_check: CheckStatus,

    /// Factored bulb resistance (kN)
    pub bond_resistance_kn: f64,

    /// bond_resistance > block_force
    pub bond_check: CheckStatus,
}

impl SafetyResult {
    /// Check if both checks pass
    pub fn passes(&self) -> bool {
        self.block_check.is_ok() && self.bond_check.is_ok()
    }

    /// Utilisation of the tendon, P_block / P_max
    pub fn steel_utilization(&self) -> f64 {
        self.block_force_kn / self.max_steel_force_kn
    }

    /// Utilisation of the bulb, P_block / R_bond
    pub fn bond_utilization(&self) -> f64 {
        self.block_force_kn / self.bond_resistance_kn
    }
}

/// Evaluate the safety checks of one anchor.
///
/// # Arguments
///
/// * `anchor` - Anchor parameters
/// * `e_mpa` - Strand elastic modulus (MPa)
/// * `strand_area_default_mm2` - Strand area used when the anchor has none
/// * `wedge_slip_mm` - Wedge slip at lock-off (mm)
///
/// # Returns
///
/// * `Ok(SafetyResult)` - Check results
/// * `Err(CalcError::InvalidGeometry)` - Free length is zero (slip-loss divisor)
/// * `Err(CalcError::InvalidSafetyFactor)` - FS is zero or negative
/// * `Err(CalcError::InvalidInput)` - Any other out-of-range input
pub fn evaluate(
    anchor: &Anchor,
    e_mpa: f64,
    strand_area_default_mm2: f64,
    wedge_slip_mm: f64,
) -> CalcResult<SafetyResult> {
    anchor.validate()?;
    for (field, value) in [("e_mpa", e_mpa), ("strand_area_default_mm2", strand_area_default_mm2)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(CalcError::invalid_input(field, value.to_string(), "Value must be positive"));
        }
    }
    if !(wedge_slip_mm.is_finite() && wedge_slip_mm >= 0.0) {
        return Err(CalcError::invalid_input(
            "wedge_slip_mm",
            wedge_slip_mm.to_string(),
            "Wedge slip cannot be negative",
        ));
    }

    let area = steel_area_mm2(anchor.strand_count, anchor.effective_strand_area_mm2(strand_area_default_mm2));
    let slip = slip_loss_kn(e_mpa, area, anchor.free_length_m, wedge_slip_mm);
    let block_force = block_force_kn(anchor.prestress_kn, slip);
    let max_force = max_steel_force_kn(area);

    let bond_resistance = bond_resistance_kn(
        anchor.bond_length_m,
        anchor.drill_diameter_mm,
        anchor.alpha,
        anchor.shear_stress_kpa,
        anchor.safety_factor,
    );

    Ok(SafetyResult {
        steel_area_mm2: area,
        slip_loss_kn: slip,
        block_force_kn: block_force,
        max_steel_force_kn: max_force,
        block_check: CheckStatus::from_pass(block_force < max_force),
        bond_resistance_kn: bond_resistance,
        bond_check: CheckStatus::from_pass(bond_resistance > block_force),
    })
}

/// Evaluate one anchor with the material values of a project.
pub fn evaluate_with_globals(anchor: &Anchor, globals: &ProjectGlobals) -> CalcResult<SafetyResult> {
    evaluate(anchor, globals.steel_modulus_mpa, globals.strand_area_mm2, globals.wedge_slip_mm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_anchor() -> Anchor {
        Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0)
            .with_prestress(100.0)
            .with_strands(3, None)
            .with_bond(150.0, 1.4, 150.0, 1.8)
    }

    #[test]
    fn test_reference_anchor() {
        let result = evaluate(&reference_anchor(), 210_000.0, 140.0, 6.0).unwrap();

        assert_eq!(result.steel_area_mm2, 420.0);
        // (210000 × 420 / 10000) × 6 / 1000
        assert!((result.slip_loss_kn - 52.92).abs() < 1e-9);
        assert!((result.block_force_kn - 152.92).abs() < 1e-9);
        assert!((result.max_steel_force_kn - 604.8).abs() < 1e-9);
        assert_eq!(result.block_check, CheckStatus::Ok);

        // 10 × π × 0.15 × 1.4 × 150 / 1.8 ≈ 549.78
        assert!((result.bond_resistance_kn - 549.78).abs() < 0.01);
        assert_eq!(result.bond_check, CheckStatus::Ok);
        assert!(result.passes());
    }

    #[test]
    fn test_zero_free_length_is_invalid_geometry() {
        let mut anchor = reference_anchor();
        anchor.free_length_m = 0.0;
        let err = evaluate(&anchor, 210_000.0, 140.0, 6.0).unwrap_err();
        assert!(matches!(err, CalcError::InvalidGeometry { ref field, .. } if field == "free_length_m"));
    }

    #[test]
    fn test_zero_safety_factor() {
        let mut anchor = reference_anchor();
        anchor.safety_factor = 0.0;
        assert!(matches!(
            evaluate(&anchor, 210_000.0, 140.0, 6.0),
            Err(CalcError::InvalidSafetyFactor { .. })
        ));
    }

    #[test]
    fn test_block_check_boundary_fails() {
        // No slip, prestress exactly at capacity: 420 × 1440 / 1000 = 604.8
        let anchor = reference_anchor().with_prestress(604.8);
        let result = evaluate(&anchor, 210_000.0, 140.0, 0.0).unwrap();
        assert_eq!(result.block_force_kn, result.max_steel_force_kn);
        assert_eq!(result.block_check, CheckStatus::Fail);
    }

    #[test]
    fn test_bond_check_boundary_fails() {
        // Choose prestress so that P_block equals R_bond exactly (δ = 0)
        let baseline = evaluate(&reference_anchor(), 210_000.0, 140.0, 0.0).unwrap();
        let anchor = reference_anchor().with_prestress(baseline.bond_resistance_kn);
        let result = evaluate(&anchor, 210_000.0, 140.0, 0.0).unwrap();
        assert_eq!(result.bond_resistance_kn, result.block_force_kn);
        assert_eq!(result.bond_check, CheckStatus::Fail);
    }

    #[test]
    fn test_per_anchor_strand_area() {
        let anchor = reference_anchor().with_strands(4, Some(150.0));
        let result = evaluate(&anchor, 210_000.0, 140.0, 6.0).unwrap();
        assert_eq!(result.steel_area_mm2, 600.0);
    }

    #[test]
    fn test_overstressed_tendon_fails() {
        let anchor = reference_anchor().with_prestress(700.0);
        let result = evaluate(&anchor, 210_000.0, 140.0, 6.0).unwrap();
        assert_eq!(result.block_check, CheckStatus::Fail);
        assert_eq!(result.bond_check, CheckStatus::Fail);
        assert!(result.steel_utilization() > 1.0);
    }

    #[test]
    fn test_globals_wrapper_matches() {
        let globals = ProjectGlobals::default();
        let a = evaluate_with_globals(&reference_anchor(), &globals).unwrap();
        let b = evaluate(&reference_anchor(), 210_000.0, 140.0, 6.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_check_status_serialization() {
        assert_eq!(serde_json::to_string(&CheckStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&CheckStatus::Fail).unwrap(), "\"FAIL\"");
    }
}
