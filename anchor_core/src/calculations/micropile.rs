//! # Micropile Verification
//!
//! Buckling check of a steel tube (CHS) micropile under axial compression,
//! with a sacrificial corrosion thickness, and the bond length a pile or
//! anchor bulb needs to carry its service load.
//!
//! ## Method (EN 1993-1-1 §6.3.1, curve a)
//!
//! ```text
//! A   = π/4 · ((D − 2c)² − (D − 2t)²)        corroded area
//! I   = π/64 · (D⁴ − (D − 2(t − c))⁴)        corroded inertia
//! λ̄   = L_cr / (i · π · √(E / f_yd))
//! φ   = 0.5 · (1 + α(λ̄ − 0.2) + λ̄²)         α = 0.21
//! χ   = 1 / (φ + √(φ² − λ̄²)) ≤ 1.0
//! N_b,Rd = χ · N_Rd
//! ```
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::calculations::micropile::{check_micropile, MicropileInput};
//!
//! let input = MicropileInput::default();
//! let result = check_micropile(&input)?;
//! assert!(result.chi > 0.0 && result.chi <= 1.0);
//! # Ok::<(), anchor_core::errors::CalcError>(())
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::calculations::safety::CheckStatus;
use crate::equations::anchorage::minimum_bond_length_m;
use crate::errors::{CalcError, CalcResult};
use crate::materials::steel::ChsSection;

/// Imperfection factor for hot-finished hollow sections (buckling curve a)
pub const IMPERFECTION_FACTOR: f64 = 0.21;

/// Joint efficiency of an external sleeve
pub const SLEEVE_JOINT_FACTOR: f64 = 0.75;

/// Joint efficiency of a threaded connection
pub const THREADED_JOINT_FACTOR: f64 = 0.4;

/// Input parameters for a micropile tube.
///
/// ## JSON Example
///
/// ```json
/// {
///   "outer_diameter_mm": 139.7,
///   "thickness_mm": 9.0,
///   "sacrificial_mm": 1.0,
///   "critical_length_m": 6.0,
///   "design_load_kn": 1200.0,
///   "gamma_m0": 1.0,
///   "fyk_mpa": 560.0,
///   "e_gpa": 210.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicropileInput {
    /// Tube outer diameter D (mm)
    pub outer_diameter_mm: f64,

    /// Wall thickness t (mm)
    pub thickness_mm: f64,

    /// Thickness lost to corrosion c (mm)
    pub sacrificial_mm: f64,

    /// Buckling length L_cr (m)
    pub critical_length_m: f64,

    /// Design axial load N_Ed (kN)
    pub design_load_kn: f64,

    /// Partial factor γ_M0
    pub gamma_m0: f64,

    /// Characteristic yield strength (MPa)
    pub fyk_mpa: f64,

    /// Elastic modulus (GPa)
    pub e_gpa: f64,
}

impl Default for MicropileInput {
    fn default() -> Self {
        MicropileInput {
            outer_diameter_mm: 139.7,
            thickness_mm: 9.0,
            sacrificial_mm: 1.0,
            critical_length_m: 6.0,
            design_load_kn: 1200.0,
            gamma_m0: 1.0,
            fyk_mpa: 560.0,
            e_gpa: 210.0,
        }
    }
}

impl MicropileInput {
    /// Start from a catalogue tube, keeping the other defaults
    pub fn from_section(section: &ChsSection) -> Self {
        MicropileInput {
            outer_diameter_mm: section.outer_diameter_mm,
            thickness_mm: section.thickness_mm,
            ..MicropileInput::default()
        }
    }

    /// Design yield strength f_yd = f_yk / γ_M0 (MPa)
    pub fn fyd_mpa(&self) -> f64 {
        self.fyk_mpa / self.gamma_m0
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in [
            ("outer_diameter_mm", self.outer_diameter_mm),
            ("thickness_mm", self.thickness_mm),
            ("critical_length_m", self.critical_length_m),
            ("gamma_m0", self.gamma_m0),
            ("fyk_mpa", self.fyk_mpa),
            ("e_gpa", self.e_gpa),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Value must be positive"));
            }
        }
        if !(self.sacrificial_mm.is_finite() && self.sacrificial_mm >= 0.0) {
            return Err(CalcError::invalid_input(
                "sacrificial_mm",
                self.sacrificial_mm.to_string(),
                "Sacrificial thickness cannot be negative",
            ));
        }
        if self.sacrificial_mm >= self.thickness_mm {
            return Err(CalcError::invalid_input(
                "sacrificial_mm",
                self.sacrificial_mm.to_string(),
                "Sacrificial thickness must be less than the wall thickness",
            ));
        }
        if 2.0 * self.thickness_mm >= self.outer_diameter_mm {
            return Err(CalcError::invalid_input(
                "thickness_mm",
                self.thickness_mm.to_string(),
                "Wall thickness must be less than half the diameter",
            ));
        }
        if !(self.design_load_kn.is_finite() && self.design_load_kn >= 0.0) {
            return Err(CalcError::invalid_input(
                "design_load_kn",
                self.design_load_kn.to_string(),
                "Load cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Results of a micropile check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicropileResult {
    /// Corroded area (cm²)
    pub area_cm2: f64,

    /// Corroded inertia (cm⁴)
    pub inertia_cm4: f64,

    /// Radius of gyration (m)
    pub radius_of_gyration_m: f64,

    /// Bending resistance M_Rd (kN·m)
    pub mrd_knm: f64,

    /// Shear resistance V_Rd (kN)
    pub vrd_kn: f64,

    /// Axial resistance N_Rd (kN)
    pub nrd_kn: f64,

    /// Relative slenderness λ̄
    pub slenderness: f64,

    pub phi: f64,

    /// Reduction factor χ
    pub chi: f64,

    /// Buckling resistance N_b,Rd (kN)
    pub nbrd_kn: f64,

    /// Capacity of an external sleeve joint (kN)
    pub sleeve_joint_kn: f64,

    /// Capacity of a threaded joint (kN)
    pub threaded_joint_kn: f64,

    /// N_b,Rd ≥ N_Ed
    pub buckling_check: CheckStatus,
}

impl MicropileResult {
    /// N_Ed / N_b,Rd for a given design load
    pub fn utilization(&self, design_load_kn: f64) -> f64 {
        design_load_kn / self.nbrd_kn
    }
}

/// Check a micropile tube for buckling under axial load.
pub fn check_micropile(input: &MicropileInput) -> CalcResult<MicropileResult> {
    input.validate()?;

    let d = input.outer_diameter_mm;
    let t = input.thickness_mm;
    let c = input.sacrificial_mm;
    let fyd = input.fyd_mpa();

    // mm² → cm², mm⁴ → cm⁴
    let area_cm2 = (PI / 4.0) * ((d - 2.0 * c).powi(2) - (d - 2.0 * t).powi(2)) * 1e-2;
    let inertia_cm4 = (PI / 64.0) * (d.powi(4) - (d - 2.0 * (t - c)).powi(4)) * 1e-4;

    let mrd_knm = 2.0 * inertia_cm4 * 1e-8 * fyd * 1e3 / (d * 1e-3);
    let vrd_kn = (2.0 * area_cm2 * 1e-4 / PI) * input.fyk_mpa * 1e3 / 3f64.sqrt();
    let nrd_kn = area_cm2 * 1e-4 * fyd * 1e3;

    let radius_of_gyration_m = (inertia_cm4 / area_cm2).sqrt() * 1e-2;
    let slenderness = input.critical_length_m / (radius_of_gyration_m * PI * (input.e_gpa * 1e3 / fyd).sqrt());

    let phi = 0.5 * (1.0 + IMPERFECTION_FACTOR * (slenderness - 0.2) + slenderness.powi(2));
    let chi = (1.0 / (phi + (phi.powi(2) - slenderness.powi(2)).sqrt())).min(1.0);
    let nbrd_kn = nrd_kn * chi;

    Ok(MicropileResult {
        area_cm2,
        inertia_cm4,
        radius_of_gyration_m,
        mrd_knm,
        vrd_kn,
        nrd_kn,
        slenderness,
        phi,
        chi,
        nbrd_kn,
        sleeve_joint_kn: SLEEVE_JOINT_FACTOR * nrd_kn,
        threaded_joint_kn: THREADED_JOINT_FACTOR * nrd_kn,
        buckling_check: if nbrd_kn >= input.design_load_kn {
            CheckStatus::Ok
        } else {
            CheckStatus::Fail
        },
    })
}

/// Input for the minimum bond length of a bulb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondLengthInput {
    /// Service load N_sk (kN)
    pub service_load_kn: f64,

    /// Drill hole diameter (mm)
    pub drill_diameter_mm: f64,

    /// Bulb enlargement coefficient α
    pub alpha: f64,

    /// Skin friction τ (kN/m²)
    pub skin_friction_kpa: f64,

    /// Safety factor
    pub safety_factor: f64,
}

impl BondLengthInput {
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.service_load_kn.is_finite() && self.service_load_kn >= 0.0) {
            return Err(CalcError::invalid_input(
                "service_load_kn",
                self.service_load_kn.to_string(),
                "Load cannot be negative",
            ));
        }
        for (field, value) in [
            ("drill_diameter_mm", self.drill_diameter_mm),
            ("alpha", self.alpha),
            ("skin_friction_kpa", self.skin_friction_kpa),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Value must be positive"));
            }
        }
        if !(self.safety_factor.is_finite() && self.safety_factor > 0.0) {
            return Err(CalcError::invalid_safety_factor(self.safety_factor));
        }
        Ok(())
    }
}

/// Minimum bond length L_min = N_sk·FS / (π·d·α·τ) in metres.
pub fn minimum_bond_length(input: &BondLengthInput) -> CalcResult<f64> {
    input.validate()?;
    Ok(minimum_bond_length_m(
        input.service_load_kn,
        input.drill_diameter_mm,
        input.alpha,
        input.skin_friction_kpa,
        input.safety_factor,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::steel::builtin_micropile_sections;

    #[test]
    fn test_default_tube() {
        let result = check_micropile(&MicropileInput::default()).unwrap();

        // (π/4)(137.7² − 121.7²) / 100
        let area = (PI / 4.0) * (137.7f64.powi(2) - 121.7f64.powi(2)) * 1e-2;
        assert!((result.area_cm2 - area).abs() < 1e-9);
        assert!((result.area_cm2 - 32.60).abs() < 0.01);

        // N_Rd = A × f_yd = 32.60 cm² × 560 MPa ≈ 1825.4 kN
        assert!((result.nrd_kn - area * 56.0).abs() < 1e-6);
        assert!(result.chi > 0.0 && result.chi <= 1.0);
        assert!((result.nbrd_kn - result.nrd_kn * result.chi).abs() < 1e-9);
        assert!((result.sleeve_joint_kn - 0.75 * result.nrd_kn).abs() < 1e-9);
        assert!((result.threaded_joint_kn - 0.4 * result.nrd_kn).abs() < 1e-9);
    }

    #[test]
    fn test_very_short_pile_is_not_reduced() {
        let input = MicropileInput {
            critical_length_m: 0.01,
            ..MicropileInput::default()
        };
        let result = check_micropile(&input).unwrap();
        assert_eq!(result.chi, 1.0);
        assert_eq!(result.nbrd_kn, result.nrd_kn);
    }

    #[test]
    fn test_longer_pile_is_weaker() {
        let short = check_micropile(&MicropileInput::default()).unwrap();
        let long = check_micropile(&MicropileInput {
            critical_length_m: 12.0,
            ..MicropileInput::default()
        })
        .unwrap();
        assert!(long.nbrd_kn < short.nbrd_kn);
    }

    #[test]
    fn test_check_status() {
        let light = MicropileInput {
            design_load_kn: 100.0,
            ..MicropileInput::default()
        };
        assert_eq!(check_micropile(&light).unwrap().buckling_check, CheckStatus::Ok);

        let heavy = MicropileInput {
            design_load_kn: 5000.0,
            ..MicropileInput::default()
        };
        assert_eq!(check_micropile(&heavy).unwrap().buckling_check, CheckStatus::Fail);
    }

    #[test]
    fn test_from_catalogue() {
        let catalog = builtin_micropile_sections();
        let section = catalog.lookup("CHS 88.9x6.5").unwrap();
        let input = MicropileInput::from_section(section);
        assert_eq!(input.outer_diameter_mm, 88.9);
        assert!(check_micropile(&input).is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        let corroded_through = MicropileInput {
            sacrificial_mm: 9.0,
            ..MicropileInput::default()
        };
        assert!(check_micropile(&corroded_through).is_err());

        let no_gamma = MicropileInput {
            gamma_m0: 0.0,
            ..MicropileInput::default()
        };
        assert!(matches!(check_micropile(&no_gamma), Err(CalcError::InvalidInput { .. })));
    }

    #[test]
    fn test_minimum_bond_length() {
        let input = BondLengthInput {
            service_load_kn: 500.0,
            drill_diameter_mm: 150.0,
            alpha: 1.4,
            skin_friction_kpa: 150.0,
            safety_factor: 1.8,
        };
        let l = minimum_bond_length(&input).unwrap();
        // 500 × 1.8 / (π × 0.15 × 1.4 × 150)
        assert!((l - 900.0 / (PI * 0.15 * 1.4 * 150.0)).abs() < 1e-9);

        let bad = BondLengthInput {
            safety_factor: 0.0,
            ..input
        };
        assert!(matches!(minimum_bond_length(&bad), Err(CalcError::InvalidSafetyFactor { .. })));
    }
}
