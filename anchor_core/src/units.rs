//! # Unit Types
//!
//! Type-safe wrappers for the SI units used in anchorage design. These are
//! plain `f64` newtypes, so JSON stays clean (just numbers) and there is no
//! runtime overhead.
//!
//! ## Conventions
//!
//! Inputs follow the units engineers type into anchor schedules:
//! - Length: metres (geometry, anchor lengths), millimetres (drill
//!   diameter, wedge slip, strand geometry)
//! - Force: kilonewtons (kN)
//! - Stress: megapascals (steel), kilopascals (= kN/m², soil skin friction)
//! - Area: mm² (strands), cm² (reinforcement bars)
//! - Angles: degrees at the API boundary, radians inside trigonometry
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::units::{Degrees, Meters, Millimeters, Radians};
//!
//! let free_length = Meters(10.0);
//! let free_length_mm: Millimeters = free_length.into();
//! assert_eq!(free_length_mm.0, 10_000.0);
//!
//! let angle: Radians = Degrees(180.0).into();
//! assert!((angle.0 - std::f64::consts::PI).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Length Units
// ============================================================================

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 * 1e-3)
    }
}

// ============================================================================
// Angle Units
// ============================================================================

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f64);

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f64);

impl From<Degrees> for Radians {
    fn from(deg: Degrees) -> Self {
        Radians(deg.0 * std::f64::consts::PI / 180.0)
    }
}

// ============================================================================
// Force Units
// ============================================================================

/// Force in newtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

/// Force in kilonewtons
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KiloNewtons(pub f64);

impl From<Newtons> for KiloNewtons {
    fn from(n: Newtons) -> Self {
        KiloNewtons(n.0 / 1000.0)
    }
}

// ============================================================================
// Stress Units
// ============================================================================

/// Stress in megapascals (N/mm²)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MegaPascals(pub f64);

// ============================================================================
// Area Units
// ============================================================================

/// Area in square millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqMm(pub f64);

/// Area in square centimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SqCm(pub f64);

/// Force carried by a steel area at a given stress: N = σ·A, returned in kN.
pub fn force_from_stress(stress: MegaPascals, area: SqMm) -> KiloNewtons {
    Newtons(stress.0 * area.0).into()
}
