//! Steel for anchors and micropiles
//!
//! Two kinds of steel show up in an anchored retaining wall:
//!
//! - **Prestressing strands** in the anchors. Only their area, the elastic
//!   modulus and the allowable stress at lock-off matter here.
//! - **Circular hollow sections (CHS)** used as micropiles under the wall.
//!   These come from a fixed catalogue of commercial tube sizes.
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::materials::steel::builtin_micropile_sections;
//!
//! let catalog = builtin_micropile_sections();
//! let tube = catalog.lookup("CHS 139.7x9.0")?;
//! assert_eq!(tube.area_cm2, 36.95);
//! # Ok::<(), anchor_core::errors::CalcError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{CalcError, CalcResult};

/// Allowable strand stress at lock-off (MPa)
pub const ALLOWABLE_STEEL_STRESS_MPA: f64 = 1440.0;

/// Elastic modulus of prestressing steel (MPa)
pub const DEFAULT_STEEL_MODULUS_MPA: f64 = 210_000.0;

/// Nominal area of one 0.6" strand (mm²)
pub const DEFAULT_STRAND_AREA_MM2: f64 = 140.0;

/// Wedge draw-in at lock-off (mm)
pub const DEFAULT_WEDGE_SLIP_MM: f64 = 6.0;

/// Circular hollow section with tabulated properties.
///
/// Dimensions in mm, properties in cm units as printed in tube catalogues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChsSection {
    /// Outside diameter (mm)
    pub outer_diameter_mm: f64,

    /// Wall thickness (mm)
    pub thickness_mm: f64,

    /// Gross area (cm²)
    pub area_cm2: f64,

    /// Moment of inertia (cm⁴)
    pub inertia_cm4: f64,

    /// Radius of gyration (cm)
    pub radius_of_gyration_cm: f64,

    /// Elastic section modulus (cm³)
    pub section_modulus_cm3: f64,
}

impl ChsSection {
    /// Catalogue designation, e.g. "CHS 139.7x9"
    pub fn designation(&self) -> String {
        format!("CHS {}x{}", self.outer_diameter_mm, self.thickness_mm)
    }

    /// Check whether this section matches the given dimensions (mm)
    fn matches(&self, outer_diameter_mm: f64, thickness_mm: f64) -> bool {
        (self.outer_diameter_mm - outer_diameter_mm).abs() < 1e-6
            && (self.thickness_mm - thickness_mm).abs() < 1e-6
    }
}

impl std::fmt::Display for ChsSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (A={:.2} cm², I={:.0} cm⁴)",
            self.designation(),
            self.area_cm2,
            self.inertia_cm4
        )
    }
}

/// In-memory catalogue of CHS micropile sections, kept in catalogue order.
#[derive(Debug, Clone, Default)]
pub struct ChsCatalog {
    sections: Vec<ChsSection>,
}

impl ChsCatalog {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a section
    pub fn insert(&mut self, section: ChsSection) {
        self.sections.push(section);
    }

    /// Look up a section by designation.
    ///
    /// Accepts "CHS 139.7x9", "CHS 139.7x9.0", "chs139.7X9" or "139.7x9".
    pub fn lookup(&self, designation: &str) -> CalcResult<&ChsSection> {
        let (od, t) = parse_designation(designation)
            .ok_or_else(|| CalcError::section_not_found(designation))?;
        self.sections
            .iter()
            .find(|s| s.matches(od, t))
            .ok_or_else(|| CalcError::section_not_found(designation))
    }

    /// All sections in catalogue order
    pub fn sections(&self) -> &[ChsSection] {
        &self.sections
    }

    /// All sections with the given outside diameter
    pub fn with_diameter(&self, outer_diameter_mm: f64) -> Vec<&ChsSection> {
        self.sections
            .iter()
            .filter(|s| (s.outer_diameter_mm - outer_diameter_mm).abs() < 1e-6)
            .collect()
    }

    /// Get the number of sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Check if the catalogue is empty
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Split a designation into (outside diameter, thickness)
fn parse_designation(designation: &str) -> Option<(f64, f64)> {
    let upper = designation.trim().to_uppercase();
    let dims = upper.strip_prefix("CHS").unwrap_or(&upper).trim();
    let (od, t) = dims.split_once(['X', '×'])?;
    Some((f64::from_str(od.trim()).ok()?, f64::from_str(t.trim()).ok()?))
}

/// Get the built-in micropile tube catalogue
pub fn builtin_micropile_sections() -> ChsCatalog {
    let mut catalog = ChsCatalog::new();

    // (D, t, A, I, i, W)
    let tubes = [
        (88.9, 6.5, 16.83, 144.0, 2.92, 32.31),
        (88.9, 7.5, 19.18, 160.0, 2.89, 36.02),
        (88.9, 9.5, 23.70, 189.0, 2.83, 42.59),
        (101.6, 9.0, 26.18, 283.0, 3.29, 55.74),
        (114.3, 7.0, 23.60, 341.0, 3.80, 59.64),
        (114.3, 9.0, 29.77, 416.0, 3.74, 72.70),
        (127.0, 9.0, 33.36, 584.0, 4.18, 91.83),
        (139.7, 9.0, 36.95, 793.0, 4.63, 113.45),
        (177.8, 9.0, 47.73, 1710.0, 5.98, 191.66),
        (177.8, 10.0, 52.72, 1860.0, 5.94, 209.34),
        (177.8, 11.5, 60.08, 2090.0, 5.89, 234.63),
    ];

    for (d, t, a, i, r, w) in tubes {
        catalog.insert(ChsSection {
            outer_diameter_mm: d,
            thickness_mm: t,
            area_cm2: a,
            inertia_cm4: i,
            radius_of_gyration_cm: r,
            section_modulus_cm3: w,
        });
    }

    catalog
}
