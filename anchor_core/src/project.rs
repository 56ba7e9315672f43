//! # Project Data Structures
//!
//! The input side of the engine: the anchors of one wall section and the
//! project-wide values every calculation shares.
//!
//! ## Structure
//!
//! ```text
//! Dataset
//! ├── globals: ProjectGlobals (wall, excavation, stratigraphy, borehole, steel defaults)
//! └── anchors: Vec<Anchor>    (one per anchor, in drawing order)
//! ```
//!
//! Nothing here is global state. Calculations receive `&ProjectGlobals`
//! explicitly, so two sections can be evaluated side by side.
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::project::{Anchor, Dataset, ProjectGlobals};
//!
//! let mut dataset = Dataset::new(ProjectGlobals::default());
//! dataset.add_anchor(Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0));
//!
//! let json = serde_json::to_string_pretty(&dataset).unwrap();
//! assert!(json.contains("\"angle_deg\": -25.0"));
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::materials::steel::{DEFAULT_STEEL_MODULUS_MPA, DEFAULT_STRAND_AREA_MM2, DEFAULT_WEDGE_SLIP_MM};

/// Default prestress at lock-off (kN)
pub const DEFAULT_PRESTRESS_KN: f64 = 100.0;
/// Default number of strands
pub const DEFAULT_STRAND_COUNT: u32 = 3;
/// Default drill hole diameter (mm)
pub const DEFAULT_DRILL_DIAMETER_MM: f64 = 150.0;
/// Default bond efficiency coefficient α
pub const DEFAULT_ALPHA: f64 = 1.4;
/// Default skin friction τ (kN/m²)
pub const DEFAULT_SHEAR_STRESS_KPA: f64 = 150.0;
/// Default safety factor on bond
pub const DEFAULT_SAFETY_FACTOR: f64 = 1.8;

/// A point in the section plane (m)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// One ground anchor.
///
/// ## JSON Example
///
/// ```json
/// {
///   "head": { "x": 0.0, "y": 8.0 },
///   "angle_deg": -25.0,
///   "free_length_m": 10.0,
///   "bond_length_m": 10.0,
///   "prestress_kn": 100.0,
///   "strand_count": 3,
///   "strand_area_mm2": null,
///   "drill_diameter_mm": 150.0,
///   "alpha": 1.4,
///   "shear_stress_kpa": 150.0,
///   "safety_factor": 1.8
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Anchor head (P1) in section coordinates (m)
    pub head: Point,

    /// Inclination from horizontal in degrees; sign is kept as entered
    pub angle_deg: f64,

    /// Free (unbonded) length (m)
    pub free_length_m: f64,

    /// Bond (grout bulb) length (m)
    pub bond_length_m: f64,

    /// Prestress at lock-off (kN)
    pub prestress_kn: f64,

    /// Number of strands in the tendon
    pub strand_count: u32,

    /// Area of one strand (mm²); `None` uses the project default
    #[serde(default)]
    pub strand_area_mm2: Option<f64>,

    /// Drill hole diameter (mm)
    pub drill_diameter_mm: f64,

    /// Bond efficiency coefficient α (-)
    pub alpha: f64,

    /// Ultimate skin friction τ (kN/m²)
    pub shear_stress_kpa: f64,

    /// Safety factor on bond resistance
    pub safety_factor: f64,
}

impl Anchor {
    /// Create an anchor from its geometry, with default tendon and bond values.
    pub fn new(x1: f64, y1: f64, angle_deg: f64, free_length_m: f64, bond_length_m: f64) -> Self {
        Anchor {
            head: Point::new(x1, y1),
            angle_deg,
            free_length_m,
            bond_length_m,
            prestress_kn: DEFAULT_PRESTRESS_KN,
            strand_count: DEFAULT_STRAND_COUNT,
            strand_area_mm2: None,
            drill_diameter_mm: DEFAULT_DRILL_DIAMETER_MM,
            alpha: DEFAULT_ALPHA,
            shear_stress_kpa: DEFAULT_SHEAR_STRESS_KPA,
            safety_factor: DEFAULT_SAFETY_FACTOR,
        }
    }

    /// Set the prestress (builder style)
    pub fn with_prestress(mut self, prestress_kn: f64) -> Self {
        self.prestress_kn = prestress_kn;
        self
    }

    /// Set the tendon (builder style)
    pub fn with_strands(mut self, strand_count: u32, strand_area_mm2: Option<f64>) -> Self {
        self.strand_count = strand_count;
        self.strand_area_mm2 = strand_area_mm2;
        self
    }

    /// Set the bond parameters (builder style)
    pub fn with_bond(mut self, drill_diameter_mm: f64, alpha: f64, shear_stress_kpa: f64, safety_factor: f64) -> Self {
        self.drill_diameter_mm = drill_diameter_mm;
        self.alpha = alpha;
        self.shear_stress_kpa = shear_stress_kpa;
        self.safety_factor = safety_factor;
        self
    }

    /// Strand area to use: per-anchor if given, otherwise the project default
    pub fn effective_strand_area_mm2(&self, default_mm2: f64) -> f64 {
        self.strand_area_mm2.unwrap_or(default_mm2)
    }

    /// Validate input parameters.
    ///
    /// Zero free length and non-positive safety factors get their own error
    /// kinds because they are the divisors of the safety formulas.
    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in [
            ("head.x", self.head.x),
            ("head.y", self.head.y),
            ("angle_deg", self.angle_deg),
            ("prestress_kn", self.prestress_kn),
        ] {
            if !value.is_finite() {
                return Err(CalcError::invalid_input(field, value.to_string(), "Value must be finite"));
            }
        }
        if !(self.free_length_m.is_finite() && self.free_length_m > 0.0) {
            return Err(CalcError::invalid_geometry(
                "free_length_m",
                self.free_length_m,
                "Free length must be greater than zero",
            ));
        }
        if !(self.bond_length_m.is_finite() && self.bond_length_m >= 0.0) {
            return Err(CalcError::invalid_geometry(
                "bond_length_m",
                self.bond_length_m,
                "Bond length cannot be negative",
            ));
        }
        if self.prestress_kn < 0.0 {
            return Err(CalcError::invalid_input(
                "prestress_kn",
                self.prestress_kn.to_string(),
                "Prestress cannot be negative",
            ));
        }
        if self.strand_count == 0 {
            return Err(CalcError::invalid_input("strand_count", "0", "At least one strand is required"));
        }
        if let Some(area) = self.strand_area_mm2 {
            if !(area.is_finite() && area > 0.0) {
                return Err(CalcError::invalid_input(
                    "strand_area_mm2",
                    area.to_string(),
                    "Strand area must be positive",
                ));
            }
        }
        for (field, value) in [
            ("drill_diameter_mm", self.drill_diameter_mm),
            ("alpha", self.alpha),
            ("shear_stress_kpa", self.shear_stress_kpa),
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

/// One soil layer boundary drawn behind the wall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratumLayer {
    /// Layer name shown on the drawing
    pub name: String,
    /// Elevation of the layer top (m)
    pub elevation_m: f64,
    /// Horizontal extent from the wall (m)
    pub extent_m: f64,
}

/// Borehole used for the soil parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borehole {
    pub id: String,
    /// Horizontal position (m)
    pub x_m: f64,
}

impl Default for Borehole {
    fn default() -> Self {
        Borehole {
            id: "S1".to_string(),
            x_m: 1.0,
        }
    }
}

/// Project-wide values shared by every anchor of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectGlobals {
    /// Section name (e.g. "Section A-A")
    pub section_name: String,

    /// Excavation bottom elevation (m)
    pub excavation_bottom_m: f64,

    /// Wall top elevation (m)
    pub wall_top_m: f64,

    /// Length of excavation drawn in front of the wall (m)
    pub excavation_extent_m: f64,

    /// Right-hand limit line, e.g. a neighbouring property (m)
    pub boundary_x_m: f64,

    /// Soil layers behind the wall, in drawing order
    pub stratigraphy: Vec<StratumLayer>,

    /// Reference borehole
    pub borehole: Borehole,

    /// Wall thickness (m)
    pub wall_thickness_m: f64,

    /// Horizontal spacing between anchors along the wall (m)
    pub anchor_spacing_m: f64,

    /// Tributary width per micropile (m)
    pub influence_area_m: f64,

    /// Strand elastic modulus E (MPa)
    pub steel_modulus_mpa: f64,

    /// Wedge slip δ (mm)
    pub wedge_slip_mm: f64,

    /// Default area per strand (mm²)
    pub strand_area_mm2: f64,
}

impl Default for ProjectGlobals {
    fn default() -> Self {
        ProjectGlobals {
            section_name: "Section 1".to_string(),
            excavation_bottom_m: 0.0,
            wall_top_m: 5.0,
            excavation_extent_m: 5.0,
            boundary_x_m: 20.0,
            stratigraphy: Vec::new(),
            borehole: Borehole::default(),
            wall_thickness_m: 0.30,
            anchor_spacing_m: 3.0,
            influence_area_m: 1.5,
            steel_modulus_mpa: DEFAULT_STEEL_MODULUS_MPA,
            wedge_slip_mm: DEFAULT_WEDGE_SLIP_MM,
            strand_area_mm2: DEFAULT_STRAND_AREA_MM2,
        }
    }
}

impl ProjectGlobals {
    /// Wall height H = wall top − excavation bottom.
    ///
    /// Negative when the elevations are swapped; callers decide whether to warn.
    pub fn wall_height_m(&self) -> f64 {
        self.wall_top_m - self.excavation_bottom_m
    }

    /// Validate the material constants the safety checks divide by or scale with.
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.steel_modulus_mpa.is_finite() && self.steel_modulus_mpa > 0.0) {
            return Err(CalcError::invalid_input(
                "steel_modulus_mpa",
                self.steel_modulus_mpa.to_string(),
                "Elastic modulus must be positive",
            ));
        }
        if !(self.strand_area_mm2.is_finite() && self.strand_area_mm2 > 0.0) {
            return Err(CalcError::invalid_input(
                "strand_area_mm2",
                self.strand_area_mm2.to_string(),
                "Strand area must be positive",
            ));
        }
        if !(self.wedge_slip_mm.is_finite() && self.wedge_slip_mm >= 0.0) {
            return Err(CalcError::invalid_input(
                "wedge_slip_mm",
                self.wedge_slip_mm.to_string(),
                "Wedge slip cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Anchors of one wall section plus their shared project values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub globals: ProjectGlobals,
    pub anchors: Vec<Anchor>,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new(globals: ProjectGlobals) -> Self {
        Dataset {
            globals,
            anchors: Vec::new(),
        }
    }

    /// Append an anchor; returns its 1-based anchor number
    pub fn add_anchor(&mut self, anchor: Anchor) -> usize {
        self.anchors.push(anchor);
        self.anchors.len()
    }

    /// Remove an anchor by 1-based anchor number
    pub fn remove_anchor(&mut self, number: usize) -> Option<Anchor> {
        if number == 0 || number > self.anchors.len() {
            return None;
        }
        Some(self.anchors.remove(number - 1))
    }

    /// Get the number of anchors
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }
}
