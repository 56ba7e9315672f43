//! # Materials
//!
//! Material constants and section catalogues used by the anchorage checks.
//!
//! - [`steel`] - prestressing strand constants and the CHS micropile catalogue
//! - [`rebar`] - reinforcement bar areas and bar-layout expressions
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::materials::{bar_area, ALLOWABLE_STEEL_STRESS_MPA};
//! use anchor_core::units::Millimeters;
//!
//! assert_eq!(ALLOWABLE_STEEL_STRESS_MPA, 1440.0);
//! assert!((bar_area(Millimeters(10.0)).0 - 0.7854).abs() < 1e-4);
//! ```

pub mod rebar;
pub mod steel;

pub use rebar::{bar_area, AreaUnit, RebarExpression, RebarNode};
pub use steel::{
    builtin_micropile_sections, ChsCatalog, ChsSection, ALLOWABLE_STEEL_STRESS_MPA,
    DEFAULT_STEEL_MODULUS_MPA, DEFAULT_STRAND_AREA_MM2, DEFAULT_WEDGE_SLIP_MM,
};
