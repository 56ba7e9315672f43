//! # Anchorage Equations
//!
//! Fundamental formulas used by the calculations, kept in one place so that
//! each can be checked against its reference on its own.
//!
//! ## Modules
//!
//! - [`anchorage`] - tendon, grout bulb and wall foundation formulas
//!
//! ## Sign Conventions
//!
//! - **Coordinates**: x to the right, y up, metres
//! - **Anchor angle**: measured from +x, counter-clockwise positive; anchors
//!   drilled downward into the retained ground have negative angles
//! - **Vertical load**: positive downward on the wall, always P·sin|θ|

pub mod anchorage;

pub use anchorage::{
    block_force_kn, bond_resistance_kn, bulb_load_kn, max_steel_force_kn, minimum_bond_length_m,
    slip_loss_kn, steel_area_mm2, vertical_component_kn, wall_self_load_kn_m,
};
