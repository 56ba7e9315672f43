//! # anchor_core - Ground Anchor Verification Engine
//!
//! `anchor_core` checks the prestressed ground anchors of a retaining wall
//! section and the load they hand down to the wall's micropile foundation.
//! All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **Explicit context**: Project values travel as `&ProjectGlobals`, never as globals
//! - **Rich Errors**: Structured error types, not just strings
//! - **Keep going**: A bad anchor or a bad import row is reported, not fatal
//!
//! ## Quick Start
//!
//! ```rust
//! use anchor_core::calculations::evaluate_anchorage;
//! use anchor_core::project::{Anchor, ProjectGlobals};
//!
//! let anchors = vec![
//!     Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0),
//!     Anchor::new(0.0, 5.0, -30.0, 9.0, 8.0).with_prestress(300.0),
//! ];
//! let report = evaluate_anchorage(&anchors, &ProjectGlobals::default());
//!
//! for row in &report.rows {
//!     println!("#{} block {} bond {}", row.anchor_number, row.safety.block_check, row.safety.bond_check);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`project`] - Anchors, project values and the dataset container
//! - [`calculations`] - Geometry, safety checks, bulb load, micropiles
//! - [`equations`] - The closed-form formulas behind the calculations
//! - [`materials`] - Steel constants, CHS catalogue, rebar area expressions
//! - [`interchange`] - CSV import/export with a JSON project payload
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking

pub mod calculations;
pub mod equations;
pub mod errors;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod interchange;
pub mod materials;
pub mod project;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{evaluate_anchorage, AnchorFailure, AnchorRow, AnchorageReport};
pub use errors::{CalcError, CalcResult};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_dataset, save_dataset, FileLock};
pub use interchange::{export_csv, import_csv, ImportOutcome};
pub use project::{Anchor, Dataset, ProjectGlobals};
