//! # Anchorage Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` or domain type - input parameters (JSON-serializable)
//! - `*Result` - calculation results (JSON-serializable)
//! - a pure function returning `CalcResult<*Result>`
//!
//! ## Available Calculations
//!
//! - [`geometry`] - anchor points P1, P2, P3
//! - [`safety`] - block and bond checks of one anchor
//! - [`bulb_load`] - load on a micropile bulb from all anchors and the wall
//! - [`micropile`] - CHS micropile buckling and minimum bond length
//!
//! [`evaluate_anchorage`] runs the first three over a whole section.

pub mod bulb_load;
pub mod geometry;
pub mod micropile;
pub mod safety;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::CalcError;
use crate::project::{Anchor, ProjectGlobals};

// Re-export commonly used types
pub use bulb_load::{aggregate, AnchorForce, BulbLoadInput, BulbLoadResult, VerticalComponent};
pub use geometry::{anchor_geometry, derive, DerivedGeometry};
pub use micropile::{check_micropile, minimum_bond_length, BondLengthInput, MicropileInput, MicropileResult};
pub use safety::{evaluate, CheckStatus, SafetyResult};

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRow {
    /// 1-based anchor number
    pub anchor_number: usize,
    pub anchor: Anchor,
    pub geometry: DerivedGeometry,
    pub safety: SafetyResult,
}

/// An anchor whose safety evaluation was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorFailure {
    /// 1-based anchor number
    pub anchor: usize,
    pub error: CalcError,
}

/// Everything computed for one wall section.
///
/// Failed anchors do not stop the others. The bulb load is aggregated over
/// every anchor, failed ones included, since it only needs prestress and
/// angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorageReport {
    pub section_name: String,
    pub rows: Vec<AnchorRow>,
    pub failures: Vec<AnchorFailure>,
    pub bulb_load: Option<BulbLoadResult>,
    pub bulb_load_error: Option<CalcError>,
}

impl AnchorageReport {
    /// Check if every evaluated anchor passes both checks
    pub fn all_pass(&self) -> bool {
        self.failures.is_empty() && self.rows.iter().all(|row| row.safety.passes())
    }

    /// Number of anchors with at least one FAIL
    pub fn failing_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.safety.passes()).count()
    }
}

/// Evaluate every anchor of a section and the resulting bulb load.
///
/// # Example
///
/// ```rust
/// use anchor_core::calculations::evaluate_anchorage;
/// use anchor_core::project::{Anchor, ProjectGlobals};
///
/// let anchors = vec![Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0)];
/// let report = evaluate_anchorage(&anchors, &ProjectGlobals::default());
///
/// assert_eq!(report.rows.len(), 1);
/// assert!(report.all_pass());
/// assert!(report.bulb_load.is_some());
/// ```
pub fn evaluate_anchorage(anchors: &[Anchor], globals: &ProjectGlobals) -> AnchorageReport {
    let mut rows = Vec::with_capacity(anchors.len());
    let mut failures = Vec::new();

    for (i, anchor) in anchors.iter().enumerate() {
        let number = i + 1;
        match safety::evaluate_with_globals(anchor, globals) {
            Ok(result) => {
                debug!(
                    anchor = number,
                    block_force_kn = result.block_force_kn,
                    max_steel_force_kn = result.max_steel_force_kn,
                    bond_resistance_kn = result.bond_resistance_kn,
                    block = %result.block_check,
                    bond = %result.bond_check,
                    "anchor evaluated"
                );
                rows.push(AnchorRow {
                    anchor_number: number,
                    anchor: anchor.clone(),
                    geometry: anchor_geometry(anchor),
                    safety: result,
                });
            }
            Err(error) => {
                warn!(anchor = number, code = error.error_code(), "anchor rejected: {}", error);
                failures.push(AnchorFailure { anchor: number, error });
            }
        }
    }

    let height = globals.wall_height_m();
    if height < 0.0 {
        warn!(
            wall_top_m = globals.wall_top_m,
            excavation_bottom_m = globals.excavation_bottom_m,
            "wall height is negative; wall self-load will be negative"
        );
    }

    let (bulb_load, bulb_load_error) = match bulb_load::aggregate_anchors(anchors, globals) {
        Ok(result) => (Some(result), None),
        Err(error) => {
            warn!(code = error.error_code(), "bulb load not computed: {}", error);
            (None, Some(error))
        }
    };

    AnchorageReport {
        section_name: globals.section_name.clone(),
        rows,
        failures,
        bulb_load,
        bulb_load_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_does_not_stop_others() {
        let mut broken = Anchor::new(0.0, 6.0, -30.0, 10.0, 8.0);
        broken.free_length_m = 0.0;
        let anchors = vec![
            Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0),
            broken,
            Anchor::new(0.0, 4.0, -25.0, 12.0, 9.0),
        ];

        let report = evaluate_anchorage(&anchors, &ProjectGlobals::default());
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[1].anchor_number, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].anchor, 2);
        assert!(matches!(report.failures[0].error, CalcError::InvalidGeometry { .. }));
        assert!(!report.all_pass());

        // Bulb load still counts the rejected anchor
        let bulb = report.bulb_load.unwrap();
        assert_eq!(bulb.components.len(), 3);
    }

    #[test]
    fn test_bad_spacing_reported_not_fatal() {
        let globals = ProjectGlobals {
            anchor_spacing_m: 0.0,
            ..ProjectGlobals::default()
        };
        let report = evaluate_anchorage(&[Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0)], &globals);
        assert_eq!(report.rows.len(), 1);
        assert!(report.bulb_load.is_none());
        assert!(matches!(report.bulb_load_error, Some(CalcError::InvalidSpacing { .. })));
    }

    #[test]
    fn test_empty_section() {
        let report = evaluate_anchorage(&[], &ProjectGlobals::default());
        assert!(report.rows.is_empty());
        assert!(report.all_pass());
        assert_eq!(report.bulb_load.unwrap().vertical_total_kn, 0.0);
    }

    #[test]
    fn test_negative_wall_height_still_evaluates() {
        let globals = ProjectGlobals {
            excavation_bottom_m: 8.0,
            wall_top_m: 5.0,
            ..ProjectGlobals::default()
        };
        let report = evaluate_anchorage(&[], &globals);
        assert!(report.bulb_load.unwrap().wall_self_load_kn_m < 0.0);
    }

    #[test]
    fn test_report_serializes() {
        let report = evaluate_anchorage(&[Anchor::new(0.0, 8.0, -25.0, 10.0, 10.0)], &ProjectGlobals::default());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"block_check\":\"OK\""));
        let back: AnchorageReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
