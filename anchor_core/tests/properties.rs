//! Property-based tests for anchor_core using proptest.
//!
//! Covers: geometry collinearity, prestress monotonicity of the checks,
//! bulb load additivity over anchor subsets, interchange round trip.

use anchor_core::calculations::bulb_load::{aggregate, AnchorForce, BulbLoadInput};
use anchor_core::calculations::geometry::derive;
use anchor_core::calculations::safety::{evaluate, CheckStatus};
use anchor_core::interchange::{export_csv, import_csv};
use anchor_core::project::{Anchor, Borehole, Point, ProjectGlobals, StratumLayer};
use proptest::prelude::*;

fn anchor_strategy() -> impl Strategy<Value = Anchor> {
    (
        (-50.0f64..50.0, -30.0f64..30.0, -89.0f64..89.0, 0.5f64..40.0, 0.0f64..30.0),
        (0.0f64..1500.0, 1u32..12, proptest::option::of(50.0f64..300.0)),
        (50.0f64..400.0, 1.0f64..2.0, 20.0f64..800.0, 1.0f64..3.0),
    )
        .prop_map(|((x, y, angle, free, bond), (prestress, strands, area), (drill, alpha, tau, fs))| {
            Anchor::new(x, y, angle, free, bond)
                .with_prestress(prestress)
                .with_strands(strands, area)
                .with_bond(drill, alpha, tau, fs)
        })
}

fn globals_strategy() -> impl Strategy<Value = ProjectGlobals> {
    let layer = ("[A-Za-z][A-Za-z0-9 ,;'\"-]{0,15}", -20.0f64..20.0, 1.0f64..50.0).prop_map(|(name, y, l)| {
        StratumLayer {
            name,
            elevation_m: y,
            extent_m: l,
        }
    });
    (
        ("[A-Za-z][A-Za-z0-9 ,;-]{0,20}", "S[0-9]{1,2}"),
        (-10.0f64..0.0, 1.0f64..15.0, 1.0f64..10.0, 5.0f64..40.0, 0.0f64..5.0),
        proptest::collection::vec(layer, 1..5),
        (0.1f64..1.0, 1.0f64..5.0, 0.5f64..3.0, 100.0f64..200.0, 0.0f64..10.0, 150_000.0f64..220_000.0),
    )
        .prop_map(
            |((name, borehole), (bottom, top, extent, boundary, bx), stratigraphy, (t, s, a_inf, a_strand, slip, e))| {
                ProjectGlobals {
                    section_name: name.trim().to_string(),
                    excavation_bottom_m: bottom,
                    wall_top_m: top,
                    excavation_extent_m: extent,
                    boundary_x_m: boundary,
                    stratigraphy,
                    borehole: Borehole { id: borehole, x_m: bx },
                    wall_thickness_m: t,
                    anchor_spacing_m: s,
                    influence_area_m: a_inf,
                    steel_modulus_mpa: e,
                    wedge_slip_mm: slip,
                    strand_area_mm2: a_strand,
                }
            },
        )
}

// ── Geometry ─────────────────────────────────────────────────────────

proptest! {
    /// P1, P2, P3 are collinear and the segment lengths are preserved.
    #[test]
    fn geometry_collinear_and_lengths_preserved(
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        angle in -360.0f64..360.0,
        free in 0.0f64..50.0,
        bond in 0.0f64..50.0,
    ) {
        let head = Point::new(x, y);
        let (p2, p3) = derive(head, angle, free, bond);

        prop_assert!((head.distance_to(&p2) - free).abs() < 1e-9);
        prop_assert!((p2.distance_to(&p3) - bond).abs() < 1e-9);

        let cross = (p2.x - head.x) * (p3.y - p2.y) - (p2.y - head.y) * (p3.x - p2.x);
        prop_assert!(cross.abs() < 1e-8 * (1.0 + free * bond));
    }
}

// ── Safety Checks ────────────────────────────────────────────────────

proptest! {
    /// Raising the prestress strictly raises the head force and never turns a FAIL into OK.
    #[test]
    fn prestress_monotonicity(
        anchor in anchor_strategy(),
        extra in 1e-3f64..500.0,
    ) {
        let low = evaluate(&anchor, 210_000.0, 140.0, 6.0).unwrap();
        let higher = anchor.clone().with_prestress(anchor.prestress_kn + extra);
        let high = evaluate(&higher, 210_000.0, 140.0, 6.0).unwrap();

        prop_assert!(high.block_force_kn > low.block_force_kn);
        prop_assert_eq!(high.max_steel_force_kn, low.max_steel_force_kn);
        prop_assert_eq!(high.bond_resistance_kn, low.bond_resistance_kn);
        if low.block_check == CheckStatus::Fail {
            prop_assert_eq!(high.block_check, CheckStatus::Fail);
        }
        if low.bond_check == CheckStatus::Fail {
            prop_assert_eq!(high.bond_check, CheckStatus::Fail);
        }
    }

    /// The checks are exactly the strict comparisons of the reported forces.
    #[test]
    fn checks_match_reported_forces(anchor in anchor_strategy()) {
        let r = evaluate(&anchor, 210_000.0, 140.0, 6.0).unwrap();
        prop_assert_eq!(r.block_check == CheckStatus::Ok, r.block_force_kn < r.max_steel_force_kn);
        prop_assert_eq!(r.bond_check == CheckStatus::Ok, r.bond_resistance_kn > r.block_force_kn);
    }
}

// ── Bulb Load ────────────────────────────────────────────────────────

proptest! {
    /// ΣV over a set equals the sum over any split of that set.
    #[test]
    fn bulb_load_partition_additivity(
        forces in proptest::collection::vec((0.0f64..1000.0, -90.0f64..90.0), 0..20),
        split in 0usize..20,
        spacing in 0.5f64..6.0,
    ) {
        let forces: Vec<AnchorForce> = forces.into_iter().map(|(p, a)| AnchorForce::new(p, a)).collect();
        let split = split.min(forces.len());
        let input = BulbLoadInput::new(6.0, 0.3, spacing, 1.5);

        let whole = aggregate(&forces, &input).unwrap();
        let left = aggregate(&forces[..split], &input).unwrap();
        let right = aggregate(&forces[split..], &input).unwrap();

        prop_assert!((whole.vertical_total_kn - (left.vertical_total_kn + right.vertical_total_kn)).abs() < 1e-6);
        prop_assert!(whole.vertical_total_kn >= 0.0);
    }
}

// ── Interchange ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// import(export(A, G)) reproduces A and G, stratigraphy order included.
    #[test]
    fn interchange_round_trip(
        anchors in proptest::collection::vec(anchor_strategy(), 1..=20),
        globals in globals_strategy(),
    ) {
        let bytes = export_csv(&anchors, &globals).unwrap();
        let outcome = import_csv(&bytes).unwrap();

        prop_assert!(outcome.skipped.is_empty());
        prop_assert!(outcome.payload_error.is_none());
        prop_assert!(outcome.column_errors.is_empty());
        prop_assert_eq!(&outcome.dataset.anchors, &anchors);
        prop_assert_eq!(&outcome.dataset.globals, &globals);
    }
}
