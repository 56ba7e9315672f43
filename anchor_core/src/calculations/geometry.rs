//! # Anchor Geometry
//!
//! Turns an anchor's head point, inclination and lengths into the three
//! points a drawing needs:
//!
//! ```text
//!   P1 (head) ●───── free length ─────● P2 ═════ bond length ═════● P3
//! ```
//!
//! The angle is used with its sign: −25° points down and away from the
//! wall, +25° points up. Zero lengths are valid and simply make points
//! coincide.

use serde::{Deserialize, Serialize};

use crate::project::{Anchor, Point};
use crate::units::{Degrees, Radians};

/// The three defining points of an anchor (m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedGeometry {
    /// Anchor head
    pub p1: Point,
    /// End of free length, start of the grout bulb
    pub p2: Point,
    /// End of the grout bulb
    pub p3: Point,
}

impl DerivedGeometry {
    /// Midpoint of the free length (label position)
    pub fn free_midpoint(&self) -> Point {
        Point::new((self.p1.x + self.p2.x) / 2.0, (self.p1.y + self.p2.y) / 2.0)
    }

    /// Midpoint of the bond length (label position)
    pub fn bond_midpoint(&self) -> Point {
        Point::new((self.p2.x + self.p3.x) / 2.0, (self.p2.y + self.p3.y) / 2.0)
    }
}

/// Compute P2 and P3 from the head, angle and lengths.
///
/// # Formula
/// P2 = P1 + L_free × (cos θ, sin θ)
/// P3 = P2 + L_bond × (cos θ, sin θ)
///
/// # Example
/// ```rust
/// use anchor_core::calculations::geometry::derive;
/// use anchor_core::project::Point;
///
/// let (p2, p3) = derive(Point::new(0.0, 0.0), 0.0, 10.0, 5.0);
/// assert_eq!((p2.x, p2.y), (10.0, 0.0));
/// assert_eq!((p3.x, p3.y), (15.0, 0.0));
/// ```
pub fn derive(head: Point, angle_deg: f64, free_length_m: f64, bond_length_m: f64) -> (Point, Point) {
    let theta: Radians = Degrees(angle_deg).into();
    let (sin, cos) = theta.0.sin_cos();

    let p2 = Point::new(head.x + free_length_m * cos, head.y + free_length_m * sin);
    let p3 = Point::new(p2.x + bond_length_m * cos, p2.y + bond_length_m * sin);
    (p2, p3)
}

/// Derive the full geometry of an anchor.
pub fn anchor_geometry(anchor: &Anchor) -> DerivedGeometry {
    let (p2, p3) = derive(anchor.head, anchor.angle_deg, anchor.free_length_m, anchor.bond_length_m);
    DerivedGeometry {
        p1: anchor.head,
        p2,
        p3,
    }
}
