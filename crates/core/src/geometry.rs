//! Plane geometry used by the metrics engine.
//!
//! All functions work in image coordinates, where `y` grows downward.
//! They are unit-agnostic: normalized and pixel coordinates both work as
//! long as every point shares one frame of reference.

use serde::{Deserialize, Serialize};

/// Added to vector magnitude products so coincident points never divide by
/// zero.
pub const MAGNITUDE_EPSILON: f64 = 1e-9;

/// A point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between `self` and `other`.
    pub fn midpoint(self, other: Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// `true` when `self` sits strictly higher on screen than `other`.
    pub fn is_above(self, other: Point2) -> bool {
        self.y < other.y
    }
}

/// Angle in degrees at vertex `b` between rays `b→a` and `b→c`.
///
/// Returns a value in `[0, 180]`. The cosine is clamped to `[-1, 1]` before
/// `acos` so floating-point overshoot never yields `NaN`.
pub fn angle_3pts(a: Point2, b: Point2, c: Point2) -> f64 {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);

    let denom = bax.hypot(bay) * bcx.hypot(bcy) + MAGNITUDE_EPSILON;
    let cos = (bax * bcx + bay * bcy) / denom;
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle in degrees between the `hip→shoulder` vector and straight up.
///
/// "Up" is `(0, -1)` in image coordinates, so `0°` means perfectly upright
/// and `90°` means the trunk is horizontal.
pub fn vertical_angle(hip: Point2, shoulder: Point2) -> f64 {
    let (vx, vy) = (shoulder.x - hip.x, shoulder.y - hip.y);

    let denom = vx.hypot(vy) + MAGNITUDE_EPSILON;
    let cos = -vy / denom;
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
