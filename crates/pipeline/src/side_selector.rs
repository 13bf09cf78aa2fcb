//! Picks the shooting arm from wrist visibility.
//!
//! A wrist that stays more visible across the clip suggests the camera
//! favours that arm, which usually correlates with the shooting arm.

use hoops_core::landmarks::{Joint, LandmarkSeries};
use hoops_core::side::ShootingSide;

/// Mean visibility of `joint` over the valid frames that report it.
///
/// Frames missing the joint contribute nothing; no samples at all yields
/// `0.0`.
pub fn mean_visibility(series: &LandmarkSeries, joint: Joint) -> f64 {
    let (sum, count) = series
        .valid_frames()
        .filter_map(|(_, _, lm)| lm.get(&joint))
        .fold((0.0, 0usize), |(sum, n), l| (sum + l.visibility, n + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// `Right` when its mean wrist visibility is at least the left one's.
///
/// Ties, including an empty series, resolve to `Right`.
pub fn choose_shooting_side(series: &LandmarkSeries) -> ShootingSide {
    let right = mean_visibility(series, Joint::RightWrist);
    let left = mean_visibility(series, Joint::LeftWrist);

    let side = if right >= left {
        ShootingSide::Right
    } else {
        ShootingSide::Left
    };
    tracing::debug!(right_mean = right, left_mean = left, side = %side, "Shooting side selected");
    side
}
