//! Geometric metrics measured at the three keyframes.

use serde::{Deserialize, Serialize};

use hoops_core::geometry::{angle_3pts, vertical_angle, Point2};
use hoops_core::landmarks::{Joint, LandmarkSeries};
use hoops_core::side::ArmJoints;

use crate::error::AnalysisError;
use crate::keyframes::KeyframeSet;

/// Measurements feeding the score. Angles in degrees, heights in the
/// series' coordinate unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Shoulder–elbow–wrist angle at the set frame.
    pub elbow_angle_set: f64,
    /// Shoulder–elbow–wrist angle at the release frame.
    pub elbow_angle_release: f64,
    /// Shoulder y minus wrist y at release; positive means wrist above shoulder.
    pub release_height: f64,
    /// Lean of the hip-centre → shoulder-centre line from vertical at release.
    pub trunk_angle: f64,
    /// `1.0` when wrist is above elbow and elbow above shoulder at follow-through.
    pub followthrough_score: f64,
}

/// Compute every metric for the chosen arm.
///
/// Fails with [`AnalysisError::MissingLandmark`] when a keyframe is an
/// invalid frame or lacks one of the joints read from it.
pub fn compute_metrics(
    series: &LandmarkSeries,
    arm: &ArmJoints,
    keyframes: &KeyframeSet,
) -> Result<MetricSet, AnalysisError> {
    let at = |frame: usize, joint: Joint| point(series, frame, joint);

    let elbow_angle_set = angle_3pts(
        at(keyframes.set, arm.shoulder)?,
        at(keyframes.set, arm.elbow)?,
        at(keyframes.set, arm.wrist)?,
    );

    let rel = keyframes.release;
    let shoulder = at(rel, arm.shoulder)?;
    let wrist = at(rel, arm.wrist)?;
    let elbow_angle_release = angle_3pts(shoulder, at(rel, arm.elbow)?, wrist);
    let release_height = shoulder.y - wrist.y;

    let hip_center = at(rel, Joint::LeftHip)?.midpoint(at(rel, Joint::RightHip)?);
    let shoulder_center = at(rel, Joint::LeftShoulder)?.midpoint(at(rel, Joint::RightShoulder)?);
    let trunk_angle = vertical_angle(hip_center, shoulder_center);

    let fol = keyframes.follow;
    let extended = at(fol, arm.wrist)?.is_above(at(fol, arm.elbow)?)
        && at(fol, arm.elbow)?.is_above(at(fol, arm.shoulder)?);
    let followthrough_score = if extended { 1.0 } else { 0.0 };

    let metrics = MetricSet {
        elbow_angle_set,
        elbow_angle_release,
        release_height,
        trunk_angle,
        followthrough_score,
    };
    tracing::debug!(?metrics, "Metrics computed");
    Ok(metrics)
}

fn point(series: &LandmarkSeries, frame: usize, joint: Joint) -> Result<Point2, AnalysisError> {
    series
        .get(frame)
        .and_then(|f| f.joint(joint))
        .map(|l| l.point())
        .ok_or(AnalysisError::MissingLandmark { frame, joint })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
