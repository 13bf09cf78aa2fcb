//! Per-frame body landmarks as produced by the pose-estimation engine.
//!
//! A [`LandmarkSeries`] is the decimated, time-ordered output of one video.
//! Frames where pose estimation failed are kept (as invalid frames) so the
//! quality gate can measure how much of the clip was usable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geometry::Point2;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Frame rate assumed when the container does not report a usable one.
pub const DEFAULT_SOURCE_FPS: f64 = 30.0;

/// Default analysis sampling rate in frames per second.
pub const DEFAULT_SAMPLE_FPS: f64 = 10.0;

// ---------------------------------------------------------------------------
// Joint
// ---------------------------------------------------------------------------

/// The fixed set of body joints the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const COUNT: usize = 12;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Landmark
// ---------------------------------------------------------------------------

/// One joint's position plus the engine's visibility confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Visibility confidence in `[0, 1]`.
    #[serde(alias = "v")]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    pub fn point(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Landmarks of a single valid frame, keyed by joint.
pub type JointMap = BTreeMap<Joint, Landmark>;

// ---------------------------------------------------------------------------
// LandmarkFrame
// ---------------------------------------------------------------------------

/// One sampled frame.
///
/// `landmarks` is `None` for an invalid frame, so an invalid frame can never
/// carry joint data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Seconds since the start of the video.
    pub timestamp: f64,
    /// Frame number in the undecimated source video.
    pub source_frame: u64,
    pub landmarks: Option<JointMap>,
}

impl LandmarkFrame {
    pub fn valid(timestamp: f64, source_frame: u64, landmarks: JointMap) -> Self {
        Self {
            timestamp,
            source_frame,
            landmarks: Some(landmarks),
        }
    }

    pub fn invalid(timestamp: f64, source_frame: u64) -> Self {
        Self {
            timestamp,
            source_frame,
            landmarks: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.landmarks.is_some()
    }

    /// Look up a joint. `None` for invalid frames and for joints the engine
    /// did not report.
    pub fn joint(&self, joint: Joint) -> Option<&Landmark> {
        self.landmarks.as_ref()?.get(&joint)
    }
}

// ---------------------------------------------------------------------------
// LandmarkSeries
// ---------------------------------------------------------------------------

/// Time-ordered landmark frames for one shot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LandmarkSeries {
    frames: Vec<LandmarkFrame>,
}

impl LandmarkSeries {
    /// Build a series, checking that timestamps are finite, non-negative and
    /// strictly increasing.
    pub fn new(frames: Vec<LandmarkFrame>) -> Result<Self, CoreError> {
        for (idx, frame) in frames.iter().enumerate() {
            if !frame.timestamp.is_finite() || frame.timestamp < 0.0 {
                return Err(CoreError::Validation(format!(
                    "frame {idx} has invalid timestamp {}",
                    frame.timestamp
                )));
            }
        }
        if let Some(idx) = frames
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(CoreError::Validation(format!(
                "timestamps must be strictly increasing (frame {} at {} follows {})",
                idx + 1,
                frames[idx + 1].timestamp,
                frames[idx].timestamp
            )));
        }
        Ok(Self { frames })
    }

    /// Decimate a per-source-frame track down to `sample_fps`.
    ///
    /// Keeps every `step`-th source frame (see [`decimation_step`]) and
    /// stamps it with `source_frame / source_fps` seconds.
    pub fn from_track(
        source_fps: f64,
        sample_fps: f64,
        track: Vec<Option<JointMap>>,
    ) -> Result<Self, CoreError> {
        let fps = effective_source_fps(source_fps);
        let step = decimation_step(fps, sample_fps);

        let frames = track
            .into_iter()
            .enumerate()
            .step_by(step)
            .map(|(idx, landmarks)| LandmarkFrame {
                timestamp: idx as f64 / fps,
                source_frame: idx as u64,
                landmarks,
            })
            .collect();

        Self::new(frames)
    }

    pub fn frames(&self) -> &[LandmarkFrame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&LandmarkFrame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Valid frames with their position in the series, in capture order.
    pub fn valid_frames(&self) -> impl Iterator<Item = (usize, &LandmarkFrame, &JointMap)> + '_ {
        self.frames
            .iter()
            .enumerate()
            .filter_map(|(idx, f)| f.landmarks.as_ref().map(|lm| (idx, f, lm)))
    }

    pub fn valid_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_valid()).count()
    }
}

impl<'de> Deserialize<'de> for LandmarkSeries {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            frames: Vec<LandmarkFrame>,
        }

        let raw = Raw::deserialize(deserializer)?;
        LandmarkSeries::new(raw.frames).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Decimation
// ---------------------------------------------------------------------------

/// Replace a missing or nonsensical container frame rate with
/// [`DEFAULT_SOURCE_FPS`].
pub fn effective_source_fps(source_fps: f64) -> f64 {
    if source_fps.is_finite() && source_fps > 0.0 {
        source_fps
    } else {
        DEFAULT_SOURCE_FPS
    }
}

/// Number of source frames between two analysed samples.
///
/// `max(round(source_fps / sample_fps), 1)`; a non-positive sample rate
/// keeps every frame.
pub fn decimation_step(source_fps: f64, sample_fps: f64) -> usize {
    if !(sample_fps.is_finite() && sample_fps > 0.0) {
        return 1;
    }
    let step = (effective_source_fps(source_fps) / sample_fps).round();
    (step as usize).max(1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_with_wrist(y: f64) -> JointMap {
        let mut lm = JointMap::new();
        lm.insert(Joint::RightWrist, Landmark::new(0.5, y, 0.9));
        lm
    }

    // -- LandmarkSeries::new --------------------------------------------------

    #[test]
    fn accepts_increasing_timestamps() {
        let series = LandmarkSeries::new(vec![
            LandmarkFrame::invalid(0.0, 0),
            LandmarkFrame::valid(0.1, 3, pose_with_wrist(0.4)),
        ])
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.valid_count(), 1);
    }

    #[test]
    fn accepts_empty_series() {
        let series = LandmarkSeries::new(Vec::new()).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let result = LandmarkSeries::new(vec![
            LandmarkFrame::invalid(0.1, 0),
            LandmarkFrame::invalid(0.1, 1),
        ]);
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn rejects_negative_timestamp() {
        let result = LandmarkSeries::new(vec![LandmarkFrame::invalid(-0.5, 0)]);
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn rejects_nan_timestamp() {
        let result = LandmarkSeries::new(vec![LandmarkFrame::invalid(f64::NAN, 0)]);
        assert!(result.is_err());
    }

    // -- LandmarkFrame --------------------------------------------------------

    #[test]
    fn invalid_frame_has_no_joints() {
        let frame = LandmarkFrame::invalid(0.0, 0);
        assert!(!frame.is_valid());
        assert!(frame.joint(Joint::RightWrist).is_none());
    }

    #[test]
    fn valid_frame_exposes_joints() {
        let frame = LandmarkFrame::valid(0.0, 0, pose_with_wrist(0.25));
        assert_eq!(frame.joint(Joint::RightWrist).map(|l| l.y), Some(0.25));
        assert!(frame.joint(Joint::LeftWrist).is_none());
    }

    #[test]
    fn valid_frames_keeps_series_positions() {
        let series = LandmarkSeries::new(vec![
            LandmarkFrame::invalid(0.0, 0),
            LandmarkFrame::valid(0.1, 3, pose_with_wrist(0.4)),
            LandmarkFrame::invalid(0.2, 6),
            LandmarkFrame::valid(0.3, 9, pose_with_wrist(0.3)),
        ])
        .unwrap();
        let positions: Vec<usize> = series.valid_frames().map(|(i, _, _)| i).collect();
        assert_eq!(positions, vec![1, 3]);
    }

    // -- Decimation -----------------------------------------------------------

    #[test]
    fn step_rounds_fps_ratio() {
        assert_eq!(decimation_step(30.0, 10.0), 3);
        assert_eq!(decimation_step(29.97, 10.0), 3);
        assert_eq!(decimation_step(60.0, 10.0), 6);
        assert_eq!(decimation_step(25.0, 10.0), 3);
    }

    #[test]
    fn step_is_at_least_one() {
        assert_eq!(decimation_step(5.0, 10.0), 1);
        assert_eq!(decimation_step(30.0, 0.0), 1);
    }

    #[test]
    fn zero_source_fps_falls_back_to_default() {
        assert_eq!(effective_source_fps(0.0), DEFAULT_SOURCE_FPS);
        assert_eq!(effective_source_fps(f64::NAN), DEFAULT_SOURCE_FPS);
        assert_eq!(decimation_step(0.0, 10.0), 3);
    }

    #[test]
    fn from_track_decimates_and_stamps() {
        let track: Vec<Option<JointMap>> = (0..10)
            .map(|i| if i == 3 { None } else { Some(pose_with_wrist(0.5)) })
            .collect();
        let series = LandmarkSeries::from_track(30.0, 10.0, track).unwrap();

        let source: Vec<u64> = series.frames().iter().map(|f| f.source_frame).collect();
        assert_eq!(source, vec![0, 3, 6, 9]);
        assert!(!series.frames()[1].is_valid());
        assert!((series.frames()[2].timestamp - 0.2).abs() < 1e-12);
    }

    // -- Serde ----------------------------------------------------------------

    #[test]
    fn deserializes_short_visibility_key() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.1,"y":0.2,"v":0.7}"#).unwrap();
        assert_eq!(lm.visibility, 0.7);
    }

    #[test]
    fn deserialization_enforces_ordering() {
        let json = r#"{"frames":[
            {"timestamp":0.2,"source_frame":6,"landmarks":null},
            {"timestamp":0.1,"source_frame":3,"landmarks":null}
        ]}"#;
        assert!(serde_json::from_str::<LandmarkSeries>(json).is_err());
    }

    #[test]
    fn joint_keys_serialize_snake_case() {
        let frame = LandmarkFrame::valid(0.0, 0, pose_with_wrist(0.5));
        let value = serde_json::to_value(&frame).unwrap();
        assert!(value["landmarks"]["right_wrist"].is_object());
    }
}
