//! Replay rendering.
//!
//! Draws the detected skeleton over the raw video frame of each keyframe so
//! a coach can check what the analysis saw. Rendering is best effort: a
//! [`RenderError`] is logged by the caller and the replay simply omitted.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use hoops_core::landmarks::{Joint, JointMap};
use hoops_core::types::ShotId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Skeleton bones drawn between joint pairs.
pub const POSE_EDGES: [(Joint, Joint); 12] = [
    (Joint::LeftShoulder, Joint::RightShoulder),
    (Joint::LeftShoulder, Joint::LeftElbow),
    (Joint::LeftElbow, Joint::LeftWrist),
    (Joint::RightShoulder, Joint::RightElbow),
    (Joint::RightElbow, Joint::RightWrist),
    (Joint::LeftHip, Joint::RightHip),
    (Joint::LeftShoulder, Joint::LeftHip),
    (Joint::RightShoulder, Joint::RightHip),
    (Joint::LeftHip, Joint::LeftKnee),
    (Joint::LeftKnee, Joint::LeftAnkle),
    (Joint::RightHip, Joint::RightKnee),
    (Joint::RightKnee, Joint::RightAnkle),
];

const JOINT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BONE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
const JOINT_RADIUS: i64 = 4;
const BONE_THICKNESS: i64 = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Frame {frame} unavailable: {reason}")]
    FrameUnavailable { frame: u64, reason: String },

    #[error("No landmarks at frame {0}")]
    NoLandmarks(u64),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered keyframe attached to the shot result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Keyframe name: `set`, `release` or `follow`.
    pub name: String,
    /// Public URL of the PNG.
    pub url: String,
    /// Frame number in the source video.
    pub frame_idx: u64,
}

/// Supplies raw video frames by source frame number.
pub trait FrameSource: Send + Sync {
    fn frame(&self, video_path: &Path, source_frame: u64) -> Result<RgbImage, RenderError>;
}

/// Overlays landmarks on a keyframe and persists the result.
pub trait ReplayRenderer: Send + Sync {
    fn render(
        &self,
        shot_id: ShotId,
        name: &str,
        video_path: &Path,
        source_frame: u64,
        landmarks: Option<&JointMap>,
    ) -> Result<Replay, RenderError>;
}

// ---------------------------------------------------------------------------
// ImageDirFrameSource
// ---------------------------------------------------------------------------

/// Reads frames pre-extracted to `<video>.frames/frame_000123.png`.
#[derive(Debug, Clone, Default)]
pub struct ImageDirFrameSource;

impl ImageDirFrameSource {
    pub fn frame_path(video_path: &Path, source_frame: u64) -> PathBuf {
        let mut dir = video_path.as_os_str().to_owned();
        dir.push(".frames");
        PathBuf::from(dir).join(format!("frame_{source_frame:06}.png"))
    }
}

impl FrameSource for ImageDirFrameSource {
    fn frame(&self, video_path: &Path, source_frame: u64) -> Result<RgbImage, RenderError> {
        let path = Self::frame_path(video_path, source_frame);
        let img = image::open(&path).map_err(|e| RenderError::FrameUnavailable {
            frame: source_frame,
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(img.to_rgb8())
    }
}

// ---------------------------------------------------------------------------
// SkeletonRenderer
// ---------------------------------------------------------------------------

/// Writes `<media>/shots/<id>/replays/<name>.png`, served under
/// `/media/shots/<id>/replays/<name>.png`.
pub struct SkeletonRenderer<F> {
    frames: F,
    media_dir: PathBuf,
}

impl<F: FrameSource> SkeletonRenderer<F> {
    pub fn new(frames: F, media_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames,
            media_dir: media_dir.into(),
        }
    }

    pub fn replay_path(&self, shot_id: ShotId, name: &str) -> PathBuf {
        self.media_dir
            .join("shots")
            .join(shot_id.to_string())
            .join("replays")
            .join(format!("{name}.png"))
    }

    pub fn replay_url(shot_id: ShotId, name: &str) -> String {
        format!("/media/shots/{shot_id}/replays/{name}.png")
    }
}

impl<F: FrameSource> ReplayRenderer for SkeletonRenderer<F> {
    fn render(
        &self,
        shot_id: ShotId,
        name: &str,
        video_path: &Path,
        source_frame: u64,
        landmarks: Option<&JointMap>,
    ) -> Result<Replay, RenderError> {
        let landmarks = landmarks.ok_or(RenderError::NoLandmarks(source_frame))?;
        let mut img = self.frames.frame(video_path, source_frame)?;
        draw_skeleton(&mut img, landmarks);

        let path = self.replay_path(shot_id, name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        img.save(&path)?;

        tracing::debug!(
            shot_id = %shot_id,
            name,
            source_frame,
            path = %path.display(),
            "Replay rendered",
        );

        Ok(Replay {
            name: name.to_string(),
            url: Self::replay_url(shot_id, name),
            frame_idx: source_frame,
        })
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Draw bones then joints. Landmarks are normalised to `[0, 1]`; anything
/// mapping outside the image is skipped.
pub fn draw_skeleton(img: &mut RgbImage, landmarks: &JointMap) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let to_px = |joint: Joint| {
        let lm = landmarks.get(&joint)?;
        let x = (lm.x * w as f64).round() as i64;
        let y = (lm.y * h as f64).round() as i64;
        (x >= 0 && y >= 0 && x < w && y < h).then_some((x, y))
    };

    for (a, b) in POSE_EDGES {
        if let (Some(pa), Some(pb)) = (to_px(a), to_px(b)) {
            draw_line(img, pa, pb, BONE_COLOR);
        }
    }
    for joint in Joint::ALL {
        if let Some(p) = to_px(joint) {
            draw_disc(img, p, JOINT_RADIUS, JOINT_COLOR);
        }
    }
}

fn in_bounds(img: &RgbImage, x: i64, y: i64) -> bool {
    x >= 0 && y >= 0 && x < img.width() as i64 && y < img.height() as i64
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if in_bounds(img, x, y) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_disc(img: &mut RgbImage, (cx, cy): (i64, i64), radius: i64, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

fn draw_line(img: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>) {
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
    let half = BONE_THICKNESS / 2;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = x0 + ((x1 - x0) as f64 * t).round() as i64;
        let y = y0 + ((y1 - y0) as f64 * t).round() as i64;
        for oy in -half..=half {
            for ox in -half..=half {
                put(img, x + ox, y + oy, color);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hoops_core::landmarks::Landmark;

    use super::*;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn arm() -> JointMap {
        let mut lm = JointMap::new();
        lm.insert(Joint::RightShoulder, Landmark::new(0.25, 0.5, 0.9));
        lm.insert(Joint::RightElbow, Landmark::new(0.75, 0.5, 0.9));
        lm
    }

    fn write_frame(video: &Path, frame: u64) {
        let path = ImageDirFrameSource::frame_path(video, frame);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(40, 20, BLACK).save(&path).unwrap();
    }

    #[test]
    fn frame_path_is_zero_padded() {
        assert_eq!(
            ImageDirFrameSource::frame_path(Path::new("/v/shot.mp4"), 123),
            PathBuf::from("/v/shot.mp4.frames/frame_000123.png")
        );
    }

    #[test]
    fn skeleton_marks_joints_and_bones() {
        let mut img = RgbImage::from_pixel(40, 20, BLACK);
        draw_skeleton(&mut img, &arm());

        assert_eq!(*img.get_pixel(10, 10), JOINT_COLOR);
        assert_eq!(*img.get_pixel(30, 10), JOINT_COLOR);
        assert_eq!(*img.get_pixel(20, 10), BONE_COLOR);
        assert_eq!(*img.get_pixel(20, 0), BLACK);
    }

    #[test]
    fn off_image_landmarks_are_skipped() {
        let mut img = RgbImage::from_pixel(40, 20, BLACK);
        let mut lm = arm();
        lm.insert(Joint::RightElbow, Landmark::new(1.5, 0.5, 0.9));
        draw_skeleton(&mut img, &lm);

        // Shoulder still drawn, no bone towards the off-image elbow.
        assert_eq!(*img.get_pixel(10, 10), JOINT_COLOR);
        assert_eq!(*img.get_pixel(25, 10), BLACK);
    }

    #[test]
    fn renders_png_under_media_dir() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("shot.mp4");
        write_frame(&video, 45);

        let renderer = SkeletonRenderer::new(ImageDirFrameSource, dir.path().join("media"));
        let shot_id = ShotId::new_v4();
        let replay = renderer
            .render(shot_id, "release", &video, 45, Some(&arm()))
            .unwrap();

        assert_eq!(replay.name, "release");
        assert_eq!(replay.frame_idx, 45);
        assert_eq!(replay.url, format!("/media/shots/{shot_id}/replays/release.png"));

        let written = image::open(renderer.replay_path(shot_id, "release"))
            .unwrap()
            .to_rgb8();
        assert_eq!(written.dimensions(), (40, 20));
        assert_eq!(*written.get_pixel(10, 10), JOINT_COLOR);
    }

    #[test]
    fn missing_frame_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SkeletonRenderer::new(ImageDirFrameSource, dir.path());
        let result = renderer.render(
            ShotId::new_v4(),
            "set",
            &dir.path().join("absent.mp4"),
            3,
            Some(&arm()),
        );
        assert_matches!(result, Err(RenderError::FrameUnavailable { frame: 3, .. }));
    }

    #[test]
    fn invalid_keyframe_has_nothing_to_draw() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = SkeletonRenderer::new(ImageDirFrameSource, dir.path());
        let result = renderer.render(ShotId::new_v4(), "follow", Path::new("x.mp4"), 9, None);
        assert_matches!(result, Err(RenderError::NoLandmarks(9)));
    }
}
