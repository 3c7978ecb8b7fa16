use crate::interface::Frame;
use crate::prelude::CoreResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub fps: f64,
    pub total_frames: u64,
}

impl SourceMetadata {
    pub fn duration_secs(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }
}

pub trait FrameSource {
    /// Opens the input. Failing here aborts the run with `CoreError::SourceOpen`.
    fn open(&mut self) -> CoreResult<SourceMetadata>;

    fn next_frame(&mut self) -> CoreResult<Option<Frame>>;

    /// Advances past one frame without needing its pixels. Returns `false` at end of input.
    fn skip_frame(&mut self) -> CoreResult<bool> {
        Ok(self.next_frame()?.is_some())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose,
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

/// Named joints of one detected person, in normalized `[0, 1]` frame coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseLandmarks {
    joints: BTreeMap<Landmark, [f64; 2]>,
}

impl PoseLandmarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, landmark: Landmark, x: f64, y: f64) -> Self {
        self.insert(landmark, x, y);
        self
    }

    pub fn insert(&mut self, landmark: Landmark, x: f64, y: f64) {
        self.joints.insert(landmark, [x, y]);
    }

    pub fn get(&self, landmark: Landmark) -> Option<(f64, f64)> {
        self.joints.get(&landmark).map(|p| (p[0], p[1]))
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Pose-estimation capability; `None` when no person is visible.
pub trait PoseEstimator {
    fn estimate(&mut self, frame: &Frame, frame_index: u64) -> Option<PoseLandmarks>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoPoseEstimator;

impl PoseEstimator for NoPoseEstimator {
    fn estimate(&mut self, _frame: &Frame, _frame_index: u64) -> Option<PoseLandmarks> {
        None
    }
}

/// Fire-and-forget progress notification, `fraction` in `[0, 1]`.
pub trait ProgressSink {
    fn notify(&self, fraction: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64),
{
    fn notify(&self, fraction: f64) {
        self(fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmarks_serialize_as_named_map() {
        let pose = PoseLandmarks::new()
            .with(Landmark::LeftHip, 0.25, 0.5)
            .with(Landmark::RightHip, 0.35, 0.5);
        let json = serde_json::to_string(&pose).unwrap();
        assert_eq!(json, r#"{"left_hip":[0.25,0.5],"right_hip":[0.35,0.5]}"#);
        let back: PoseLandmarks = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(Landmark::RightHip), Some((0.35, 0.5)));
    }

    #[test]
    fn duration_guards_zero_fps() {
        let meta = SourceMetadata {
            fps: 0.0,
            total_frames: 10,
        };
        assert_eq!(meta.duration_secs(), 0.0);
    }
}
