use anyhow::Context;
use rallycore::interface::{Frame, PoseEstimator, PoseLandmarks};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Pose oracle that replays landmarks exported by an external pose tool.
///
/// The file maps frame indices to named joints in normalized coordinates:
/// `{"frames": {"12": {"left_hip": [0.41, 0.72], "right_hip": [0.47, 0.73]}}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSidecar {
    frames: BTreeMap<u64, PoseLandmarks>,
}

impl LandmarkSidecar {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading landmark sidecar {}", path_ref.display()))?;
        let sidecar: LandmarkSidecar = serde_json::from_str(&contents)
            .with_context(|| format!("parsing landmark sidecar {}", path_ref.display()))?;
        Ok(sidecar)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl PoseEstimator for LandmarkSidecar {
    fn estimate(&mut self, _frame: &Frame, frame_index: u64) -> Option<PoseLandmarks> {
        self.frames.get(&frame_index).cloned()
    }
}
