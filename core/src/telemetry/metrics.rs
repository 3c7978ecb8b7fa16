use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub frames_read: u64,
    pub frames_sampled: u64,
    pub ball_detections: u64,
    pub pose_detections: u64,
    pub shots_recorded: u64,
    pub shots_debounced: u64,
    pub errors: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_frame_read(&self) {
        self.update(|m| m.frames_read += 1);
    }

    pub fn record_sampled(&self) {
        self.update(|m| m.frames_sampled += 1);
    }

    pub fn record_ball(&self) {
        self.update(|m| m.ball_detections += 1);
    }

    pub fn record_pose(&self) {
        self.update(|m| m.pose_detections += 1);
    }

    pub fn record_shot(&self) {
        self.update(|m| m.shots_recorded += 1);
    }

    pub fn record_debounced(&self) {
        self.update(|m| m.shots_debounced += 1);
    }

    pub fn record_error(&self) {
        self.update(|m| m.errors += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().map(|m| *m).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
