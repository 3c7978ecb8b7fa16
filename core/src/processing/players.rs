use crate::config::{PipelineConfig, PlayerConfig};
use crate::interface::{Landmark, NoPoseEstimator, PlayerMovement, PoseEstimator, PoseLandmarks};
use crate::math::stats::StatsHelper;
use crate::prelude::{CoreError, CoreResult, FrameStage, SampledFrame};
use crate::processing::history::RingHistory;
use crate::telemetry::log::LogManager;
use std::collections::BTreeMap;

/// Only one player slot is tracked; identities are not followed across frames.
pub const PRIMARY_PLAYER: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PositionSample {
    position: (f64, f64),
    timestamp: f64,
}

pub struct PlayerTracker {
    estimator: Box<dyn PoseEstimator + Send>,
    config: Option<PlayerConfig>,
    histories: BTreeMap<u32, RingHistory<PositionSample>>,
    logger: LogManager,
}

impl PlayerTracker {
    pub fn new(estimator: Box<dyn PoseEstimator + Send>) -> Self {
        Self {
            estimator,
            config: None,
            histories: BTreeMap::new(),
            logger: LogManager::new("players"),
        }
    }

    /// Hip midpoint, or `None` when either hip is missing.
    pub fn representative_point(landmarks: &PoseLandmarks) -> Option<(f64, f64)> {
        let (lx, ly) = landmarks.get(Landmark::LeftHip)?;
        let (rx, ry) = landmarks.get(Landmark::RightHip)?;
        Some(((lx + rx) / 2.0, (ly + ry) / 2.0))
    }

    pub fn observe(
        &mut self,
        landmarks: Option<&PoseLandmarks>,
        frame_index: u64,
        timestamp: f64,
    ) -> Vec<PlayerMovement> {
        let Some(position) = landmarks.and_then(Self::representative_point) else {
            return Vec::new();
        };
        let capacity = self
            .config
            .as_ref()
            .map(|c| c.history_capacity)
            .unwrap_or_else(|| PlayerConfig::default().history_capacity);
        let history = self
            .histories
            .entry(PRIMARY_PLAYER)
            .or_insert_with(|| RingHistory::with_capacity(capacity));

        let velocity = match history.latest() {
            Some(previous) if timestamp > previous.timestamp => {
                let distance = (position.0 - previous.position.0).hypot(position.1 - previous.position.1);
                distance / (timestamp - previous.timestamp)
            }
            _ => 0.0,
        };
        history.push(PositionSample {
            position,
            timestamp,
        });
        vec![PlayerMovement {
            frame_index,
            timestamp,
            player_id: PRIMARY_PLAYER,
            position,
            velocity,
        }]
    }

    pub fn sample_count(&self, player_id: u32) -> usize {
        self.histories.get(&player_id).map(|h| h.len()).unwrap_or(0)
    }

    /// Bounding-box coverage of the player's recent positions, in percent.
    pub fn court_coverage(&self, player_id: u32) -> f64 {
        let config = self.config.clone().unwrap_or_default();
        let Some(history) = self.histories.get(&player_id) else {
            return config.default_coverage;
        };
        if history.len() < config.coverage_min_samples {
            return config.default_coverage;
        }
        let span_x = StatsHelper::span(history.iter().map(|s| s.position.0));
        let span_y = StatsHelper::span(history.iter().map(|s| s.position.1));
        (span_x * span_y * config.coverage_scale).clamp(0.0, 100.0)
    }

    /// Seconds to return to a ready position. Not measured; configured.
    pub fn recovery_time(&self) -> f64 {
        self.config
            .as_ref()
            .map(|c| c.recovery_time_secs)
            .unwrap_or_else(|| PlayerConfig::default().recovery_time_secs)
    }
}

impl Default for PlayerTracker {
    fn default() -> Self {
        Self::new(Box::new(NoPoseEstimator))
    }
}

impl FrameStage for PlayerTracker {
    type Output = Vec<PlayerMovement>;

    fn initialize(&mut self, config: &PipelineConfig) -> CoreResult<()> {
        if config.player.history_capacity == 0 {
            return Err(CoreError::InvalidInput("player history capacity must be non-zero".into()));
        }
        self.config = Some(config.player.clone());
        self.histories.clear();
        Ok(())
    }

    fn process(&mut self, input: &SampledFrame<'_>) -> CoreResult<Self::Output> {
        if self.config.is_none() {
            return Err(CoreError::Internal("player tracker not initialized".into()));
        }
        let landmarks = self.estimator.estimate(input.frame, input.index);
        if landmarks.is_none() {
            self.logger.trace(&format!("frame {}: no pose", input.index));
        }
        Ok(self.observe(landmarks.as_ref(), input.index, input.timestamp))
    }

    fn reset(&mut self) {
        self.histories.clear();
    }
}
