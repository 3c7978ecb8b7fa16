use crate::config::PipelineConfig;
use crate::interface::{
    AnalysisResult, DetectedShot, FrameSource, PlayerMovement, PoseEstimator, ProgressSink,
    ShotType, SourceMetadata,
};
use crate::prelude::{CoreError, CoreResult, FrameStage, SampledFrame};
use crate::processing::{
    BallDetector, CourtCalibrator, PlayerTracker, TrajectoryClassifier, PRIMARY_PLAYER,
};
use crate::synthesis::{MatchState, StatisticsSynthesizer};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Calibrating,
    Sampling,
    Done,
    Failed,
}

/// Shot and rally bookkeeping carried across sampled frames.
#[derive(Debug, Default)]
struct Accumulator {
    shots: Vec<DetectedShot>,
    movements: Vec<PlayerMovement>,
    last_shot_frame: Option<u64>,
    last_ball_time: Option<f64>,
    current_rally: u32,
    rally_lengths: Vec<u32>,
}

impl Accumulator {
    fn close_rally(&mut self) {
        if self.current_rally > 0 {
            self.rally_lengths.push(self.current_rally);
            self.current_rally = 0;
        }
    }
}

pub struct MatchAnalyzer {
    config: PipelineConfig,
    detector: BallDetector,
    calibrator: CourtCalibrator,
    tracker: PlayerTracker,
    metrics: MetricsRecorder,
    cancel: Option<Arc<AtomicBool>>,
    state: RunState,
    logger: LogManager,
}

impl MatchAnalyzer {
    pub fn new(config: PipelineConfig, estimator: Box<dyn PoseEstimator + Send>) -> Self {
        Self {
            config,
            detector: BallDetector::new(),
            calibrator: CourtCalibrator::new(),
            tracker: PlayerTracker::new(estimator),
            metrics: MetricsRecorder::new(),
            cancel: None,
            state: RunState::Init,
            logger: LogManager::new("pipeline"),
        }
    }

    /// Installs a flag that, once raised, stops the run before the next sampled frame.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stride(fps: f64, target_rate: f64) -> u64 {
        if target_rate <= 0.0 {
            return 1;
        }
        ((fps / target_rate).round() as u64).max(1)
    }

    pub fn analyze(
        &mut self,
        source: &mut dyn FrameSource,
        progress: Option<&dyn ProgressSink>,
    ) -> CoreResult<AnalysisResult> {
        self.state = RunState::Init;
        self.metrics = MetricsRecorder::new();
        let outcome = self.run(source, progress);
        self.state = match outcome {
            Ok(_) => RunState::Done,
            Err(ref err) => {
                self.logger.warn(&format!("run failed: {}", err));
                RunState::Failed
            }
        };
        outcome
    }

    fn open(&mut self, source: &mut dyn FrameSource) -> CoreResult<SourceMetadata> {
        let metadata = source.open().map_err(|err| match err {
            CoreError::SourceOpen(_) => err,
            other => CoreError::SourceOpen(other.to_string()),
        })?;
        if !metadata.fps.is_finite() || metadata.fps <= 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "frame rate must be positive, got {}",
                metadata.fps
            )));
        }

        self.detector.reset();
        self.calibrator.reset();
        self.tracker.reset();
        self.detector.initialize(&self.config)?;
        self.calibrator.initialize(&self.config)?;
        self.tracker.initialize(&self.config)?;
        Ok(metadata)
    }

    fn run(
        &mut self,
        source: &mut dyn FrameSource,
        progress: Option<&dyn ProgressSink>,
    ) -> CoreResult<AnalysisResult> {
        let metadata = self.open(source)?;
        let fps = metadata.fps;
        let sampling = self.config.sampling.clone();
        let stride = Self::stride(fps, sampling.target_rate);
        let calibration_frames = sampling.calibration_window_secs * fps;
        let debounce_frames = sampling.debounce_secs * fps;
        let progress_every = (metadata.total_frames / 10).max(1);
        self.logger.record(&format!(
            "opened source: {:.2} fps, {} frames, stride {}",
            fps, metadata.total_frames, stride
        ));

        self.state = RunState::Calibrating;
        let mut acc = Accumulator::default();
        let mut index: u64 = 0;
        loop {
            if index % stride != 0 {
                match source.skip_frame() {
                    Ok(true) => {
                        self.metrics.record_frame_read();
                        index += 1;
                        continue;
                    }
                    Ok(false) => break,
                    Err(err) => {
                        self.absorb_read_failure(index, &err);
                        break;
                    }
                }
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    self.absorb_read_failure(index, &err);
                    break;
                }
            };
            self.metrics.record_frame_read();

            if self.cancel.as_ref().map_or(false, |flag| flag.load(Ordering::SeqCst)) {
                return Err(CoreError::Cancelled(index));
            }
            self.metrics.record_sampled();

            let input = SampledFrame {
                frame: &frame,
                index,
                timestamp: index as f64 / fps,
            };

            if self.state == RunState::Calibrating {
                if (index as f64) < calibration_frames && !self.calibrator.is_calibrated() {
                    if let Err(err) = self.calibrator.process(&input) {
                        self.absorb_stage_failure("court", index, &err);
                    }
                }
                if self.calibrator.is_calibrated() || (index as f64) >= calibration_frames {
                    self.state = RunState::Sampling;
                }
            }

            self.track_ball(&input, debounce_frames, &mut acc);

            if let Some(gap) = sampling.rally_gap_secs {
                let idle = acc
                    .last_ball_time
                    .map_or(false, |seen| input.timestamp - seen >= gap);
                if idle {
                    acc.close_rally();
                }
            }

            match self.tracker.process(&input) {
                Ok(movements) => {
                    if !movements.is_empty() {
                        self.metrics.record_pose();
                    }
                    acc.movements.extend(movements);
                }
                Err(err) => self.absorb_stage_failure("players", index, &err),
            }

            if index % progress_every == 0 {
                if let Some(sink) = progress {
                    let fraction = if metadata.total_frames > 0 {
                        (index as f64 / metadata.total_frames as f64).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    sink.notify(fraction);
                }
            }
            index += 1;
        }

        if sampling.rally_gap_secs.is_some() {
            acc.close_rally();
        }
        let metadata = SourceMetadata {
            fps,
            total_frames: if metadata.total_frames > 0 {
                metadata.total_frames
            } else {
                index
            },
        };
        self.logger.record(&format!(
            "finished after {} frames: {} shots, {} movements",
            index,
            acc.shots.len(),
            acc.movements.len()
        ));

        let state = MatchState {
            metadata,
            shots: acc.shots,
            movements: acc.movements,
            court_coverage: self.tracker.court_coverage(PRIMARY_PLAYER),
            recovery_time: self.tracker.recovery_time(),
            rally_lengths: acc.rally_lengths,
            unforced_errors: 0,
            winners: 0,
        };
        Ok(StatisticsSynthesizer::new(self.config.synthesis.clone()).synthesize(state))
    }

    fn track_ball(&mut self, input: &SampledFrame<'_>, debounce_frames: f64, acc: &mut Accumulator) {
        let position = match self.detector.process(input) {
            Ok(Some(position)) => position,
            Ok(None) => return,
            Err(err) => {
                self.absorb_stage_failure("ball", input.index, &err);
                return;
            }
        };
        self.metrics.record_ball();
        acc.last_ball_time = Some(input.timestamp);

        let shot_type = match TrajectoryClassifier::classify(self.detector.history()) {
            Some(ShotType::Unknown) | None => return,
            Some(shot_type) => shot_type,
        };
        let clear = acc
            .last_shot_frame
            .map_or(true, |last| (input.index - last) as f64 >= debounce_frames);
        if !clear {
            self.metrics.record_debounced();
            return;
        }

        let placement = self
            .calibrator
            .calibration()
            .and_then(|calibration| calibration.world_to_court(position.0, position.1))
            .unwrap_or_else(|| {
                (
                    position.0 / input.frame.width() as f64,
                    position.1 / input.frame.height() as f64,
                )
            });
        acc.shots.push(DetectedShot {
            frame_index: input.index,
            timestamp: input.timestamp,
            shot_type,
            player_id: PRIMARY_PLAYER,
            ball_speed: Some(self.detector.speed()),
            placement: Some(placement),
            confidence: self.config.sampling.shot_confidence,
        });
        acc.last_shot_frame = Some(input.index);
        acc.current_rally += 1;
        self.metrics.record_shot();
        self.logger.trace(&format!("frame {}: {} shot", input.index, shot_type));
    }

    fn absorb_read_failure(&self, index: u64, err: &CoreError) {
        self.metrics.record_error();
        self.logger
            .warn(&format!("read failed at frame {}, treating as end of input: {}", index, err));
    }

    fn absorb_stage_failure(&self, stage: &str, index: u64, err: &CoreError) {
        self.metrics.record_error();
        self.logger.warn(&format!("{} stage failed at frame {}: {}", stage, index, err));
    }
}
