use crate::generator::profile::{ScriptedPose, SyntheticRallySource};
use crate::sources::{ImageSequenceSource, LandmarkSidecar};
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::{info, warn};
use rallycore::interface::{AnalysisResult, FrameSource, NoPoseEstimator, PoseEstimator, ProgressSink};
use rallycore::telemetry::MetricsSnapshot;
use rallycore::MatchAnalyzer;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Debug)]
pub struct WorkflowResult {
    pub result: AnalysisResult,
    pub metrics: MetricsSnapshot,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    fn source(&self) -> Box<dyn FrameSource> {
        match &self.config.images {
            Some(dir) => Box::new(ImageSequenceSource::new(dir, self.config.image_fps())),
            None => Box::new(SyntheticRallySource::new(self.config.synthetic.clone())),
        }
    }

    fn pose_estimator(&self) -> anyhow::Result<Box<dyn PoseEstimator + Send>> {
        if let Some(path) = &self.config.landmarks {
            let sidecar = LandmarkSidecar::load(path).context("loading pose landmarks")?;
            if sidecar.is_empty() {
                warn!("landmark sidecar {} holds no frames", path.display());
            } else {
                info!("loaded landmarks for {} frames", sidecar.len());
            }
            return Ok(Box::new(sidecar));
        }
        if self.config.images.is_none() {
            return Ok(Box::new(ScriptedPose::new(&self.config.synthetic)));
        }
        Ok(Box::new(NoPoseEstimator))
    }

    pub fn execute(
        &self,
        progress: Option<&dyn ProgressSink>,
        cancel: Option<Arc<AtomicBool>>,
    ) -> anyhow::Result<WorkflowResult> {
        let mut source = self.source();
        let estimator = self.pose_estimator()?;
        let mut analyzer = MatchAnalyzer::new(self.config.to_pipeline_config(), estimator);
        if let Some(flag) = cancel {
            analyzer = analyzer.with_cancel_flag(flag);
        }
        let result = analyzer
            .analyze(source.as_mut(), progress)
            .context("analyzing match")?;
        Ok(WorkflowResult {
            result,
            metrics: analyzer.metrics(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{Flight, GeneratorConfig};
    use rallycore::prelude::CoreError;
    use std::cell::Cell;

    fn short_synthetic() -> WorkflowConfig {
        WorkflowConfig {
            synthetic: GeneratorConfig {
                duration_secs: 2.0,
                flights: vec![Flight::Drive],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn runner_executes_synthetic_workflow() {
        let runner = Runner::new(short_synthetic());
        let calls = Cell::new(0);
        let progress = |_: f64| calls.set(calls.get() + 1);
        let outcome = runner.execute(Some(&progress), None).unwrap();
        assert_eq!(outcome.result.total_frames, 60);
        assert_eq!(outcome.metrics.frames_read, 60);
        assert_eq!(outcome.metrics.frames_sampled, 20);
        assert_eq!(outcome.result.movements.len(), 20);
        assert!(calls.get() > 0);
        let scores = outcome.result.skill_scores;
        for score in [scores.power, scores.finesse, scores.speed, scores.court_iq, scores.consistency] {
            assert!((1..=99).contains(&score));
        }
    }

    #[test]
    fn missing_image_directory_is_reported() {
        let config = WorkflowConfig {
            images: Some("/nonexistent/frames".into()),
            ..Default::default()
        };
        let err = Runner::new(config).execute(None, None).unwrap_err();
        let core = err.downcast_ref::<CoreError>().unwrap();
        assert!(matches!(core, CoreError::SourceOpen(_)));
    }

    #[test]
    fn raised_cancel_flag_stops_run() {
        let flag = Arc::new(AtomicBool::new(true));
        let err = Runner::new(short_synthetic())
            .execute(None, Some(flag))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::Cancelled(0))
        ));
    }
}
