use crate::generator::profile::GeneratorConfig;
use crate::workflow::config::WorkflowConfig;
use chrono::{DateTime, Utc};
use rallycore::interface::{AnalysisReport, ShotBreakdown, SkillScores};
use rallycore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Body of `POST /analyze`. Without `images` the synthetic generator is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRequest {
    pub images: Option<PathBuf>,
    pub fps: Option<f64>,
    pub landmarks: Option<PathBuf>,
    pub synthetic: Option<GeneratorConfig>,
    pub pipeline: Option<PipelineConfig>,
    pub avatar_id: Option<String>,
}

impl JobRequest {
    /// Request fields layered over the bridge's default workflow.
    pub fn to_workflow(&self, defaults: &WorkflowConfig) -> WorkflowConfig {
        let mut config = defaults.clone();
        config.output = None;
        if self.images.is_some() {
            config.images = self.images.clone();
        }
        if self.fps.is_some() {
            config.fps = self.fps;
        }
        if self.landmarks.is_some() {
            config.landmarks = self.landmarks.clone();
        }
        if let Some(synthetic) = &self.synthetic {
            config.synthetic = synthetic.clone();
        }
        if let Some(pipeline) = &self.pipeline {
            config.pipeline = pipeline.clone();
        }
        config
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub avatar_id: Option<String>,
    pub results: Option<AnalysisReport>,
}

impl JobRecord {
    pub fn pending(avatar_id: Option<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            status: JobStatus::Pending,
            progress: 0.0,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
            avatar_id,
            results: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl From<&JobRecord> for StatusView {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.job_id,
            status: record.status,
            progress: record.progress,
            created_at: record.created_at,
            completed_at: record.completed_at,
            error: record.error.clone(),
        }
    }
}

/// `GET /results/{id}` payload for a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub video_duration: f64,
    pub shot_breakdown: ShotBreakdown,
    pub avatar_stats: SkillScores,
    pub confidence: f64,
    pub full_results: AnalysisReport,
}

impl ResultsView {
    pub fn new(job_id: Uuid, report: AnalysisReport) -> Self {
        Self {
            job_id,
            status: JobStatus::Completed,
            video_duration: report.video_duration,
            shot_breakdown: report.shot_breakdown.clone(),
            avatar_stats: report.avatar_stats,
            confidence: report.overall_confidence,
            full_results: report,
        }
    }
}
