use crate::config::PipelineConfig;
use crate::interface::Frame;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("could not open source: {0}")]
    SourceOpen(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("run cancelled at frame {0}")]
    Cancelled(u64),
    #[error("vision backend: {0}")]
    Vision(#[from] opencv::Error),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, Copy)]
pub struct SampledFrame<'a> {
    pub frame: &'a Frame,
    pub index: u64,
    pub timestamp: f64,
}

/// Trait shared by the per-frame components driven by the orchestrator.
pub trait FrameStage {
    type Output;

    fn initialize(&mut self, config: &PipelineConfig) -> CoreResult<()>;
    fn process(&mut self, input: &SampledFrame<'_>) -> CoreResult<Self::Output>;
    fn reset(&mut self);
}
