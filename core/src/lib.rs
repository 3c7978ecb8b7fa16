//! Frame-analysis core for racquet-sport match statistics.
//!
//! A recorded match is sampled frame by frame: a colour-blob detector follows
//! the ball, a trajectory classifier names the shots, a best-effort calibrator
//! maps pixels onto the court and a pose oracle feeds player positions. The
//! accumulated evidence is condensed into bounded skill scores.

pub mod config;
pub mod interface;
pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod synthesis;
pub mod telemetry;

pub use config::PipelineConfig;
pub use pipeline::{MatchAnalyzer, RunState};
pub use prelude::{CoreError, CoreResult, FrameStage, SampledFrame};
