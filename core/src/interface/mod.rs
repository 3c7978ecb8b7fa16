pub mod frame;
pub mod oracle;
pub mod result;
pub mod shot;

pub use frame::Frame;
pub use oracle::{
    FrameSource, Landmark, NoPoseEstimator, PoseEstimator, PoseLandmarks, ProgressSink,
    SourceMetadata,
};
pub use result::{
    AnalysisReport, AnalysisResult, ShotBreakdown, ShotSummary, SkillConfidence, SkillScores,
};
pub use shot::{BallObservation, DetectedShot, PlayerMovement, ShotType};
