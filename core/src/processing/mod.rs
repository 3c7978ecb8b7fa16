pub mod ball;
pub mod court;
pub mod history;
pub mod players;
pub mod trajectory;

pub use ball::{BallCandidate, BallDetector};
pub use court::{CourtCalibration, CourtCalibrator};
pub use history::RingHistory;
pub use players::{PlayerTracker, PRIMARY_PLAYER};
pub use trajectory::TrajectoryClassifier;
