use crate::interface::{BallObservation, ShotType};
use crate::math::stats::StatsHelper;
use crate::processing::history::RingHistory;

pub const WINDOW: usize = 5;
const DRIVE_MIN_SPEED: f64 = 20.0;
const DRIVE_MAX_ANGLE_STD: f64 = 0.3;
const DINK_MAX_SPEED: f64 = 8.0;
const DINK_MIN_HISTORY: usize = 10;
// Angles are image-space, so a ball rising on screen has a negative angle.
const LOB_MAX_ANGLE: f64 = -0.5;
const DROP_MAX_SPEED: f64 = 15.0;
const DROP_MIN_ANGLE: f64 = 0.3;

pub struct TrajectoryClassifier;

impl TrajectoryClassifier {
    /// `None` until the history holds a full window.
    pub fn classify(history: &RingHistory<BallObservation>) -> Option<ShotType> {
        let window: Vec<(f64, f64)> = history.recent(WINDOW).map(|o| o.position).collect();
        Self::classify_window(&window, history.len())
    }

    /// Classifies the last `WINDOW` points of `points`; `history_len` is the
    /// full history length used by the slow-ball test.
    pub fn classify_window(points: &[(f64, f64)], history_len: usize) -> Option<ShotType> {
        if points.len() < WINDOW {
            return None;
        }
        let recent = &points[points.len() - WINDOW..];

        let (angles, speeds): (Vec<f64>, Vec<f64>) = recent
            .windows(2)
            .map(|pair| {
                let dx = pair[1].0 - pair[0].0;
                let dy = pair[1].1 - pair[0].1;
                (dy.atan2(dx), dx.hypot(dy))
            })
            .unzip();

        let mean_speed = StatsHelper::mean(&speeds);
        let angle_spread = StatsHelper::std_dev(&angles);
        let last_three = &angles[angles.len() - 3..];

        let shot = if mean_speed > DRIVE_MIN_SPEED && angle_spread < DRIVE_MAX_ANGLE_STD {
            ShotType::Drive
        } else if mean_speed < DINK_MAX_SPEED && history_len > DINK_MIN_HISTORY {
            ShotType::Dink
        } else if last_three.iter().all(|&a| a < LOB_MAX_ANGLE) {
            ShotType::Lob
        } else if mean_speed < DROP_MAX_SPEED && last_three.iter().all(|&a| a > DROP_MIN_ANGLE) {
            ShotType::Drop
        } else {
            ShotType::Unknown
        };
        Some(shot)
    }
}
