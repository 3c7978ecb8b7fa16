use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotType {
    Unknown,
    Serve,
    Return,
    Dink,
    Drive,
    Drop,
    Lob,
    Volley,
    Overhead,
    /// Around the post.
    Atp,
    Erne,
}

impl ShotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotType::Unknown => "unknown",
            ShotType::Serve => "serve",
            ShotType::Return => "return",
            ShotType::Dink => "dink",
            ShotType::Drive => "drive",
            ShotType::Drop => "drop",
            ShotType::Lob => "lob",
            ShotType::Volley => "volley",
            ShotType::Overhead => "overhead",
            ShotType::Atp => "atp",
            ShotType::Erne => "erne",
        }
    }
}

impl std::fmt::Display for ShotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallObservation {
    pub position: (f64, f64),
    pub timestamp: f64,
    pub frame_index: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedShot {
    pub frame_index: u64,
    pub timestamp: f64,
    pub shot_type: ShotType,
    pub player_id: u32,
    pub ball_speed: Option<f64>,
    /// Normalized `[0, 1]` court or frame position.
    pub placement: Option<(f64, f64)>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMovement {
    pub frame_index: u64,
    pub timestamp: f64,
    pub player_id: u32,
    pub position: (f64, f64),
    /// Normalized units per second since the previous sample of this player.
    pub velocity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shot_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ShotType::Atp).unwrap(), "\"atp\"");
        let parsed: ShotType = serde_json::from_str("\"overhead\"").unwrap();
        assert_eq!(parsed, ShotType::Overhead);
        assert_eq!(ShotType::Drop.to_string(), "drop");
    }
}
