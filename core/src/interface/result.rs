use crate::interface::shot::{DetectedShot, PlayerMovement, ShotType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ShotBreakdown = BTreeMap<ShotType, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillConfidence {
    pub power: f64,
    pub finesse: f64,
    pub speed: f64,
    pub court_iq: f64,
    pub consistency: f64,
}

/// Bounded `[1, 99]` skill scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillScores {
    pub power: u8,
    pub finesse: u8,
    pub speed: u8,
    pub court_iq: u8,
    pub consistency: u8,
    pub confidence: SkillConfidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub video_duration: f64,
    pub total_frames: u64,
    pub fps: f64,
    pub shots: Vec<DetectedShot>,
    pub shot_breakdown: ShotBreakdown,
    pub movements: Vec<PlayerMovement>,
    pub court_coverage: f64,
    pub avg_recovery_time: f64,
    pub placement_accuracy: f64,
    pub avg_reaction_time_ms: u32,
    pub rally_lengths: Vec<u32>,
    pub unforced_errors: u32,
    pub winners: u32,
    pub overall_confidence: f64,
    pub skill_scores: SkillScores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotSummary {
    pub frame: u64,
    #[serde(rename = "type")]
    pub shot_type: ShotType,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub video_duration: f64,
    pub total_frames: u64,
    pub fps: f64,
    pub shots: Vec<ShotSummary>,
    pub shot_breakdown: ShotBreakdown,
    pub court_coverage: f64,
    pub avg_recovery_time: f64,
    pub placement_accuracy: f64,
    pub avg_reaction_time_ms: u32,
    pub rally_lengths: Vec<u32>,
    pub unforced_errors: u32,
    pub winners: u32,
    pub overall_confidence: f64,
    pub avatar_stats: SkillScores,
}

impl AnalysisResult {
    pub fn shot_count(&self) -> usize {
        self.shots.len()
    }

    pub fn to_report(&self) -> AnalysisReport {
        AnalysisReport {
            video_duration: self.video_duration,
            total_frames: self.total_frames,
            fps: self.fps,
            shots: self
                .shots
                .iter()
                .map(|shot| ShotSummary {
                    frame: shot.frame_index,
                    shot_type: shot.shot_type,
                    confidence: shot.confidence,
                })
                .collect(),
            shot_breakdown: self.shot_breakdown.clone(),
            court_coverage: self.court_coverage,
            avg_recovery_time: self.avg_recovery_time,
            placement_accuracy: self.placement_accuracy,
            avg_reaction_time_ms: self.avg_reaction_time_ms,
            rally_lengths: self.rally_lengths.clone(),
            unforced_errors: self.unforced_errors,
            winners: self.winners,
            overall_confidence: self.overall_confidence,
            avatar_stats: self.skill_scores,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_report())
    }
}
