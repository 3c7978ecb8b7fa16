use crate::config::SynthesisConfig;
use crate::interface::{
    AnalysisResult, DetectedShot, PlayerMovement, ShotBreakdown, ShotType, SkillConfidence,
    SkillScores, SourceMetadata,
};
use crate::math::stats::StatsHelper;

const BASE_CONFIDENCE: f64 = 0.5;
const MAX_CONFIDENCE: f64 = 0.95;
const CONFIDENT_SHOT_COUNT: usize = 10;
const MAX_PLACEMENT_ACCURACY: f64 = 95.0;
const RALLY_ESTIMATE_MIN_SHOTS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct MatchState {
    pub metadata: SourceMetadata,
    pub shots: Vec<DetectedShot>,
    pub movements: Vec<PlayerMovement>,
    pub court_coverage: f64,
    pub recovery_time: f64,
    /// Rallies closed during the run; empty when rally tracking is off.
    pub rally_lengths: Vec<u32>,
    pub unforced_errors: u32,
    pub winners: u32,
}

pub struct StatisticsSynthesizer {
    config: SynthesisConfig,
}

impl StatisticsSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    pub fn synthesize(&self, state: MatchState) -> AnalysisResult {
        let duration = state.metadata.duration_secs();
        let shot_breakdown = Self::breakdown(&state.shots);
        let placement_accuracy = self.placement_accuracy(&state.shots);
        let rally_lengths = if state.rally_lengths.is_empty() {
            self.estimate_rallies(state.shots.len(), duration)
        } else {
            state.rally_lengths
        };
        let overall_confidence = Self::overall_confidence(state.shots.len());

        let skill_scores = Self::skill_scores(&SkillInputs {
            shot_count: state.shots.len(),
            breakdown: &shot_breakdown,
            placement_accuracy,
            court_coverage: state.court_coverage,
            recovery_time: state.recovery_time,
            rally_lengths: &rally_lengths,
            unforced_errors: state.unforced_errors,
            winners: state.winners,
            overall_confidence,
        });

        AnalysisResult {
            video_duration: duration,
            total_frames: state.metadata.total_frames,
            fps: state.metadata.fps,
            shots: state.shots,
            shot_breakdown,
            movements: state.movements,
            court_coverage: state.court_coverage,
            avg_recovery_time: state.recovery_time,
            placement_accuracy,
            avg_reaction_time_ms: self.config.reaction_time_ms,
            rally_lengths,
            unforced_errors: state.unforced_errors,
            winners: state.winners,
            overall_confidence,
            skill_scores,
        }
    }

    pub fn breakdown(shots: &[DetectedShot]) -> ShotBreakdown {
        let mut breakdown = ShotBreakdown::new();
        for shot in shots {
            *breakdown.entry(shot.shot_type).or_insert(0) += 1;
        }
        breakdown
    }

    /// Spread of placed shots; wider placement reads as better control.
    pub fn placement_accuracy(&self, shots: &[DetectedShot]) -> f64 {
        let (xs, ys): (Vec<f64>, Vec<f64>) = shots.iter().filter_map(|s| s.placement).unzip();
        if xs.is_empty() {
            return self.config.default_placement_accuracy;
        }
        let spread = 100.0 * StatsHelper::variance(&xs) + 100.0 * StatsHelper::variance(&ys);
        (50.0 + spread).min(MAX_PLACEMENT_ACCURACY)
    }

    /// Evenly sized rallies inferred from the shot rate, or the placeholder list.
    pub fn estimate_rallies(&self, shot_count: usize, duration: f64) -> Vec<u32> {
        if shot_count > RALLY_ESTIMATE_MIN_SHOTS && duration > 0.0 {
            let avg_gap = duration / shot_count as f64;
            let estimate = (5.0 / avg_gap).round().max(3.0);
            if estimate.is_finite() && estimate <= u32::MAX as f64 {
                let estimate = estimate as u32;
                let rallies = vec![estimate; shot_count / estimate as usize];
                if !rallies.is_empty() {
                    return rallies;
                }
            }
        }
        self.config.placeholder_rallies.clone()
    }

    pub fn overall_confidence(shot_count: usize) -> f64 {
        if shot_count > CONFIDENT_SHOT_COUNT {
            (BASE_CONFIDENCE + 0.01 * shot_count as f64).min(MAX_CONFIDENCE)
        } else {
            BASE_CONFIDENCE
        }
    }

    fn skill_scores(inputs: &SkillInputs<'_>) -> SkillScores {
        let total = inputs.shot_count.max(1) as f64;
        let ratio = |shot_type: ShotType| {
            inputs.breakdown.get(&shot_type).copied().unwrap_or(0) as f64 / total
        };
        let winner_ratio = inputs.winners as f64 / total;
        let error_ratio = inputs.unforced_errors as f64 / total;
        let mean_rally = if inputs.rally_lengths.is_empty() {
            0.0
        } else {
            inputs.rally_lengths.iter().map(|&r| r as f64).sum::<f64>() / inputs.rally_lengths.len() as f64
        };

        let power = 50.0 + 30.0 * ratio(ShotType::Overhead) + 20.0 * ratio(ShotType::Drive);
        let finesse = 40.0
            + 30.0 * ratio(ShotType::Dink)
            + 20.0 * ratio(ShotType::Drop)
            + 0.1 * inputs.placement_accuracy;
        let speed = 30.0
            + 0.4 * inputs.court_coverage
            + 0.3 * (100.0 - 50.0 * inputs.recovery_time).max(0.0);
        let court_iq = 40.0
            + 5.0 * inputs.breakdown.len() as f64
            + 40.0 * winner_ratio
            + 0.15 * inputs.placement_accuracy;
        let consistency = 70.0 - 50.0 * error_ratio + 1.5 * mean_rally.min(20.0);

        let overall = inputs.overall_confidence;
        SkillScores {
            power: bounded_score(power),
            finesse: bounded_score(finesse),
            speed: bounded_score(speed),
            court_iq: bounded_score(court_iq),
            consistency: bounded_score(consistency),
            confidence: SkillConfidence {
                power: overall * 0.9,
                finesse: overall * 0.95,
                speed: overall * 0.85,
                court_iq: overall * 0.8,
                consistency: overall * 0.9,
            },
        }
    }
}

struct SkillInputs<'a> {
    shot_count: usize,
    breakdown: &'a ShotBreakdown,
    placement_accuracy: f64,
    court_coverage: f64,
    recovery_time: f64,
    rally_lengths: &'a [u32],
    unforced_errors: u32,
    winners: u32,
    overall_confidence: f64,
}

/// Truncates toward zero, then clamps to `[1, 99]`.
fn bounded_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 1;
    }
    raw.trunc().clamp(1.0, 99.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesizer() -> StatisticsSynthesizer {
        StatisticsSynthesizer::new(SynthesisConfig::default())
    }

    fn shot(frame_index: u64, shot_type: ShotType, placement: Option<(f64, f64)>) -> DetectedShot {
        DetectedShot {
            frame_index,
            timestamp: frame_index as f64 / 30.0,
            shot_type,
            player_id: 0,
            ball_speed: Some(25.0),
            placement,
            confidence: 0.7,
        }
    }

    fn state(shots: Vec<DetectedShot>, duration_secs: f64) -> MatchState {
        MatchState {
            metadata: SourceMetadata {
                fps: 30.0,
                total_frames: (duration_secs * 30.0) as u64,
            },
            shots,
            court_coverage: 50.0,
            recovery_time: 1.2,
            ..Default::default()
        }
    }

    #[test]
    fn empty_run_uses_documented_defaults() {
        let result = synthesizer().synthesize(state(Vec::new(), 10.0));
        let scores = result.skill_scores;
        assert_eq!(
            (scores.power, scores.finesse, scores.speed, scores.court_iq, scores.consistency),
            (50, 47, 62, 50, 79)
        );
        assert_eq!(result.placement_accuracy, 70.0);
        assert_eq!(result.rally_lengths, vec![5, 7, 4, 8, 6]);
        assert_eq!(result.overall_confidence, 0.5);
        assert_eq!(result.avg_reaction_time_ms, 300);
        assert!((scores.confidence.court_iq - 0.4).abs() < 1e-12);
        assert!((scores.confidence.finesse - 0.475).abs() < 1e-12);
        assert!(result.shot_breakdown.is_empty());
        assert!((result.video_duration - 10.0).abs() < 1e-9);
    }

    #[test]
    fn scores_are_clamped() {
        let mut input = state(vec![shot(0, ShotType::Drive, None)], 10.0);
        input.unforced_errors = 10;
        input.winners = 10;
        input.court_coverage = 100.0;
        input.recovery_time = 0.0;
        let scores = synthesizer().synthesize(input).skill_scores;
        assert_eq!(scores.consistency, 1);
        assert_eq!(scores.court_iq, 99);
        // 30 + 40 + 30
        assert_eq!(scores.speed, 99);
        assert_eq!(scores.power, 70);
    }

    #[test]
    fn histogram_counts_each_type() {
        let shots = vec![
            shot(0, ShotType::Drive, None),
            shot(10, ShotType::Dink, None),
            shot(20, ShotType::Drive, None),
        ];
        let breakdown = StatisticsSynthesizer::breakdown(&shots);
        assert_eq!(breakdown.get(&ShotType::Drive), Some(&2));
        assert_eq!(breakdown.get(&ShotType::Dink), Some(&1));
        assert_eq!(breakdown.len(), 2);
    }

    #[test]
    fn placement_accuracy_follows_variance() {
        let synth = synthesizer();
        let narrow = vec![
            shot(0, ShotType::Drive, Some((0.4, 0.5))),
            shot(10, ShotType::Drive, Some((0.6, 0.5))),
            shot(20, ShotType::Drive, None),
        ];
        assert!((synth.placement_accuracy(&narrow) - 51.0).abs() < 1e-9);
        let wide = vec![
            shot(0, ShotType::Lob, Some((0.0, 0.0))),
            shot(10, ShotType::Lob, Some((1.0, 1.0))),
        ];
        assert_eq!(synth.placement_accuracy(&wide), 95.0);
        assert_eq!(synth.placement_accuracy(&[shot(0, ShotType::Lob, None)]), 70.0);
    }

    #[test]
    fn rallies_estimated_from_shot_rate() {
        let synth = synthesizer();
        // One shot every five seconds floors the estimate at three.
        assert_eq!(synth.estimate_rallies(12, 60.0), vec![3, 3, 3, 3]);
        assert_eq!(synth.estimate_rallies(12, 6.0), vec![10]);
        // An estimate longer than the shot count leaves nothing to repeat.
        assert_eq!(synth.estimate_rallies(6, 1.0), vec![5, 7, 4, 8, 6]);
        assert_eq!(synth.estimate_rallies(5, 60.0), vec![5, 7, 4, 8, 6]);
        assert_eq!(synth.estimate_rallies(20, 0.0), vec![5, 7, 4, 8, 6]);
    }

    #[test]
    fn tracked_rallies_take_precedence() {
        let mut input = state(vec![shot(0, ShotType::Dink, None)], 5.0);
        input.rally_lengths = vec![20, 30];
        let result = synthesizer().synthesize(input);
        assert_eq!(result.rally_lengths, vec![20, 30]);
        // Mean rally is capped at 20: 70 - 0 + 30.
        assert_eq!(result.skill_scores.consistency, 99);
    }

    #[test]
    fn confidence_grows_with_shots_and_caps() {
        assert_eq!(StatisticsSynthesizer::overall_confidence(10), 0.5);
        assert!((StatisticsSynthesizer::overall_confidence(20) - 0.7).abs() < 1e-12);
        assert_eq!(StatisticsSynthesizer::overall_confidence(100), 0.95);
    }

    #[test]
    fn result_survives_json_round_trip() {
        let shots = (0..12u64)
            .map(|i| {
                let kind = if i % 3 == 0 { ShotType::Dink } else { ShotType::Drive };
                shot(i * 15, kind, Some((0.1 * i as f64 % 1.0, 0.5)))
            })
            .collect();
        let result = synthesizer().synthesize(state(shots, 30.0));
        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.shot_breakdown, result.shot_breakdown);
        assert_eq!(back.skill_scores.power, result.skill_scores.power);
        assert_eq!(back.skill_scores.finesse, result.skill_scores.finesse);
        assert_eq!(back.skill_scores.consistency, result.skill_scores.consistency);
        assert!(json.contains("\"drive\":8"));

        let report = serde_json::to_value(result.to_report()).unwrap();
        assert_eq!(report["shots"][0]["type"], "dink");
        assert_eq!(report["avatar_stats"]["power"], result.skill_scores.power);
    }
}
