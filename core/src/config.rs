use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub sampling: SamplingConfig,
    pub ball: BallConfig,
    pub court: CourtConfig,
    pub player: PlayerConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    pub target_rate: f64,
    /// Source seconds during which court calibration is attempted.
    pub calibration_window_secs: f64,
    /// Minimum source seconds between two recorded shots.
    pub debounce_secs: f64,
    pub shot_confidence: f64,
    /// Close a rally once the ball has been unseen this long. `None` disables rally tracking.
    pub rally_gap_secs: Option<f64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            target_rate: 10.0,
            calibration_window_secs: 2.0,
            debounce_secs: 0.3,
            shot_confidence: 0.7,
            rally_gap_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BallConfig {
    /// Inclusive HSV lower bound, hue in [0, 180).
    pub hsv_lower: [u8; 3],
    pub hsv_upper: [u8; 3],
    pub kernel_size: usize,
    pub erode_iterations: usize,
    pub dilate_iterations: usize,
    pub min_area: f64,
    pub max_area: f64,
    pub min_circularity: f64,
    pub history_capacity: usize,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            hsv_lower: [20, 100, 100],
            hsv_upper: [40, 255, 255],
            kernel_size: 5,
            erode_iterations: 1,
            dilate_iterations: 2,
            min_area: 50.0,
            max_area: 5000.0,
            min_circularity: 0.5,
            history_capacity: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CourtConfig {
    pub blur_kernel: usize,
    pub canny_low: f32,
    pub canny_high: f32,
    pub hough_threshold: u32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
    /// Segments within this many degrees of horizontal or vertical are kept.
    pub axis_tolerance_deg: f64,
    pub court_width: f64,
    pub court_height: f64,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            hough_threshold: 100,
            min_line_length: 100.0,
            max_line_gap: 10.0,
            axis_tolerance_deg: 15.0,
            court_width: 400.0,
            court_height: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub history_capacity: usize,
    pub coverage_min_samples: usize,
    pub coverage_scale: f64,
    pub default_coverage: f64,
    /// Placeholder; recovery is not measured from data.
    pub recovery_time_secs: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            history_capacity: 60,
            coverage_min_samples: 10,
            coverage_scale: 200.0,
            default_coverage: 50.0,
            recovery_time_secs: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub default_placement_accuracy: f64,
    pub placeholder_rallies: Vec<u32>,
    /// Placeholder; reaction time is not measured from data.
    pub reaction_time_ms: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            default_placement_accuracy: 70.0,
            placeholder_rallies: vec![5, 7, 4, 8, 6],
            reaction_time_ms: 300,
        }
    }
}
