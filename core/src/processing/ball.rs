use crate::config::{BallConfig, PipelineConfig};
use crate::interface::{BallObservation, Frame};
use crate::prelude::{CoreError, CoreResult, FrameStage, SampledFrame};
use crate::processing::history::RingHistory;
use crate::telemetry::log::LogManager;
use opencv::{
    core::{self, Mat, Point, Scalar, Size, Vector},
    imgproc,
};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallCandidate {
    pub centroid: (f64, f64),
    pub area: f64,
    pub circularity: f64,
}

/// Colour-blob ball detector that also keeps the recent ball trajectory.
pub struct BallDetector {
    config: Option<BallConfig>,
    history: RingHistory<BallObservation>,
    last_position: Option<(f64, f64)>,
    velocity: (f64, f64),
    logger: LogManager,
}

impl BallDetector {
    pub fn new() -> Self {
        Self {
            config: None,
            history: RingHistory::with_capacity(BallConfig::default().history_capacity),
            last_position: None,
            velocity: (0.0, 0.0),
            logger: LogManager::new("ball"),
        }
    }

    /// Locates the most circular in-band blob whose area is within limits.
    pub fn find_candidate(frame: &Frame, config: &BallConfig) -> CoreResult<Option<BallCandidate>> {
        let rgb = frame.to_mat()?;
        let mut hsv = Mat::default();
        imgproc::cvt_color_def(&rgb, &mut hsv, imgproc::COLOR_RGB2HSV)?;

        let bound = |band: [u8; 3]| Scalar::new(band[0] as f64, band[1] as f64, band[2] as f64, 0.0);
        let mut mask = Mat::default();
        core::in_range(&hsv, &bound(config.hsv_lower), &bound(config.hsv_upper), &mut mask)?;

        let size = config.kernel_size as i32;
        let kernel = imgproc::get_structuring_element(
            imgproc::MORPH_RECT,
            Size::new(size, size),
            Point::new(-1, -1),
        )?;
        let border = imgproc::morphology_default_border_value()?;
        let mut eroded = Mat::default();
        imgproc::erode(
            &mask,
            &mut eroded,
            &kernel,
            Point::new(-1, -1),
            config.erode_iterations as i32,
            core::BORDER_CONSTANT,
            border,
        )?;
        let mut cleaned = Mat::default();
        imgproc::dilate(
            &eroded,
            &mut cleaned,
            &kernel,
            Point::new(-1, -1),
            config.dilate_iterations as i32,
            core::BORDER_CONSTANT,
            border,
        )?;

        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &cleaned,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        let mut best: Option<BallCandidate> = None;
        for contour in contours.iter() {
            let area = imgproc::contour_area(&contour, false)?;
            if area < config.min_area || area > config.max_area {
                continue;
            }
            let perimeter = imgproc::arc_length(&contour, true)?;
            if perimeter <= 0.0 {
                continue;
            }
            let circularity = 4.0 * PI * area / (perimeter * perimeter);
            let best_so_far = best.map(|b| b.circularity).unwrap_or(0.0);
            if circularity <= config.min_circularity || circularity <= best_so_far {
                continue;
            }
            let moments = imgproc::moments(&contour, false)?;
            if moments.m00 == 0.0 {
                continue;
            }
            best = Some(BallCandidate {
                centroid: (moments.m10 / moments.m00, moments.m01 / moments.m00),
                area,
                circularity,
            });
        }
        Ok(best)
    }

    pub fn velocity(&self) -> (f64, f64) {
        self.velocity
    }

    /// Ball speed in pixels per sampled frame.
    pub fn speed(&self) -> f64 {
        self.velocity.0.hypot(self.velocity.1)
    }

    pub fn history(&self) -> &RingHistory<BallObservation> {
        &self.history
    }

    fn observe(&mut self, position: (f64, f64), input: &SampledFrame<'_>) {
        if let Some(previous) = self.last_position {
            self.velocity = (position.0 - previous.0, position.1 - previous.1);
        }
        self.last_position = Some(position);
        self.history.push(BallObservation {
            position,
            timestamp: input.timestamp,
            frame_index: input.index,
        });
    }
}

impl Default for BallDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStage for BallDetector {
    type Output = Option<(f64, f64)>;

    fn initialize(&mut self, config: &PipelineConfig) -> CoreResult<()> {
        if config.ball.kernel_size == 0 {
            return Err(CoreError::InvalidInput("ball kernel size must be positive".into()));
        }
        if config.ball.min_area > config.ball.max_area {
            return Err(CoreError::InvalidInput(format!(
                "ball area range [{}, {}] is empty",
                config.ball.min_area, config.ball.max_area
            )));
        }
        self.history = RingHistory::with_capacity(config.ball.history_capacity);
        self.config = Some(config.ball.clone());
        Ok(())
    }

    fn process(&mut self, input: &SampledFrame<'_>) -> CoreResult<Self::Output> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| CoreError::Internal("ball detector not initialized".into()))?;

        let Some(candidate) = Self::find_candidate(input.frame, config)? else {
            return Ok(None);
        };
        self.logger.trace(&format!(
            "frame {} ball at ({:.1}, {:.1}) area {:.0} circularity {:.2}",
            input.index, candidate.centroid.0, candidate.centroid.1, candidate.area, candidate.circularity
        ));
        self.observe(candidate.centroid, input);
        Ok(Some(candidate.centroid))
    }

    fn reset(&mut self) {
        self.history.reset();
        self.last_position = None;
        self.velocity = (0.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COURT: [u8; 3] = [30, 110, 60];
    const BALL: [u8; 3] = [230, 230, 40];

    fn sampled(frame: &Frame, index: u64) -> SampledFrame<'_> {
        SampledFrame {
            frame,
            index,
            timestamp: index as f64 / 30.0,
        }
    }

    fn initialized() -> BallDetector {
        let mut detector = BallDetector::new();
        detector.initialize(&PipelineConfig::default()).unwrap();
        detector
    }

    #[test]
    fn zero_kernel_is_rejected() {
        let mut config = PipelineConfig::default();
        config.ball.kernel_size = 0;
        assert!(BallDetector::new().initialize(&config).is_err());
    }

    #[test]
    fn process_requires_initialize() {
        let frame = Frame::filled(32, 32, COURT);
        let mut detector = BallDetector::new();
        assert!(detector.process(&sampled(&frame, 0)).is_err());
    }

    #[test]
    fn locates_ball_and_tracks_velocity() {
        let mut detector = initialized();
        let mut first = Frame::filled(160, 120, COURT);
        first.fill_disc(40.0, 50.0, 6.0, BALL);
        let position = detector.process(&sampled(&first, 0)).unwrap().unwrap();
        assert!((position.0 - 40.0).abs() < 1.0 && (position.1 - 50.0).abs() < 1.0);
        assert_eq!(detector.speed(), 0.0);

        let mut second = Frame::filled(160, 120, COURT);
        second.fill_disc(70.0, 50.0, 6.0, BALL);
        detector.process(&sampled(&second, 3)).unwrap().unwrap();
        assert!((detector.speed() - 30.0).abs() < 1.0);
        assert_eq!(detector.history().len(), 2);
        assert_eq!(detector.history().latest().unwrap().frame_index, 3);
    }

    #[test]
    fn ignores_regions_outside_area_limits() {
        let mut detector = initialized();
        let mut frame = Frame::filled(200, 200, COURT);
        // Too small to survive erosion + area filter, and a court-sized patch.
        frame.fill_disc(20.0, 20.0, 1.5, BALL);
        frame.fill_rect(80, 80, 100, 100, BALL);
        assert_eq!(detector.process(&sampled(&frame, 0)).unwrap(), None);
        assert!(detector.history().is_empty());
    }

    #[test]
    fn prefers_round_blob_over_bar() {
        let mut frame = Frame::filled(200, 120, COURT);
        frame.fill_rect(10, 10, 120, 6, BALL);
        frame.fill_disc(150.0, 80.0, 7.0, BALL);
        let candidate = BallDetector::find_candidate(&frame, &BallConfig::default())
            .unwrap()
            .unwrap();
        assert!((candidate.centroid.0 - 150.0).abs() < 1.0);
        assert!(candidate.circularity > 0.5 && candidate.circularity <= 1.05);
    }

    #[test]
    fn empty_frame_leaves_state_untouched() {
        let mut detector = initialized();
        let frame = Frame::filled(64, 64, COURT);
        assert_eq!(detector.process(&sampled(&frame, 0)).unwrap(), None);
        assert_eq!(detector.velocity(), (0.0, 0.0));
    }
}
