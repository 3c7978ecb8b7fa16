use crate::config::{CourtConfig, PipelineConfig};
use crate::interface::Frame;
use crate::math::geometry::Segment;
use crate::prelude::{CoreError, CoreResult, FrameStage, SampledFrame};
use crate::telemetry::log::LogManager;
use opencv::{
    core::{self, Mat, Point2d, Point2f, Size, Vec4i, Vector},
    imgproc,
    prelude::*,
};
use std::f64::consts::PI;

/// Minimum separation between opposite court lines, as a share of the frame size.
const MIN_LINE_SEPARATION: f64 = 0.1;
/// How far outside the frame a derived corner may fall, as a share of the frame size.
const CORNER_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct CourtCalibration {
    pub corners: [(f64, f64); 4],
    pub transform: [[f64; 3]; 3],
    court_size: (f64, f64),
}

impl CourtCalibration {
    /// `None` when the corners do not span a proper quadrilateral.
    pub fn from_corners(
        corners: [(f64, f64); 4],
        court_width: f64,
        court_height: f64,
    ) -> CoreResult<Option<Self>> {
        let target = [
            (0.0, 0.0),
            (court_width, 0.0),
            (court_width, court_height),
            (0.0, court_height),
        ];
        let to_points = |points: &[(f64, f64); 4]| -> Vector<Point2f> {
            points
                .iter()
                .map(|&(x, y)| Point2f::new(x as f32, y as f32))
                .collect()
        };
        let matrix = imgproc::get_perspective_transform_def(&to_points(&corners), &to_points(&target))?;
        if core::determinant(&matrix)?.abs() < 1e-12 {
            return Ok(None);
        }

        let mut transform = [[0.0; 3]; 3];
        for (r, row) in transform.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = *matrix.at_2d::<f64>(r as i32, c as i32)?;
            }
        }
        Ok(Some(Self {
            corners,
            transform,
            court_size: (court_width, court_height),
        }))
    }

    /// Maps a pixel position to court coordinates clamped to `[0, 1]`.
    /// `None` for points on the transform's vanishing line.
    pub fn world_to_court(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let [_, _, [h20, h21, h22]] = self.transform;
        if (h20 * x + h21 * y + h22).abs() < 1e-12 {
            return None;
        }
        let matrix = Mat::from_slice_2d(&self.transform).ok()?;
        let source: Vector<Point2d> = std::iter::once(Point2d::new(x, y)).collect();
        let mut projected = Vector::<Point2d>::new();
        core::perspective_transform(&source, &mut projected, &matrix).ok()?;
        let point = projected.get(0).ok()?;
        if !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        Some((
            (point.x / self.court_size.0).clamp(0.0, 1.0),
            (point.y / self.court_size.1).clamp(0.0, 1.0),
        ))
    }
}

pub struct CourtCalibrator {
    config: Option<CourtConfig>,
    calibration: Option<CourtCalibration>,
    attempts: usize,
    logger: LogManager,
}

impl CourtCalibrator {
    pub fn new() -> Self {
        Self {
            config: None,
            calibration: None,
            attempts: 0,
            logger: LogManager::new("court"),
        }
    }

    pub fn calibration(&self) -> Option<&CourtCalibration> {
        self.calibration.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Straight segments within `axis_tolerance_deg` of horizontal or vertical.
    pub fn court_lines(frame: &Frame, config: &CourtConfig) -> CoreResult<Vec<Segment>> {
        let rgb = frame.to_mat()?;
        let mut gray = Mat::default();
        imgproc::cvt_color_def(&rgb, &mut gray, imgproc::COLOR_RGB2GRAY)?;
        let kernel = config.blur_kernel as i32;
        let mut blurred = Mat::default();
        imgproc::gaussian_blur_def(&gray, &mut blurred, Size::new(kernel, kernel), 0.0)?;
        let mut edges = Mat::default();
        imgproc::canny_def(&blurred, &mut edges, config.canny_low as f64, config.canny_high as f64)?;

        let mut raw = Vector::<Vec4i>::new();
        imgproc::hough_lines_p(
            &edges,
            &mut raw,
            1.0,
            PI / 180.0,
            config.hough_threshold as i32,
            config.min_line_length,
            config.max_line_gap,
        )?;

        let tolerance = config.axis_tolerance_deg;
        Ok(raw
            .iter()
            .map(|l| Segment::new(l[0] as f64, l[1] as f64, l[2] as f64, l[3] as f64))
            .filter(|segment| {
                let angle = segment.angle_deg();
                let from_horizontal = angle.min(180.0 - angle);
                from_horizontal < tolerance || from_horizontal > 90.0 - tolerance
            })
            .collect())
    }

    /// Derives the four court corners from the outermost horizontal and
    /// vertical lines. Frequently yields nothing on real footage.
    pub fn find_corners(lines: &[Segment], width: f64, height: f64) -> Option<[(f64, f64); 4]> {
        if lines.len() < 4 {
            return None;
        }
        let is_horizontal = |s: &Segment| -> bool {
            let angle = s.angle_deg();
            angle.min(180.0 - angle) < 45.0
        };
        let (horizontal, vertical): (Vec<&Segment>, Vec<&Segment>) =
            lines.iter().partition(|s| is_horizontal(*s));
        if horizontal.len() < 2 || vertical.len() < 2 {
            return None;
        }

        let (top, bottom) = extremes(&horizontal, |s| s.midpoint().1)?;
        let (left, right) = extremes(&vertical, |s| s.midpoint().0)?;
        if bottom.midpoint().1 - top.midpoint().1 < MIN_LINE_SEPARATION * height
            || right.midpoint().0 - left.midpoint().0 < MIN_LINE_SEPARATION * width
        {
            return None;
        }

        let corners = [
            top.intersect(left)?,
            top.intersect(right)?,
            bottom.intersect(right)?,
            bottom.intersect(left)?,
        ];
        let (mx, my) = (CORNER_TOLERANCE * width, CORNER_TOLERANCE * height);
        let inside = corners
            .iter()
            .all(|&(x, y)| x >= -mx && x <= width + mx && y >= -my && y <= height + my);
        if !inside || !is_convex(&corners) {
            return None;
        }
        Some(corners)
    }
}

fn extremes<'a>(items: &[&'a Segment], key: fn(&Segment) -> f64) -> Option<(&'a Segment, &'a Segment)> {
    let min = items.iter().copied().min_by(|a, b| key(*a).total_cmp(&key(*b)))?;
    let max = items.iter().copied().max_by(|a, b| key(*a).total_cmp(&key(*b)))?;
    Some((min, max))
}

fn is_convex(quad: &[(f64, f64); 4]) -> bool {
    let crosses: Vec<f64> = (0..4)
        .map(|i| {
            let a = quad[i];
            let b = quad[(i + 1) % 4];
            let c = quad[(i + 2) % 4];
            (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0)
        })
        .collect();
    crosses.iter().all(|&c| c > 0.0) || crosses.iter().all(|&c| c < 0.0)
}

impl Default for CourtCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStage for CourtCalibrator {
    type Output = bool;

    fn initialize(&mut self, config: &PipelineConfig) -> CoreResult<()> {
        if config.court.court_width <= 0.0 || config.court.court_height <= 0.0 {
            return Err(CoreError::InvalidInput("court dimensions must be positive".into()));
        }
        if config.court.blur_kernel % 2 == 0 {
            return Err(CoreError::InvalidInput("court blur kernel must be odd".into()));
        }
        self.config = Some(config.court.clone());
        Ok(())
    }

    fn process(&mut self, input: &SampledFrame<'_>) -> CoreResult<Self::Output> {
        if self.calibration.is_some() {
            return Ok(true);
        }
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| CoreError::Internal("court calibrator not initialized".into()))?;

        self.attempts += 1;
        let frame = input.frame;
        let lines = Self::court_lines(frame, config)?;
        self.calibration =
            match Self::find_corners(&lines, frame.width() as f64, frame.height() as f64) {
                Some(corners) => {
                    CourtCalibration::from_corners(corners, config.court_width, config.court_height)?
                }
                None => None,
            };

        match &self.calibration {
            Some(calibration) => self.logger.record(&format!(
                "court calibrated at frame {} corners {:?}",
                input.index, calibration.corners
            )),
            None => self.logger.trace(&format!(
                "frame {}: {} court lines, no calibration",
                input.index,
                lines.len()
            )),
        }
        Ok(self.calibration.is_some())
    }

    fn reset(&mut self) {
        self.calibration = None;
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: [u8; 3] = [40, 90, 140];
    const LINE: [u8; 3] = [250, 250, 250];

    fn court_frame() -> Frame {
        let mut frame = Frame::filled(400, 300, SURFACE);
        frame.fill_rect(50, 50, 300, 3, LINE);
        frame.fill_rect(50, 247, 300, 3, LINE);
        frame.fill_rect(50, 50, 3, 200, LINE);
        frame.fill_rect(347, 50, 3, 200, LINE);
        frame
    }

    fn sampled(frame: &Frame) -> SampledFrame<'_> {
        SampledFrame {
            frame,
            index: 0,
            timestamp: 0.0,
        }
    }

    #[test]
    fn blank_frame_yields_no_calibration() {
        let mut calibrator = CourtCalibrator::new();
        calibrator.initialize(&PipelineConfig::default()).unwrap();
        let frame = Frame::filled(200, 150, SURFACE);
        assert!(!calibrator.process(&sampled(&frame)).unwrap());
        assert!(calibrator.calibration().is_none());
        assert_eq!(calibrator.attempts(), 1);
    }

    #[test]
    fn court_outline_calibrates_once() {
        let mut calibrator = CourtCalibrator::new();
        calibrator.initialize(&PipelineConfig::default()).unwrap();
        let frame = court_frame();
        assert!(calibrator.process(&sampled(&frame)).unwrap());
        let calibration = calibrator.calibration().unwrap().clone();
        let (u, v) = calibration.world_to_court(200.0, 150.0).unwrap();
        assert!((u - 0.5).abs() < 0.05 && (v - 0.5).abs() < 0.05, "({}, {})", u, v);
        assert_eq!(calibration.world_to_court(0.0, 0.0), Some((0.0, 0.0)));

        // Established calibrations are not recomputed.
        let blank = Frame::filled(400, 300, SURFACE);
        assert!(calibrator.process(&sampled(&blank)).unwrap());
        assert_eq!(calibrator.attempts(), 1);
        assert_eq!(calibrator.calibration(), Some(&calibration));
    }

    #[test]
    fn corners_need_both_orientations() {
        let lines = vec![
            Segment::new(0.0, 10.0, 200.0, 10.0),
            Segment::new(0.0, 90.0, 200.0, 90.0),
            Segment::new(0.0, 150.0, 200.0, 150.0),
            Segment::new(20.0, 0.0, 20.0, 180.0),
        ];
        assert!(CourtCalibrator::find_corners(&lines, 200.0, 200.0).is_none());
    }

    #[test]
    fn corners_from_outermost_lines() {
        let lines = vec![
            Segment::new(10.0, 20.0, 190.0, 20.0),
            Segment::new(10.0, 100.0, 190.0, 100.0),
            Segment::new(10.0, 180.0, 190.0, 180.0),
            Segment::new(15.0, 10.0, 15.0, 190.0),
            Segment::new(185.0, 10.0, 185.0, 190.0),
        ];
        let corners = CourtCalibrator::find_corners(&lines, 200.0, 200.0).unwrap();
        assert_eq!(corners, [(15.0, 20.0), (185.0, 20.0), (185.0, 180.0), (15.0, 180.0)]);
    }

    #[test]
    fn vanishing_line_has_no_court_position() {
        let corners = [(100.0, 100.0), (300.0, 100.0), (380.0, 200.0), (20.0, 200.0)];
        let calibration = CourtCalibration::from_corners(corners, 400.0, 200.0)
            .unwrap()
            .unwrap();
        let (u, v) = calibration.world_to_court(200.0, 150.0).unwrap();
        assert!((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v));

        let [_, _, [_, h21, h22]] = calibration.transform;
        assert!(calibration.world_to_court(0.0, -h22 / h21).is_none());
    }

    #[test]
    fn collinear_corners_are_rejected() {
        let corners = [(0.0, 0.0), (50.0, 0.0), (100.0, 0.0), (150.0, 0.0)];
        assert!(CourtCalibration::from_corners(corners, 400.0, 200.0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn uninitialized_calibrator_errors() {
        let frame = court_frame();
        assert!(CourtCalibrator::new().process(&sampled(&frame)).is_err());
    }
}
