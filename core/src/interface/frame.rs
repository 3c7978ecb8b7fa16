use crate::prelude::{CoreError, CoreResult};
use ndarray::{Array3, ArrayView3};
use opencv::{
    core::{Mat, Scalar, CV_8UC3},
    prelude::*,
};

/// One decoded video frame, stored as `height x width x 3` RGB samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Array3<u8>,
}

impl Frame {
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let pixels = Array3::from_shape_fn((height, width, 3), |(_, _, c)| rgb[c]);
        Self { pixels }
    }

    pub fn from_rgb(width: usize, height: usize, data: Vec<u8>) -> CoreResult<Self> {
        let pixels = Array3::from_shape_vec((height, width, 3), data).map_err(|err| {
            CoreError::InvalidInput(format!("frame {}x{}: {}", width, height, err))
        })?;
        Ok(Self { pixels })
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        [
            self.pixels[[y, x, 0]],
            self.pixels[[y, x, 1]],
            self.pixels[[y, x, 2]],
        ]
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    /// Copies the samples into an 8-bit, 3-channel `Mat` in RGB order.
    pub fn to_mat(&self) -> CoreResult<Mat> {
        let mut mat = Mat::new_rows_cols_with_default(
            self.height() as i32,
            self.width() as i32,
            CV_8UC3,
            Scalar::all(0.0),
        )?;
        let bytes = mat.data_bytes_mut()?;
        for (dst, src) in bytes.iter_mut().zip(self.pixels.iter()) {
            *dst = *src;
        }
        Ok(mat)
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x < self.width() && y < self.height() {
            for (c, value) in rgb.iter().enumerate() {
                self.pixels[[y, x, c]] = *value;
            }
        }
    }

    /// Paints a filled disc; parts outside the frame are clipped.
    pub fn fill_disc(&mut self, cx: f64, cy: f64, radius: f64, rgb: [u8; 3]) {
        let x0 = (cx - radius).floor().max(0.0) as usize;
        let y0 = (cy - radius).floor().max(0.0) as usize;
        let x1 = ((cx + radius).ceil().max(0.0) as usize).min(self.width());
        let y1 = ((cy + radius).ceil().max(0.0) as usize).min(self.height());
        let r2 = radius * radius;
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.set_pixel(x, y, rgb);
                }
            }
        }
    }

    /// Paints an axis-aligned rectangle `[x, x + w) x [y, y + h)`.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, rgb: [u8; 3]) {
        let x1 = (x + w).min(self.width());
        let y1 = (y + h).min(self.height());
        for yy in y..y1 {
            for xx in x..x1 {
                self.set_pixel(xx, yy, rgb);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgb_rejects_short_buffer() {
        assert!(Frame::from_rgb(4, 4, vec![0; 10]).is_err());
        let frame = Frame::from_rgb(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.pixel(1, 0), [4, 5, 6]);
    }

    #[test]
    fn to_mat_keeps_layout() {
        let frame = Frame::from_rgb(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let mat = frame.to_mat().unwrap();
        assert_eq!((mat.rows(), mat.cols(), mat.channels()), (1, 2, 3));
        assert_eq!(mat.data_bytes().unwrap(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn fill_disc_clips_at_border() {
        let mut frame = Frame::filled(10, 10, [0, 0, 0]);
        frame.fill_disc(0.0, 0.0, 3.0, [255, 0, 0]);
        assert_eq!(frame.pixel(0, 0), [255, 0, 0]);
        assert_eq!(frame.pixel(9, 9), [0, 0, 0]);
    }
}
