#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn length(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }

    /// Absolute inclination in degrees, `[0, 180]`.
    pub fn angle_deg(&self) -> f64 {
        (self.y2 - self.y1).atan2(self.x2 - self.x1).to_degrees().abs()
    }

    pub fn midpoint(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Intersection of the two infinite lines through the segments.
    pub fn intersect(&self, other: &Segment) -> Option<(f64, f64)> {
        let (dx1, dy1) = (self.x2 - self.x1, self.y2 - self.y1);
        let (dx2, dy2) = (other.x2 - other.x1, other.y2 - other.y1);
        let denom = dx1 * dy2 - dy1 * dx2;
        if denom.abs() < 1e-9 {
            return None;
        }
        let t = ((other.x1 - self.x1) * dy2 - (other.y1 - self.y1) * dx2) / denom;
        Some((self.x1 + t * dx1, self.y1 + t * dy1))
    }
}
