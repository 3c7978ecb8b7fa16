pub mod geometry;
pub mod stats;

pub use geometry::Segment;
pub use stats::StatsHelper;
