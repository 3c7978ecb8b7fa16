pub mod images;
pub mod landmarks;

pub use images::ImageSequenceSource;
pub use landmarks::LandmarkSidecar;
