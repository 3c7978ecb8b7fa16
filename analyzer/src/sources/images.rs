use rallycore::interface::{Frame, FrameSource, SourceMetadata};
use rallycore::prelude::{CoreError, CoreResult};
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frame source backed by a directory of still images, played back in file-name order.
pub struct ImageSequenceSource {
    dir: PathBuf,
    fps: f64,
    files: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequenceSource {
    pub fn new<P: AsRef<Path>>(dir: P, fps: f64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            fps,
            files: Vec::new(),
            cursor: 0,
        }
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    fn decode(path: &Path) -> CoreResult<Frame> {
        let image = image::open(path)
            .map_err(|err| CoreError::InvalidInput(format!("decoding {}: {}", path.display(), err)))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        Frame::from_rgb(width as usize, height as usize, image.into_raw())
    }
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self) -> CoreResult<SourceMetadata> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|err| CoreError::SourceOpen(format!("{}: {}", self.dir.display(), err)))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Self::is_image(path))
            .collect();
        if files.is_empty() {
            return Err(CoreError::SourceOpen(format!(
                "no images in {}",
                self.dir.display()
            )));
        }
        files.sort();
        self.files = files;
        self.cursor = 0;
        Ok(SourceMetadata {
            fps: self.fps,
            total_frames: self.files.len() as u64,
        })
    }

    fn next_frame(&mut self) -> CoreResult<Option<Frame>> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let frame = Self::decode(path)?;
        self.cursor += 1;
        Ok(Some(frame))
    }

    fn skip_frame(&mut self) -> CoreResult<bool> {
        if self.cursor >= self.files.len() {
            return Ok(false);
        }
        self.cursor += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn write_frame(dir: &Path, name: &str, color: [u8; 3]) {
        RgbImage::from_pixel(8, 6, Rgb(color)).save(dir.join(name)).unwrap();
    }

    #[test]
    fn plays_images_in_name_order() {
        let dir = tempdir().unwrap();
        write_frame(dir.path(), "frame_002.png", [0, 0, 255]);
        write_frame(dir.path(), "frame_000.png", [255, 0, 0]);
        write_frame(dir.path(), "frame_001.bmp", [0, 255, 0]);
        fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let mut source = ImageSequenceSource::new(dir.path(), 25.0);
        let metadata = source.open().unwrap();
        assert_eq!(metadata.total_frames, 3);
        assert_eq!(metadata.fps, 25.0);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!((first.width(), first.height()), (8, 6));
        assert_eq!(first.pixel(3, 3), [255, 0, 0]);
        assert!(source.skip_frame().unwrap());
        assert_eq!(source.next_frame().unwrap().unwrap().pixel(0, 0), [0, 0, 255]);
        assert!(source.next_frame().unwrap().is_none());
        assert!(!source.skip_frame().unwrap());
    }

    #[test]
    fn missing_or_empty_directory_fails_to_open() {
        let dir = tempdir().unwrap();
        let err = ImageSequenceSource::new(dir.path(), 30.0).open().unwrap_err();
        assert!(matches!(err, CoreError::SourceOpen(_)));
        let err = ImageSequenceSource::new(dir.path().join("absent"), 30.0)
            .open()
            .unwrap_err();
        assert!(matches!(err, CoreError::SourceOpen(_)));
    }

    #[test]
    fn corrupt_image_is_a_read_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.png"), b"not really a png").unwrap();
        let mut source = ImageSequenceSource::new(dir.path(), 30.0);
        source.open().unwrap();
        assert!(source.next_frame().is_err());
    }
}
