// THEORY:
// Stand-in video feeds. A real deployment plugs a camera backend in behind
// the `VideoSource` trait; this module ships the two feeds that need no
// hardware at all: a scripted synthetic painter for demos and deterministic
// tests, and a directory of still images played back as frames. Both go
// through the exact same sampling path as a live camera would.

use std::path::PathBuf;

use image::imageops::FilterType;
use tracing::{debug, info};

use crate::core_modules::sampler::{SourceFrame, VideoSource};
use crate::core_modules::snapshot::{BYTES_PER_PIXEL, RasterSize};
use crate::error::CaptureError;

/// Scripted video source: a closure paints each frame into the raster.
/// Returning `false` marks the tick as not ready. The closure receives the
/// index of the frame being requested, starting at zero.
pub struct SyntheticSource<F> {
    paint: F,
    frame_index: u64,
}

impl<F> SyntheticSource<F>
where
    F: FnMut(u64, RasterSize, &mut [u8]) -> bool + Send,
{
    pub fn new(paint: F) -> Self {
        Self {
            paint,
            frame_index: 0,
        }
    }
}

impl<F> VideoSource for SyntheticSource<F>
where
    F: FnMut(u64, RasterSize, &mut [u8]) -> bool + Send,
{
    fn open(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn render_frame(
        &mut self,
        size: RasterSize,
        raster: &mut [u8],
    ) -> Result<SourceFrame, CaptureError> {
        let ready = (self.paint)(self.frame_index, size, raster);
        self.frame_index += 1;
        if ready {
            Ok(SourceFrame::Rendered)
        } else {
            Ok(SourceFrame::NotReady)
        }
    }
}

/// Source that plays a scripted sequence of flat gray frames, then reports
/// not-ready forever. The workhorse of the deterministic tests.
pub fn flat_level_frames(levels: Vec<u8>) -> impl VideoSource {
    SyntheticSource::new(move |index, _size, raster| match levels.get(index as usize) {
        Some(&level) => {
            paint_flat(raster, level);
            true
        }
        None => false,
    })
}

/// Fills a raster with one opaque gray level.
pub fn paint_flat(raster: &mut [u8], level: u8) {
    for px in raster.chunks_exact_mut(BYTES_PER_PIXEL) {
        px[0] = level;
        px[1] = level;
        px[2] = level;
        px[3] = 255;
    }
}

/// Plays a directory of still images (sorted by file name) as a video feed,
/// decoding and resizing each one to the session raster.
pub struct ImageSequenceSource {
    dir: PathBuf,
    frames: Vec<PathBuf>,
    next: usize,
    loop_frames: bool,
}

impl ImageSequenceSource {
    pub fn new(dir: impl Into<PathBuf>, loop_frames: bool) -> Self {
        Self {
            dir: dir.into(),
            frames: Vec::new(),
            next: 0,
            loop_frames,
        }
    }
}

impl VideoSource for ImageSequenceSource {
    fn open(&mut self) -> Result<(), CaptureError> {
        let mut frames = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase());
            if matches!(extension.as_deref(), Some("png" | "jpg" | "jpeg" | "bmp")) {
                frames.push(path);
            }
        }
        frames.sort();
        if frames.is_empty() {
            return Err(CaptureError::SourceUnavailable(format!(
                "no image frames under {}",
                self.dir.display()
            )));
        }
        info!(frames = frames.len(), dir = %self.dir.display(), "image sequence opened");
        self.frames = frames;
        self.next = 0;
        Ok(())
    }

    fn render_frame(
        &mut self,
        size: RasterSize,
        raster: &mut [u8],
    ) -> Result<SourceFrame, CaptureError> {
        if self.next >= self.frames.len() {
            if self.loop_frames {
                self.next = 0;
            } else {
                return Ok(SourceFrame::NotReady);
            }
        }
        let index = self.next;
        self.next += 1;
        let path = &self.frames[index];

        let decoded = image::open(path)?;
        let resized = decoded
            .resize_exact(size.width, size.height, FilterType::Triangle)
            .to_rgba8();
        raster.copy_from_slice(resized.as_raw());
        debug!(frame = %path.display(), "image frame rendered");
        Ok(SourceFrame::Rendered)
    }

    fn close(&mut self) {
        self.frames.clear();
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::sampler::FrameSampler;
    use crate::core_modules::snapshot::Snapshot;

    #[test]
    fn flat_level_frames_run_out() {
        let size = RasterSize::new(2, 2);
        let mut sampler = FrameSampler::new(Box::new(flat_level_frames(vec![5, 9])), size);
        sampler.open().unwrap();
        assert_eq!(
            sampler.sample().unwrap(),
            Some(Snapshot::filled(size, [5, 5, 5, 255]))
        );
        assert_eq!(
            sampler.sample().unwrap(),
            Some(Snapshot::filled(size, [9, 9, 9, 255]))
        );
        assert_eq!(sampler.sample().unwrap(), None);
    }

    #[test]
    fn empty_frame_dir_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageSequenceSource::new(dir.path(), false);
        assert!(matches!(
            source.open(),
            Err(CaptureError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn image_sequence_plays_in_name_order_and_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let size = RasterSize::new(4, 4);
        // Write the frames at a different resolution than the raster.
        for (name, level) in [("frame_000.png", 0u8), ("frame_001.png", 255u8)] {
            Snapshot::filled(RasterSize::new(8, 8), [level, level, level, 255])
                .write_png(&dir.path().join(name))
                .unwrap();
        }

        let mut sampler =
            FrameSampler::new(Box::new(ImageSequenceSource::new(dir.path(), false)), size);
        sampler.open().unwrap();
        let first = sampler.sample().unwrap().unwrap();
        let second = sampler.sample().unwrap().unwrap();
        assert_eq!(first, Snapshot::filled(size, [0, 0, 0, 255]));
        assert_eq!(second, Snapshot::filled(size, [255, 255, 255, 255]));
        assert_eq!(sampler.sample().unwrap(), None);
    }

    #[test]
    fn looping_sequence_wraps_around() {
        let dir = tempfile::tempdir().unwrap();
        let size = RasterSize::new(2, 2);
        Snapshot::filled(size, [40, 40, 40, 255])
            .write_png(&dir.path().join("only.png"))
            .unwrap();

        let mut source = ImageSequenceSource::new(dir.path(), true);
        source.open().unwrap();
        let mut raster = vec![0; size.byte_len()];
        for _ in 0..3 {
            assert_eq!(
                source.render_frame(size, &mut raster).unwrap(),
                SourceFrame::Rendered
            );
        }
    }
}
