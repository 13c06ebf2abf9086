// THEORY:
// The `sampler` module bridges a live video feed and the scorer. Each tick
// it asks the source to render its current frame into a scratch raster of
// the session's fixed size, then reads the buffer back as an immutable
// `Snapshot`. Sources that have no frame to offer (device warming up,
// stream stalled) simply report not-ready and the tick is skipped without
// touching any session state.

use crate::core_modules::snapshot::{RasterSize, Snapshot};
use crate::error::CaptureError;

/// Result of asking a source for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFrame {
    /// The frame was rendered into the raster buffer.
    Rendered,
    /// The source has no frame yet; the caller skips this tick.
    NotReady,
}

/// A live video feed that can render its current frame into a fixed raster.
pub trait VideoSource: Send {
    /// Acquires the underlying device or stream. Called once at monitor
    /// start; failure aborts the start.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Renders the current frame into `raster` as row-major RGBA covering
    /// exactly `size.byte_len()` bytes.
    fn render_frame(
        &mut self,
        size: RasterSize,
        raster: &mut [u8],
    ) -> Result<SourceFrame, CaptureError>;

    /// Releases the underlying device or stream. Called once when the
    /// session ends.
    fn close(&mut self) {}
}

/// Captures one snapshot per tick from a boxed source, reusing a single
/// scratch raster between ticks.
pub struct FrameSampler {
    source: Box<dyn VideoSource>,
    size: RasterSize,
    raster: Vec<u8>,
}

impl FrameSampler {
    pub fn new(source: Box<dyn VideoSource>, size: RasterSize) -> Self {
        Self {
            source,
            size,
            raster: vec![0; size.byte_len()],
        }
    }

    pub fn size(&self) -> RasterSize {
        self.size
    }

    /// Acquires the video source.
    pub fn open(&mut self) -> Result<(), CaptureError> {
        self.source.open()
    }

    /// Captures one snapshot, or `None` when the source is not ready.
    pub fn sample(&mut self) -> Result<Option<Snapshot>, CaptureError> {
        match self.source.render_frame(self.size, &mut self.raster)? {
            SourceFrame::NotReady => Ok(None),
            SourceFrame::Rendered => {
                let snapshot = Snapshot::from_rgba(self.size, self.raster.clone())?;
                Ok(Some(snapshot))
            }
        }
    }

    /// Releases the video source.
    pub fn close(&mut self) {
        self.source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source that renders a fixed level, with scripted not-ready ticks.
    struct Scripted {
        level: u8,
        unready_ticks: usize,
    }

    impl Scripted {
        fn new(level: u8, unready_ticks: usize) -> Self {
            Self {
                level,
                unready_ticks,
            }
        }
    }

    impl VideoSource for Scripted {
        fn open(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }

        fn render_frame(
            &mut self,
            _size: RasterSize,
            raster: &mut [u8],
        ) -> Result<SourceFrame, CaptureError> {
            if self.unready_ticks > 0 {
                self.unready_ticks -= 1;
                return Ok(SourceFrame::NotReady);
            }
            raster.fill(self.level);
            Ok(SourceFrame::Rendered)
        }
    }

    #[test]
    fn unready_source_yields_no_snapshot() {
        let size = RasterSize::new(2, 2);
        let mut sampler = FrameSampler::new(Box::new(Scripted::new(7, 1)), size);
        sampler.open().unwrap();
        assert!(sampler.sample().unwrap().is_none());
        let snapshot = sampler.sample().unwrap().unwrap();
        assert_eq!(snapshot.rgba().to_vec(), vec![7; size.byte_len()]);
    }

    #[test]
    fn snapshots_are_independent_of_the_scratch_raster() {
        let size = RasterSize::new(2, 2);
        let mut sampler = FrameSampler::new(Box::new(Scripted::new(1, 0)), size);
        sampler.open().unwrap();
        let first = sampler.sample().unwrap().unwrap();
        // Render a second frame over the scratch buffer.
        let _second = sampler.sample().unwrap().unwrap();
        assert_eq!(first.rgba().to_vec(), vec![1; size.byte_len()]);
    }
}
