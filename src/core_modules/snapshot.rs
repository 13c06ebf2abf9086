// THEORY:
// The `snapshot` module is the "dumb" data layer of the monitor. A `Snapshot`
// is one captured frame's full RGBA pixel buffer at the raster resolution
// fixed when monitoring starts. It is deliberately inert: once captured it is
// never mutated, only compared against the next capture and then replaced
// wholesale.
//
// Key architectural principles:
// 1.  **Data Purity**: raw `u8` channel bytes, row-major, four bytes per
//     pixel, with no interpretation attached. All analysis lives in the
//     scorer.
// 2.  **Fixed Raster**: every snapshot in a session shares one `RasterSize`,
//     so any two snapshots the scorer compares cover the same pixel count.
// 3.  **Validated Construction**: the only way to build a `Snapshot` checks
//     the buffer length against the raster, so downstream code never has to
//     re-check bounds.

use std::path::Path;

use image::ImageEncoder;

use crate::error::CaptureError;

/// Number of interleaved channel bytes per pixel (R, G, B, A).
pub const BYTES_PER_PIXEL: usize = 4;

/// The capture resolution, fixed for the lifetime of a monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterSize {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

impl RasterSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels in the raster.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Expected byte length of an RGBA buffer covering the raster.
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }
}

/// One captured frame: the full RGBA pixel buffer of the session raster.
/// Immutable once captured; the scorer swaps whole snapshots between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    size: RasterSize,
    data: Vec<u8>,
}

impl Snapshot {
    /// Builds a snapshot from an RGBA byte buffer, validating that the
    /// buffer covers the raster exactly.
    pub fn from_rgba(size: RasterSize, data: Vec<u8>) -> Result<Self, CaptureError> {
        if data.len() != size.byte_len() {
            return Err(CaptureError::RasterMismatch {
                expected: size.byte_len(),
                actual: data.len(),
            });
        }
        Ok(Self { size, data })
    }

    /// Builds a snapshot with every pixel set to the same RGBA value.
    pub fn filled(size: RasterSize, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(size.byte_len());
        for _ in 0..size.pixel_count() {
            data.extend_from_slice(&rgba);
        }
        Self { size, data }
    }

    pub fn size(&self) -> RasterSize {
        self.size
    }

    pub fn pixel_count(&self) -> usize {
        self.size.pixel_count()
    }

    /// The raw RGBA bytes, row-major, four bytes per pixel.
    pub fn rgba(&self) -> &[u8] {
        &self.data
    }

    /// Encodes the snapshot as a PNG file, for keeping the frame that
    /// triggered an alert.
    pub fn write_png(&self, path: &Path) -> Result<(), CaptureError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);
        encoder.write_image(
            &self.data,
            self.size.width,
            self.size.height,
            image::ExtendedColorType::Rgba8,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_accepts_exact_buffer() {
        let size = RasterSize::new(2, 2);
        let snapshot = Snapshot::from_rgba(size, vec![0; size.byte_len()]).unwrap();
        assert_eq!(snapshot.pixel_count(), 4);
        assert_eq!(snapshot.rgba().len(), 16);
    }

    #[test]
    fn from_rgba_rejects_short_buffer() {
        let size = RasterSize::new(2, 2);
        let result = Snapshot::from_rgba(size, vec![0; 15]);
        assert!(matches!(
            result,
            Err(CaptureError::RasterMismatch {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn filled_covers_every_pixel() {
        let size = RasterSize::new(3, 2);
        let snapshot = Snapshot::filled(size, [1, 2, 3, 255]);
        for px in snapshot.rgba().chunks_exact(BYTES_PER_PIXEL) {
            assert_eq!(px, [1, 2, 3, 255]);
        }
    }

    #[test]
    fn write_png_round_trips_through_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let size = RasterSize::new(4, 3);
        let snapshot = Snapshot::filled(size, [10, 20, 30, 255]);
        snapshot.write_png(&path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.as_raw().as_slice(), snapshot.rgba());
    }
}
