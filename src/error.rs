use thiserror::Error;

/// Errors raised while acquiring or reading the video source.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device or stream could not be acquired, or has gone away.
    #[error("video source unavailable: {0}")]
    SourceUnavailable(String),

    /// A pixel buffer did not cover the session raster exactly.
    #[error("raster mismatch: expected {expected} bytes, got {actual}")]
    RasterMismatch { expected: usize, actual: usize },

    /// An image codec failed while decoding a frame or encoding an alert frame.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the monitor lifecycle. Everything inside a running
/// tick is recovered locally; only start/stop can fail.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Start was requested while a session was already running.
    #[error("monitoring is already running")]
    AlreadyRunning,

    /// The configured raster cannot produce frames.
    #[error("invalid raster size {width}x{height}")]
    InvalidRaster { width: u32, height: u32 },

    /// The video source could not be acquired; no session was started.
    #[error("could not acquire video source")]
    StartAborted(#[from] CaptureError),
}
