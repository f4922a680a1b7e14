//! Error types for frame rendering and export.

use std::io;

use thiserror::Error;

/// Errors raised by the render entry points and framebuffer export.
///
/// Geometric degeneracies are not errors; they are skipped during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot render an empty {width}x{height} frame")]
    EmptyFrame { width: u32, height: u32 },

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
