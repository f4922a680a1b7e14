//! Explicit per-frame render state.

use duet_math::Camera;

use crate::error::{RenderError, RenderResult};

/// Default frame width in pixels.
pub const DEFAULT_WIDTH: u32 = 512;
/// Default frame height in pixels.
pub const DEFAULT_HEIGHT: u32 = 384;

/// Numerical thresholds used by the kernel.
///
/// The defaults match the values the renderer was tuned with. Widening them
/// trades visible self-shadowing acne for edge cracks and vice versa.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Epsilons {
    /// Offset along the normal for secondary ray origins, and the glass ray `t_min`.
    pub self_intersection: f32,
    /// `t_min` for shadow and mirror rays.
    pub shadow_t_min: f32,
    /// Rasterizer threshold for zero edge values, zero area and near-zero `w`.
    pub edge: f32,
}

impl Default for Epsilons {
    fn default() -> Self {
        Self {
            self_intersection: 2e-6,
            shadow_t_min: 1e-6,
            edge: 1e-8,
        }
    }
}

/// Render configuration shared by both pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Trace shadow rays for diffuse surfaces. When false, diffuse surfaces
    /// show their unlit albedo (debug output).
    pub shadows: bool,
    /// Recursion cap for mirror reflections.
    pub max_mirror_depth: u32,
    /// Recursion cap for glass refraction and total internal reflection.
    pub max_glass_depth: u32,
    /// Color for escaped rays when the scene has no environment map.
    pub background: duet_math::Color,
    /// Edge length of ray tracing buckets in pixels.
    pub bucket_size: u32,
    /// Skip clockwise screen-space triangles in the rasterizer.
    pub cull_back_faces: bool,
    pub epsilons: Epsilons,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shadows: false,
            max_mirror_depth: 4,
            max_glass_depth: 5,
            background: duet_math::Color::ZERO,
            bucket_size: crate::bucket::DEFAULT_BUCKET_SIZE,
            cull_back_faces: true,
            epsilons: Epsilons::default(),
        }
    }
}

/// Everything a frame needs besides the scene: camera, frame size and
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub camera: Camera,
    pub width: u32,
    pub height: u32,
    pub config: RenderConfig,
}

impl RenderContext {
    /// Context for a `width` x `height` frame. The camera aspect ratio is
    /// set to match the frame.
    pub fn new(mut camera: Camera, width: u32, height: u32) -> Self {
        if width > 0 && height > 0 {
            camera.set_aspect(width as f32 / height as f32);
        }
        Self {
            camera,
            width,
            height,
            config: RenderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reject frames with no pixels.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::EmptyFrame {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(Camera::default(), DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}
