//! Image data used during shading.
//!
//! Two kinds of images are consumed by the renderer:
//!
//! - [`Texture`]: 8-bit RGB albedo maps owned by diffuse materials, sampled
//!   nearest-neighbour with repeat wrapping.
//! - [`EnvironmentMap`]: a float RGB light probe consulted for rays that
//!   escape the scene.

use std::path::Path;

use duet_math::{Color, Vec2, Vec3};

use crate::error::LoadResult;

/// An 8-bit RGB texture.
///
/// Rows are stored in file order (row 0 is the top of the image) and are
/// addressed directly by the `v` coordinate, without a flip.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 3]>,
}

impl Texture {
    /// Create a texture from raw pixels. `pixels.len()` must equal `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Load a texture from disk, converting to 8-bit RGB.
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixels = bytemuck::cast_slice::<u8, [u8; 3]>(rgb.as_raw()).to_vec();

        log::debug!("Loaded texture {} ({}x{})", path.display(), width, height);
        Ok(Self::new(width, height, pixels))
    }

    /// Nearest-sample fetch at `uv`, repeating outside [0, 1).
    pub fn fetch(&self, uv: Vec2) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        let w = self.width as i64;
        let h = self.height as i64;
        let x = ((uv.x * self.width as f32) as i64).rem_euclid(w);
        let y = ((uv.y * self.height as f32) as i64).rem_euclid(h);

        let [r, g, b] = self.pixels[(x + y * w) as usize];
        Color::new(r as f32, g as f32, b as f32) / 255.0
    }
}

/// A float RGB light probe, rows stored bottom-up.
#[derive(Clone, Debug)]
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Color>,
}

impl EnvironmentMap {
    /// Create an environment map from bottom-up rows of pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Load an HDR or LDR image. LDR channels are scaled to [0, 1].
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let rgb = image::open(path)?.to_rgb32f();
        let (width, height) = rgb.dimensions();

        // Image rows are top-down, the probe is addressed bottom-up
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in (0..height).rev() {
            for x in 0..width {
                let p = rgb.get_pixel(x, y);
                pixels.push(Color::new(p[0], p[1], p[2]));
            }
        }

        log::info!("Loaded environment map {} ({}x{})", path.display(), width, height);
        Ok(Self::new(width, height, pixels))
    }

    /// Pixel at column `x`, row `y` (row 0 at the bottom).
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.pixels[(x + y * self.width) as usize]
    }

    /// Light-probe lookup for a direction.
    ///
    /// The polar angle from +Z scales the direction's XY projection, giving a
    /// disc mapping into [0, 1]^2. Directions along the Z axis map to the
    /// centre of the image.
    pub fn lookup(&self, direction: Vec3) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        let d = direction.normalize_or_zero();
        let planar = (d.x * d.x + d.y * d.y).sqrt();

        let uv = if planar > 0.0 {
            let r = d.z.clamp(-1.0, 1.0).acos() / (std::f32::consts::PI * planar);
            (Vec2::new(d.x * r, d.y * r) + 1.0) * 0.5
        } else {
            Vec2::splat(0.5)
        };

        let x = ((uv.x * self.width as f32) as i64).clamp(0, self.width as i64 - 1);
        let y = ((uv.y * self.height as f32) as i64).clamp(0, self.height as i64 - 1);
        self.pixel(x as u32, y as u32)
    }
}
