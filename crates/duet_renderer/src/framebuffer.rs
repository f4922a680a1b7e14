//! Color and depth buffers shared by both pipelines.

use std::path::Path;

use duet_math::Color;
use image::RgbImage;

use crate::bucket::BucketResult;
use crate::error::RenderResult;

/// Linear RGB color buffer with a parallel depth buffer.
///
/// Both are stored row-major with row 0 at the bottom of the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    depths: Vec<f32>,
}

impl Framebuffer {
    /// Black frame with every depth at +infinity.
    pub fn new(width: u32, height: u32) -> Self {
        let count = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; count],
            depths: vec![f32::INFINITY; count],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset colors to `background` and depths to +infinity.
    pub fn clear(&mut self, background: Color) {
        self.pixels.fill(background);
        self.depths.fill(f32::INFINITY);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    pub fn depth(&self, x: u32, y: u32) -> f32 {
        self.depths[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color, depth: f32) {
        let i = self.index(x, y);
        self.pixels[i] = color;
        self.depths[i] = depth;
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn depths(&self) -> &[f32] {
        &self.depths
    }

    /// Both buffers at once, for writers that split them into disjoint rows.
    pub fn buffers_mut(&mut self) -> (&mut [Color], &mut [f32]) {
        (&mut self.pixels, &mut self.depths)
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        let row_len = bucket.width as usize;

        for local_y in 0..bucket.height as usize {
            let src = local_y * row_len;
            let dst = self.index(bucket.x, bucket.y + local_y as u32);
            self.pixels[dst..dst + row_len].copy_from_slice(&result.pixels[src..src + row_len]);
            self.depths[dst..dst + row_len].copy_from_slice(&result.depths[src..src + row_len]);
        }
    }

    /// Tone-mapped 8-bit image, rows flipped so the top of the frame comes first.
    ///
    /// Colors are clamped to [0, 1] and raised to `1 / gamma`; a gamma of 1
    /// keeps values linear.
    pub fn to_rgb8(&self, gamma: f32) -> RgbImage {
        let inv_gamma = if gamma > 0.0 { 1.0 / gamma } else { 1.0 };
        let encode = |c: f32| (255.0 * c.clamp(0.0, 1.0).powf(inv_gamma)) as u8;

        RgbImage::from_fn(self.width, self.height, |x, row| {
            let color = self.pixel(x, self.height - 1 - row);
            image::Rgb([encode(color.x), encode(color.y), encode(color.z)])
        })
    }

    /// Write the frame as an 8-bit PNG.
    pub fn save_png(&self, path: impl AsRef<Path>, gamma: f32) -> RenderResult<()> {
        let path = path.as_ref();
        self.to_rgb8(gamma).save_with_format(path, image::ImageFormat::Png)?;
        log::info!("Saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::Bucket;

    #[test]
    fn test_new_framebuffer() {
        let fb = Framebuffer::new(4, 3);
        assert_eq!(fb.pixels().len(), 12);
        assert!(fb.depths().iter().all(|d| d.is_infinite()));
        assert_eq!(fb.pixel(3, 2), Color::ZERO);
    }

    #[test]
    fn test_clear_resets_depth() {
        let mut fb = Framebuffer::new(2, 2);
        fb.set(1, 1, Color::ONE, 0.5);
        fb.clear(Color::splat(0.25));

        assert_eq!(fb.pixel(1, 1), Color::splat(0.25));
        assert_eq!(fb.depth(1, 1), f32::INFINITY);
    }

    #[test]
    fn test_write_bucket() {
        let mut fb = Framebuffer::new(4, 4);
        let bucket = Bucket::new(1, 2, 2, 2, 0);
        let pixels = vec![Color::X, Color::Y, Color::Z, Color::ONE];
        fb.write_bucket(&BucketResult::new(bucket, pixels, vec![1.0, 2.0, 3.0, 4.0]));

        assert_eq!(fb.pixel(1, 2), Color::X);
        assert_eq!(fb.pixel(2, 2), Color::Y);
        assert_eq!(fb.pixel(1, 3), Color::Z);
        assert_eq!(fb.depth(2, 3), 4.0);
        assert_eq!(fb.pixel(0, 0), Color::ZERO);
    }

    #[test]
    fn test_to_rgb8_flips_and_clamps() {
        let mut fb = Framebuffer::new(1, 2);
        fb.set(0, 0, Color::new(2.0, -1.0, 0.5), 1.0);
        fb.set(0, 1, Color::ONE, 1.0);

        let img = fb.to_rgb8(1.0);
        // Bottom row ends up last
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 127]);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_gamma() {
        let mut fb = Framebuffer::new(1, 1);
        fb.set(0, 0, Color::splat(0.25), 1.0);

        let img = fb.to_rgb8(2.0);
        assert_eq!(img.get_pixel(0, 0).0, [127, 127, 127]);
    }
}
