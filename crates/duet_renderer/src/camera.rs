//! Eye-ray generation for the ray tracer.

use duet_math::{Camera, Ray, Vec3};

/// Pinhole camera with a virtual film in front of the eye.
///
/// Row 0 is the bottom of the image, matching the rasterizer's screen
/// mapping and the framebuffer layout.
#[derive(Debug, Clone, Copy)]
pub struct PinholeCamera {
    eye: Vec3,
    width: u32,
    height: u32,

    // Cached film geometry
    film_u: Vec3,
    film_v: Vec3,
    film_center: Vec3,
}

impl PinholeCamera {
    pub fn new(camera: &Camera, width: u32, height: u32) -> Self {
        let (u, v, w) = camera.basis();
        let film_height = camera.film_size;
        let film_width = camera.aspect * film_height;

        Self {
            eye: camera.position,
            width,
            height,
            film_u: u * film_width,
            film_v: v * film_height,
            film_center: camera.position - w * camera.distance_to_film(),
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Point on the film behind pixel `(x, y)`, sampled at the pixel centre.
    pub fn film_point(&self, x: u32, y: u32) -> Vec3 {
        let s = (x as f32 + 0.5) / self.width as f32 - 0.5;
        let t = (y as f32 + 0.5) / self.height as f32 - 0.5;
        self.film_center + s * self.film_u + t * self.film_v
    }

    /// Unit-direction ray from the eye through pixel `(x, y)`.
    pub fn ray(&self, x: u32, y: u32) -> Ray {
        let direction = (self.film_point(x, y) - self.eye).normalize();
        Ray::new(self.eye, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        let mut camera = Camera::new(Vec3::new(0.0, 0.0, 1.5), Vec3::ZERO, 1.0);
        camera.set_aspect(4.0 / 3.0);
        camera
    }

    #[test]
    fn test_centre_ray_looks_forward() {
        // Odd size so a pixel centre sits on the optical axis
        let pinhole = PinholeCamera::new(&camera(), 3, 3);
        let ray = pinhole.ray(1, 1);

        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, 1.5));
        assert!((ray.direction - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_row_zero_is_bottom() {
        let pinhole = PinholeCamera::new(&camera(), 4, 4);

        assert!(pinhole.ray(0, 0).direction.y < 0.0);
        assert!(pinhole.ray(0, 3).direction.y > 0.0);
        assert!(pinhole.ray(0, 0).direction.x < 0.0);
        assert!(pinhole.ray(3, 0).direction.x > 0.0);
    }

    #[test]
    fn test_film_spans_field_of_view() {
        let cam = camera();
        let pinhole = PinholeCamera::new(&cam, 2, 2);

        // Top edge of the film at x = centre, half the vertical fov above the axis
        let top = pinhole.film_center + 0.5 * pinhole.film_v;
        let angle = (top - pinhole.eye).angle_between(cam.forward());
        assert!((angle - cam.fov_y * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_rays_are_unit_length() {
        let pinhole = PinholeCamera::new(&camera(), 8, 6);
        for y in 0..6 {
            for x in 0..8 {
                assert!((pinhole.ray(x, y).direction.length() - 1.0).abs() < 1e-5);
            }
        }
    }
}
