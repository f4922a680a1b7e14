// Re-export glam for convenience
pub use glam::*;

// Duet math types
mod aabb;
mod camera;
mod frustum;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use camera::Camera;
pub use frustum::Frustum;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Mat4Ext;

/// Linear RGB color.
pub type Color = Vec3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_color_is_componentwise() {
        let a = Color::new(0.5, 0.25, 1.0);
        let b = Color::new(2.0, 4.0, 0.5);
        assert_eq!(a * b, Color::new(1.0, 1.0, 0.5));
    }
}
