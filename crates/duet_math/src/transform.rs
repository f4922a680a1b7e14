// Transform utilities for Mat4
//
// glam::Mat4 already provides transform_point3(), transform_vector3() and
// inverse(); this adds the normal transform used when re-posing meshes.

use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// The inverse-transpose of the upper 3x3 block. Surface normals must be
    /// transformed by this matrix to stay perpendicular under non-uniform scale.
    fn normal_matrix(&self) -> Mat3;

    /// Transform a surface normal and renormalize it.
    fn transform_normal(&self, normal: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(*self).inverse().transpose()
    }

    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        (self.normal_matrix() * normal).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_normal_ignores_translation() {
        let mat = Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0));
        let normal = mat.transform_normal(Vec3::Y);

        assert!((normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_transform_normal_rotation() {
        use std::f32::consts::PI;

        // 90 degree rotation around Z axis
        let mat = Mat4::from_rotation_z(PI / 2.0);
        let normal = mat.transform_normal(Vec3::X);

        assert!((normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_transform_normal_non_uniform_scale() {
        // Plane x + y = 1 has normal (1, 1, 0)/sqrt(2)
        let mat = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));

        // Scaled plane: x/2 + y = 1, normal proportional to (0.5, 1, 0)
        let normal = mat.transform_normal(Vec3::new(1.0, 1.0, 0.0).normalize());
        let expected = Vec3::new(0.5, 1.0, 0.0).normalize();

        assert!((normal - expected).length() < 1e-5);

        // Stays perpendicular to a transformed tangent of the plane
        let tangent = mat.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        assert!(normal.dot(tangent).abs() < 1e-5);
    }
}
