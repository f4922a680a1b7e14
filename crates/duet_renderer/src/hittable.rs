//! Hittable trait and HitInfo for ray-object intersection.

use duet_core::Material;
use duet_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Record of a ray-surface intersection.
///
/// Borrows the material of the surface that was hit; built fresh per query.
#[derive(Clone, Copy, Debug)]
pub struct HitInfo<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Interpolated shading normal (unit length)
    pub normal: Vec3,
    /// Face normal, flipped into the shading normal's hemisphere
    pub geometric_normal: Vec3,
    /// Interpolated texture coordinates
    pub uv: Vec2,
    /// Material at the intersection point
    pub material: &'a Material,
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Closest intersection with `t` strictly inside `ray_t`, if any.
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<HitInfo<'_>>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;
}
