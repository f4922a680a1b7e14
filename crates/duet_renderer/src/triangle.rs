//! Ray-triangle intersection.
//!
//! Solves `A + beta(B - A) + gamma(C - A) = O + tD` with Cramer's rule over
//! the column vectors `A - B`, `A - C` and `D`. Hits exactly on an edge or a
//! vertex are rejected.

use duet_core::{Material, Mesh, Triangle};
use duet_math::{Aabb, Interval, Ray, Vec3};

use crate::hittable::{HitInfo, Hittable};

/// Default threshold for the ray/plane parallel test.
pub const PARALLEL_EPSILON: f32 = 2e-6;

#[inline]
fn det3(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    a.dot(b.cross(c))
}

/// Intersect a ray with one triangle.
///
/// Rejects rays whose direction is within `parallel_epsilon` of the plane
/// (measured against the unit plane normal) and rays whose system
/// determinant is zero. A hit is reported only if `t` lies strictly inside
/// `ray_t` and all barycentric coordinates lie strictly inside (0, 1).
pub fn intersect_triangle<'a>(
    ray: &Ray,
    triangle: &Triangle,
    material: &'a Material,
    ray_t: Interval,
    parallel_epsilon: f32,
) -> Option<HitInfo<'a>> {
    let [a, b, c] = triangle.positions;
    let a_b = a - b;
    let a_c = a - c;
    let a_o = a - ray.origin;

    let plane_normal = a_b.cross(a_c);
    let unit_normal = plane_normal.normalize_or_zero();
    if unit_normal.dot(ray.direction).abs() < parallel_epsilon {
        return None;
    }

    let det = det3(a_b, a_c, ray.direction);
    if det == 0.0 || !det.is_finite() {
        return None;
    }

    let beta = det3(a_o, a_c, ray.direction) / det;
    let gamma = det3(a_b, a_o, ray.direction) / det;
    let alpha = 1.0 - beta - gamma;
    let t = det3(a_b, a_c, a_o) / det;

    if !ray_t.surrounds(t) {
        return None;
    }
    let unit = Interval::new(0.0, 1.0);
    if !(unit.surrounds(alpha) && unit.surrounds(beta) && unit.surrounds(gamma)) {
        return None;
    }

    let [n0, n1, n2] = triangle.normals;
    let normal = (alpha * n0 + beta * n1 + gamma * n2).normalize_or_zero();

    let mut geometric_normal = unit_normal;
    if plane_normal.dot(normal) < 0.0 {
        geometric_normal = -geometric_normal;
    }

    let [t0, t1, t2] = triangle.uvs;
    let uv = alpha * t0 + beta * t1 + gamma * t2;

    Some(HitInfo {
        t,
        p: ray.at(t),
        normal,
        geometric_normal,
        uv,
        material,
    })
}

/// Brute-force closest hit over every triangle of the mesh.
impl Hittable for Mesh {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<HitInfo<'_>> {
        let mut closest: Option<HitInfo<'_>> = None;

        for triangle in &self.triangles {
            let window = ray_t.with_max(closest.map_or(ray_t.max, |h| h.t));
            if let Some(hit) = intersect_triangle(
                ray,
                triangle,
                self.material(triangle),
                window,
                PARALLEL_EPSILON,
            ) {
                closest = Some(hit);
            }
        }

        closest
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }
}
