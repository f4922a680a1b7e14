//! View frustum for whole-mesh culling in the rasterizer.
//!
//! Planes are extracted from an OpenGL-convention view-projection matrix
//! (clip-space z in [-w, w]) and tested against axis-aligned bounding boxes.

use crate::{Aabb, Mat4, Vec3, Vec4};

/// A view frustum defined by 6 planes (left, right, bottom, top, near, far).
///
/// Each plane is stored as a Vec4 where (x, y, z) is the inward normal and w
/// the offset. A point P is inside the plane if `dot(normal, P) + w >= 0`.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Vec4; 6],
}

const PLANE_LEFT: usize = 0;
const PLANE_RIGHT: usize = 1;
const PLANE_BOTTOM: usize = 2;
const PLANE_TOP: usize = 3;
const PLANE_NEAR: usize = 4;
const PLANE_FAR: usize = 5;

impl Frustum {
    /// Extract frustum planes from a view-projection matrix (Gribb/Hartmann).
    pub fn from_view_projection(vp: Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let mut planes = [Vec4::ZERO; 6];
        planes[PLANE_LEFT] = row3 + row0;
        planes[PLANE_RIGHT] = row3 - row0;
        planes[PLANE_BOTTOM] = row3 + row1;
        planes[PLANE_TOP] = row3 - row1;
        planes[PLANE_NEAR] = row3 + row2;
        planes[PLANE_FAR] = row3 - row2;

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    /// True if the box is at least partially inside the frustum.
    ///
    /// Conservative: a box straddling two planes near a frustum corner may be
    /// reported visible although it is not. Empty boxes are never visible.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if aabb.is_empty() {
            return false;
        }
        let min = aabb.min();
        let max = aabb.max();

        self.planes.iter().all(|plane| {
            let normal = plane.truncate();

            // Corner furthest along the plane normal
            let p_vertex = Vec3::select(normal.cmpge(Vec3::ZERO), max, min);
            normal.dot(p_vertex) + plane.w >= 0.0
        })
    }

    /// True if the point lies inside all six planes.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }
}

impl Default for Frustum {
    /// A frustum that accepts everything.
    fn default() -> Self {
        Self {
            planes: [
                Vec4::new(1.0, 0.0, 0.0, f32::MAX),
                Vec4::new(-1.0, 0.0, 0.0, f32::MAX),
                Vec4::new(0.0, 1.0, 0.0, f32::MAX),
                Vec4::new(0.0, -1.0, 0.0, f32::MAX),
                Vec4::new(0.0, 0.0, 1.0, f32::MAX),
                Vec4::new(0.0, 0.0, -1.0, f32::MAX),
            ],
        }
    }
}
