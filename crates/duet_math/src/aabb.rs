use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by three intervals (one per axis). The empty box is
/// inverted (min = +inf, max = -inf) so that [`Aabb::fit`] can grow it from
/// nothing, and it intersects no ray.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an empty AABB (contains nothing).
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let mut aabb = Self::EMPTY;
        aabb.fit(a);
        aabb.fit(b);
        aabb
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Reset to the empty state.
    pub fn reset(&mut self) {
        *self = Self::EMPTY;
    }

    /// Grow the box so that it contains `p`.
    pub fn fit(&mut self, p: Vec3) {
        self.x.include(p.x);
        self.y.include(p.y);
        self.z.include(p.z);
    }

    /// True while nothing has been fitted.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Extent along each axis. Zero for an empty box.
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        self.max() - self.min()
    }

    /// Surface area, used as the SAH cost proxy.
    pub fn area(&self) -> f32 {
        let s = self.size();
        2.0 * (s.x * s.y + s.y * s.z + s.z * s.x)
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the largest extent.
    ///
    /// Ties go to the earlier axis.
    pub fn largest_axis(&self) -> usize {
        let s = self.size();

        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Slab test. Returns the entry distance along the ray on a hit.
    ///
    /// The entry distance is negative when the origin is inside the box. A box
    /// lying entirely behind the origin is a miss. No `t` window is applied;
    /// the result is meant for traversal pruning only.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        if self.is_empty() {
            return None;
        }

        let mut t1 = f32::NEG_INFINITY;
        let mut t2 = f32::INFINITY;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];

            // A ray parallel to the slab is either always or never inside it.
            if direction == 0.0 {
                if !slab.contains(origin) {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let mut t_near = (slab.min - origin) * inv;
            let mut t_far = (slab.max - origin) * inv;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }

            t1 = t1.max(t_near);
            t2 = t2.min(t_far);
        }

        if t1 > t2 {
            return None;
        }
        if t1 < 0.0 && t2 < 0.0 {
            return None;
        }
        Some(t1)
    }

    /// Static constants
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };
}

/// The tightest AABB around a set of points.
impl FromIterator<Vec3> for Aabb {
    fn from_iter<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.fit(p);
        }
        aabb
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
