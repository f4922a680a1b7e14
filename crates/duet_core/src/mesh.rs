//! Triangle mesh representation.
//!
//! A [`Mesh`] is a flat list of self-contained [`Triangle`]s plus the
//! material table they index into. Per-triangle bounds and centroids are
//! cached at construction for the BVH builder.

use duet_math::{Aabb, Mat4, Mat4Ext, Vec2, Vec3};

use crate::material::Material;

/// A triangle with per-vertex attributes and cached bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub uvs: [Vec2; 3],
    /// Index into the owning mesh's material table.
    pub material: usize,
    pub bbox: Aabb,
    pub centroid: Vec3,
}

impl Triangle {
    /// Create a triangle and compute its bounds and centroid.
    pub fn new(positions: [Vec3; 3], normals: [Vec3; 3], uvs: [Vec2; 3], material: usize) -> Self {
        let mut triangle = Self {
            positions,
            normals,
            uvs,
            material,
            bbox: Aabb::EMPTY,
            centroid: Vec3::ZERO,
        };
        triangle.update_bounds();
        triangle
    }

    /// Create a flat-shaded triangle with zero UVs.
    pub fn flat(positions: [Vec3; 3], material: usize) -> Self {
        let n = face_normal(&positions);
        Self::new(positions, [n; 3], [Vec2::ZERO; 3], material)
    }

    /// Unit normal of the plane, following counter-clockwise winding.
    pub fn face_normal(&self) -> Vec3 {
        face_normal(&self.positions)
    }

    /// Area of the triangle.
    pub fn area(&self) -> f32 {
        let [a, b, c] = self.positions;
        0.5 * (b - a).cross(c - a).length()
    }

    fn update_bounds(&mut self) {
        self.bbox = self.positions.iter().copied().collect();
        self.centroid = (self.positions[0] + self.positions[1] + self.positions[2]) / 3.0;
    }
}

/// Face normal from `(p1 - p0) x (p2 - p0)`. Zero for degenerate triangles.
pub fn face_normal(positions: &[Vec3; 3]) -> Vec3 {
    let e0 = positions[1] - positions[0];
    let e1 = positions[2] - positions[0];
    e0.cross(e1).normalize_or_zero()
}

/// A triangle mesh with its material table.
///
/// The material table is never empty and every triangle's material index
/// is valid.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub materials: Vec<Material>,

    /// Bounds of all triangles.
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a mesh. An empty material table gets the default diffuse
    /// material; out-of-range material indices are redirected to slot 0.
    pub fn new(mut triangles: Vec<Triangle>, mut materials: Vec<Material>) -> Self {
        if materials.is_empty() {
            materials.push(Material::default());
        }

        let mut remapped = 0usize;
        for triangle in &mut triangles {
            if triangle.material >= materials.len() {
                triangle.material = 0;
                remapped += 1;
            }
        }
        if remapped > 0 {
            log::warn!(
                "{} triangles referenced missing materials, using {:?}",
                remapped,
                materials[0].name
            );
        }

        let bounds = Self::compute_bounds(&triangles);
        Self {
            triangles,
            materials,
            bounds,
        }
    }

    /// One triangle facing +Z with the default material.
    pub fn single_triangle() -> Self {
        let positions = [
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, -0.5, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
        ];
        let uvs = [Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)];
        let triangle = Triangle::new(positions, [Vec3::Z; 3], uvs, 0);

        Self::new(vec![triangle], vec![Material::default()])
    }

    fn compute_bounds(triangles: &[Triangle]) -> Aabb {
        triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| Aabb::surrounding(&acc, &t.bbox))
    }

    /// Apply an affine transform in place.
    ///
    /// Positions go through the matrix, normals through its inverse-transpose.
    /// Cached bounds are recomputed.
    pub fn transform(&mut self, matrix: &Mat4) {
        let normal_matrix = matrix.normal_matrix();

        for triangle in &mut self.triangles {
            for p in &mut triangle.positions {
                *p = matrix.transform_point3(*p);
            }
            for n in &mut triangle.normals {
                *n = (normal_matrix * *n).normalize_or_zero();
            }
            triangle.update_bounds();
        }

        self.bounds = Self::compute_bounds(&self.triangles);
    }

    /// Material of a triangle in this mesh.
    pub fn material(&self, triangle: &Triangle) -> &Material {
        &self.materials[triangle.material]
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }

    /// Get the mesh size (diagonal length of bounding box).
    pub fn size(&self) -> f32 {
        self.bounds.size().length()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}
