//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! One BVH is built per mesh. Nodes live in a flat arena and refer to their
//! children by index; leaves own a contiguous range of a shared triangle
//! index array. The tree is built once and only read afterwards.

use std::sync::Arc;

use duet_core::Mesh;
use duet_math::{Aabb, Interval, Ray};
use rayon::prelude::*;

use crate::hittable::{HitInfo, Hittable};
use crate::triangle::{intersect_triangle, PARALLEL_EPSILON};

/// Maximum triangles per leaf node.
const LEAF_MAX_SIZE: usize = 4;

/// How internal nodes choose their split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitPolicy {
    /// Sort along the largest axis of the node box and split at the median.
    #[default]
    Median,
    /// Surface area heuristic over every sorted split position on all axes.
    SurfaceAreaHeuristic,
}

/// BVH build parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhConfig {
    pub policy: SplitPolicy,
    /// SAH cost of visiting a node.
    pub cost_bbox: f32,
    /// SAH cost of one ray-triangle test.
    pub cost_triangle: f32,
    /// Threshold for the ray/plane parallel test during traversal.
    pub parallel_epsilon: f32,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            policy: SplitPolicy::Median,
            cost_bbox: 1.0,
            cost_triangle: 1.0,
            parallel_epsilon: PARALLEL_EPSILON,
        }
    }
}

impl BvhConfig {
    pub fn sah() -> Self {
        Self {
            policy: SplitPolicy::SurfaceAreaHeuristic,
            ..Default::default()
        }
    }
}

/// BVH node - either a branch with two children or a leaf with triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node; children are arena indices.
    Branch { bbox: Aabb, left: u32, right: u32 },
    /// Leaf node; `indices[first..first + count]` are its triangles.
    Leaf { bbox: Aabb, first: u32, count: u32 },
}

impl BvhNode {
    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// A BVH over the triangles of one mesh.
pub struct Bvh {
    mesh: Arc<Mesh>,
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
    leaf_count: usize,
    config: BvhConfig,
}

impl Bvh {
    /// Build a BVH over every triangle of `mesh`.
    pub fn build(mesh: Arc<Mesh>, config: &BvhConfig) -> Self {
        let n = mesh.triangle_count();
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * n),
            indices: (0..n as u32).collect(),
            leaf_count: 0,
            config: *config,
            mesh,
        };

        if n > 0 {
            let bounds = bvh.fit(0..n);
            bvh.split(0..n, bounds);
        }

        log::debug!(
            "Built BVH ({:?}): {} triangles, {} nodes, {} leaves",
            config.policy,
            n,
            bvh.nodes.len(),
            bvh.leaf_count
        );
        bvh
    }

    /// The mesh this BVH indexes.
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Node arena; the root is node 0.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Triangle indices of a leaf node.
    pub fn leaf_triangles(&self, node: &BvhNode) -> &[u32] {
        match *node {
            BvhNode::Leaf { first, count, .. } => {
                &self.indices[first as usize..(first + count) as usize]
            }
            BvhNode::Branch { .. } => &[],
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Box of the triangles in `indices[range]`.
    fn fit(&self, range: std::ops::Range<usize>) -> Aabb {
        self.indices[range].iter().fold(Aabb::EMPTY, |acc, &i| {
            Aabb::surrounding(&acc, &self.mesh.triangles[i as usize].bbox)
        })
    }

    fn sort_by_centroid(&mut self, range: std::ops::Range<usize>, axis: usize) {
        let triangles = &self.mesh.triangles;
        self.indices[range].sort_unstable_by(|&a, &b| {
            let ca = triangles[a as usize].centroid[axis];
            let cb = triangles[b as usize].centroid[axis];
            ca.total_cmp(&cb)
        });
    }

    /// Recursively build the subtree over `indices[range]`, returning its node index.
    fn split(&mut self, range: std::ops::Range<usize>, bbox: Aabb) -> u32 {
        let id = self.nodes.len() as u32;
        let count = range.len();

        if count <= LEAF_MAX_SIZE {
            self.nodes.push(BvhNode::Leaf {
                bbox,
                first: range.start as u32,
                count: count as u32,
            });
            self.leaf_count += 1;
            return id;
        }

        let mid = match self.config.policy {
            SplitPolicy::Median => self.median_split(range.clone(), &bbox),
            SplitPolicy::SurfaceAreaHeuristic => self.sah_split(range.clone(), &bbox),
        };

        // Parent goes into the arena before its children
        self.nodes.push(BvhNode::Leaf {
            bbox,
            first: 0,
            count: 0,
        });

        let left_box = self.fit(range.start..mid);
        let right_box = self.fit(mid..range.end);
        let left = self.split(range.start..mid, left_box);
        let right = self.split(mid..range.end, right_box);

        self.nodes[id as usize] = BvhNode::Branch { bbox, left, right };
        id
    }

    /// Sort along the largest axis and split so the left half gets `n / 2`.
    fn median_split(&mut self, range: std::ops::Range<usize>, bbox: &Aabb) -> usize {
        let axis = bbox.largest_axis();
        self.sort_by_centroid(range.clone(), axis);
        range.start + range.len() / 2
    }

    /// Cheapest SAH split over all axes, or the median split if no split
    /// beats keeping the node whole.
    fn sah_split(&mut self, range: std::ops::Range<usize>, bbox: &Aabb) -> usize {
        let n = range.len();
        let parent_area = bbox.area();
        if parent_area <= 0.0 {
            return self.median_split(range, bbox);
        }

        let cost_bbox = self.config.cost_bbox;
        let cost_tri = self.config.cost_triangle;
        let mut best: Option<(f32, usize, usize)> = None;
        let mut suffix = vec![0.0f32; n + 1];

        for axis in 0..3 {
            self.sort_by_centroid(range.clone(), axis);
            let sorted = &self.indices[range.clone()];
            let triangles = &self.mesh.triangles;

            // suffix[i] = area of the box around sorted[i..]
            let mut right = Aabb::EMPTY;
            for i in (0..n).rev() {
                right = Aabb::surrounding(&right, &triangles[sorted[i] as usize].bbox);
                suffix[i] = right.area();
            }

            let mut left = Aabb::EMPTY;
            for split in 1..n {
                left = Aabb::surrounding(&left, &triangles[sorted[split - 1] as usize].bbox);
                let cost = cost_bbox
                    + (left.area() / parent_area) * split as f32 * cost_tri
                    + (suffix[split] / parent_area) * (n - split) as f32 * cost_tri;

                if best.map_or(true, |(c, _, _)| cost < c) {
                    best = Some((cost, axis, split));
                }
            }
        }

        match best {
            Some((cost, axis, split)) if cost < n as f32 * cost_tri => {
                self.sort_by_centroid(range.clone(), axis);
                range.start + split
            }
            _ => self.median_split(range, bbox),
        }
    }

    fn traverse<'a>(&'a self, node: usize, ray: &Ray, ray_t: Interval, closest: &mut Option<HitInfo<'a>>) {
        match self.nodes[node] {
            BvhNode::Leaf { .. } => {
                for &i in self.leaf_triangles(&self.nodes[node]) {
                    let triangle = &self.mesh.triangles[i as usize];
                    let window = ray_t.with_max(best_t(closest, ray_t));
                    if let Some(hit) = intersect_triangle(
                        ray,
                        triangle,
                        self.mesh.material(triangle),
                        window,
                        self.config.parallel_epsilon,
                    ) {
                        *closest = Some(hit);
                    }
                }
            }
            BvhNode::Branch { left, right, .. } => {
                let (left, right) = (left as usize, right as usize);
                let limit = best_t(closest, ray_t);
                let hit_left = self.nodes[left].bbox().intersect(ray).filter(|&t| t < limit);
                let hit_right = self.nodes[right].bbox().intersect(ray).filter(|&t| t < limit);

                match (hit_left, hit_right) {
                    (Some(tl), Some(tr)) => {
                        let (first, second, second_t) = if tl < tr {
                            (left, right, tr)
                        } else {
                            (right, left, tl)
                        };
                        self.traverse(first, ray, ray_t, closest);
                        // Re-check against the tightened best hit
                        if second_t < best_t(closest, ray_t) {
                            self.traverse(second, ray, ray_t, closest);
                        }
                    }
                    (Some(_), None) => self.traverse(left, ray, ray_t, closest),
                    (None, Some(_)) => self.traverse(right, ray, ray_t, closest),
                    (None, None) => {}
                }
            }
        }
    }
}

/// Distance of the closest hit so far, or the end of the window.
#[inline]
fn best_t(closest: &Option<HitInfo<'_>>, ray_t: Interval) -> f32 {
    closest.map_or(ray_t.max, |h| h.t)
}

impl Hittable for Bvh {
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<HitInfo<'_>> {
        let root = self.nodes.first()?;
        root.bbox().intersect(ray)?;

        let mut closest = None;
        self.traverse(0, ray, ray_t, &mut closest);
        closest
    }

    fn bounding_box(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |n| *n.bbox())
    }
}

/// Build one BVH per mesh, in parallel. `result[i]` indexes `meshes[i]`.
pub fn build_acceleration_structures(meshes: &[Arc<Mesh>], config: &BvhConfig) -> Vec<Bvh> {
    meshes
        .par_iter()
        .map(|mesh| Bvh::build(Arc::clone(mesh), config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_core::{Material, Triangle};
    use duet_math::{Color, Vec3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_soup(rng: &mut StdRng, count: usize) -> Mesh {
        let materials = vec![
            Material::diffuse("a", Color::ONE),
            Material::diffuse("b", Color::splat(0.5)),
            Material::mirror("c", Color::ONE),
        ];
        let triangles = (0..count)
            .map(|i| {
                let center = Vec3::new(
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                );
                let mut corner = || {
                    center
                        + Vec3::new(
                            rng.gen_range(-0.7..0.7),
                            rng.gen_range(-0.7..0.7),
                            rng.gen_range(-0.7..0.7),
                        )
                };
                Triangle::flat([corner(), corner(), corner()], i % 3)
            })
            .collect();
        Mesh::new(triangles, materials)
    }

    fn random_ray(rng: &mut StdRng) -> Ray {
        let origin = Vec3::new(
            rng.gen_range(-8.0..8.0),
            rng.gen_range(-8.0..8.0),
            rng.gen_range(-8.0..8.0),
        );
        let target = Vec3::new(
            rng.gen_range(-6.0..6.0),
            rng.gen_range(-6.0..6.0),
            rng.gen_range(-6.0..6.0),
        );
        Ray::new(origin, (target - origin).normalize())
    }

    fn assert_matches_brute_force(mesh: Arc<Mesh>, config: &BvhConfig, rays: &[Ray]) {
        let bvh = Bvh::build(Arc::clone(&mesh), config);
        let mut hits = 0;

        for ray in rays {
            let expected = mesh.intersect(ray, Interval::FORWARD);
            let actual = bvh.intersect(ray, Interval::FORWARD);

            match (expected, actual) {
                (None, None) => {}
                (Some(e), Some(a)) => {
                    hits += 1;
                    assert!((e.t - a.t).abs() < 1e-4, "t mismatch: {} vs {}", e.t, a.t);
                    assert!(std::ptr::eq(e.material, a.material));
                }
                (e, a) => panic!(
                    "brute force {:?} vs BVH {:?} for {:?}",
                    e.map(|h| h.t),
                    a.map(|h| h.t),
                    ray
                ),
            }
        }

        assert!(hits > 0, "sample should contain hits");
    }

    #[test]
    fn test_bvh_empty_mesh() {
        let bvh = Bvh::build(Arc::new(Mesh::new(vec![], vec![])), &BvhConfig::default());
        assert_eq!(bvh.node_count(), 0);
        assert_eq!(bvh.bounding_box(), Aabb::EMPTY);

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(bvh.intersect(&ray, Interval::FORWARD).is_none());
    }

    #[test]
    fn test_bvh_single_triangle_is_leaf() {
        let bvh = Bvh::build(Arc::new(Mesh::single_triangle()), &BvhConfig::default());

        assert_eq!(bvh.node_count(), 1);
        assert_eq!(bvh.leaf_count(), 1);
        assert!(matches!(bvh.nodes()[0], BvhNode::Leaf { count: 1, .. }));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = bvh.intersect(&ray, Interval::FORWARD).expect("hit");
        assert!((hit.t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bvh_structure_invariants() {
        let mut rng = StdRng::seed_from_u64(3);
        let mesh = Arc::new(random_soup(&mut rng, 257));

        for config in [BvhConfig::default(), BvhConfig::sah()] {
            let bvh = Bvh::build(Arc::clone(&mesh), &config);
            assert!(bvh.node_count() <= 2 * mesh.triangle_count());

            let mut seen = vec![0u32; mesh.triangle_count()];
            for (id, node) in bvh.nodes().iter().enumerate() {
                match *node {
                    BvhNode::Leaf { count, bbox, .. } => {
                        assert!(count as usize <= LEAF_MAX_SIZE);
                        for &i in bvh.leaf_triangles(node) {
                            seen[i as usize] += 1;
                            let tri = &mesh.triangles[i as usize].bbox;
                            assert_eq!(Aabb::surrounding(&bbox, tri), bbox);
                        }
                    }
                    BvhNode::Branch { left, right, bbox } => {
                        // Children are appended after their parent
                        assert!(left as usize > id && right as usize > id);
                        for child in [left, right] {
                            let child_box = *bvh.nodes()[child as usize].bbox();
                            assert_eq!(Aabb::surrounding(&bbox, &child_box), bbox);
                        }
                    }
                }
            }
            assert!(seen.iter().all(|&n| n == 1), "every triangle in exactly one leaf");
        }
    }

    #[test]
    fn test_median_split_halves() {
        // Eight triangles spread along X
        let triangles = (0..8)
            .map(|i| {
                let x = i as f32 * 2.0;
                Triangle::flat(
                    [
                        Vec3::new(x, 0.0, 0.0),
                        Vec3::new(x + 1.0, 0.0, 0.0),
                        Vec3::new(x, 1.0, 0.0),
                    ],
                    0,
                )
            })
            .collect();
        let bvh = Bvh::build(Arc::new(Mesh::new(triangles, vec![])), &BvhConfig::default());

        assert_eq!(bvh.node_count(), 3);
        assert_eq!(bvh.leaf_count(), 2);
        match bvh.nodes()[0] {
            BvhNode::Branch { left, right, .. } => {
                let left = bvh.nodes()[left as usize];
                let right = bvh.nodes()[right as usize];
                assert!(left.bbox().max().x <= 7.0);
                assert!(right.bbox().min().x >= 8.0);
            }
            BvhNode::Leaf { .. } => panic!("root should split"),
        }
    }

    #[test]
    fn test_bvh_matches_brute_force_median() {
        let mut rng = StdRng::seed_from_u64(42);
        let mesh = Arc::new(random_soup(&mut rng, 300));
        let rays: Vec<Ray> = (0..3000).map(|_| random_ray(&mut rng)).collect();

        assert_matches_brute_force(mesh, &BvhConfig::default(), &rays);
    }

    #[test]
    fn test_bvh_matches_brute_force_sah() {
        let mut rng = StdRng::seed_from_u64(1234);
        let mesh = Arc::new(random_soup(&mut rng, 300));
        let rays: Vec<Ray> = (0..3000).map(|_| random_ray(&mut rng)).collect();

        assert_matches_brute_force(mesh, &BvhConfig::sah(), &rays);
    }

    #[test]
    fn test_bvh_misses_and_tangent_rays() {
        // Axis-aligned grid of triangles in z = 0; rays graze box faces
        let mut triangles = Vec::new();
        for ix in 0..6 {
            for iy in 0..6 {
                let (x, y) = (ix as f32, iy as f32);
                triangles.push(Triangle::flat(
                    [
                        Vec3::new(x, y, 0.0),
                        Vec3::new(x + 1.0, y, 0.0),
                        Vec3::new(x, y + 1.0, 0.0),
                    ],
                    0,
                ));
            }
        }
        let mesh = Arc::new(Mesh::new(triangles, vec![]));

        let rays = vec![
            // Straight down through triangle interiors
            Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::new(0.0, 0.0, -1.0)),
            Ray::new(Vec3::new(3.2, 4.3, 5.0), Vec3::new(0.0, 0.0, -1.0)),
            // Along the plane of the grid
            Ray::new(Vec3::new(-1.0, 0.5, 0.0), Vec3::X),
            // Tangent to the top face of the mesh box
            Ray::new(Vec3::new(-1.0, 6.0, 0.0), Vec3::X),
            // Misses entirely
            Ray::new(Vec3::new(10.0, 10.0, 5.0), Vec3::new(0.0, 0.0, -1.0)),
            Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::Z),
        ];

        for config in [BvhConfig::default(), BvhConfig::sah()] {
            let bvh = Bvh::build(Arc::clone(&mesh), &config);
            for ray in &rays {
                let expected = mesh.intersect(ray, Interval::FORWARD).map(|h| h.t);
                let actual = bvh.intersect(ray, Interval::FORWARD).map(|h| h.t);
                assert_eq!(expected, actual, "ray {:?}", ray);
            }
        }

        let bvh = Bvh::build(mesh, &BvhConfig::default());
        let hit = bvh.intersect(&rays[0], Interval::FORWARD).expect("hit");
        assert!((hit.t - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_build_acceleration_structures_lockstep() {
        let meshes = vec![
            Arc::new(Mesh::single_triangle()),
            Arc::new(Mesh::new(vec![], vec![])),
        ];
        let bvhs = build_acceleration_structures(&meshes, &BvhConfig::default());

        assert_eq!(bvhs.len(), meshes.len());
        for (bvh, mesh) in bvhs.iter().zip(&meshes) {
            assert!(Arc::ptr_eq(bvh.mesh(), mesh));
        }
    }
}
