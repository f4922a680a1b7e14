//! Render-ready scene.
//!
//! A [`SceneBuilder`] collects meshes, lights and an optional environment
//! map. [`SceneBuilder::build`] constructs every acceleration structure and
//! returns an immutable [`Scene`] that can be shared across render threads.

use std::sync::Arc;

use duet_core::{EnvironmentMap, Mesh, PointLight};
use duet_math::{Aabb, Color, Interval, Ray, Vec3};

use crate::bvh::{build_acceleration_structures, Bvh, BvhConfig};
use crate::hittable::{HitInfo, Hittable};

/// Collects scene content before the acceleration structures are built.
#[derive(Default)]
pub struct SceneBuilder {
    objects: Vec<Arc<Mesh>>,
    lights: Vec<PointLight>,
    environment: Option<Arc<EnvironmentMap>>,
    bvh_config: BvhConfig,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh. Meshes may be shared with other scenes.
    pub fn add_object(mut self, mesh: Arc<Mesh>) -> Self {
        self.objects.push(mesh);
        self
    }

    pub fn add_mesh(self, mesh: Mesh) -> Self {
        self.add_object(Arc::new(mesh))
    }

    pub fn add_light(mut self, light: PointLight) -> Self {
        self.lights.push(light);
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentMap) -> Self {
        self.environment = Some(Arc::new(environment));
        self
    }

    pub fn with_bvh_config(mut self, config: BvhConfig) -> Self {
        self.bvh_config = config;
        self
    }

    /// Build one BVH per object and freeze the scene.
    pub fn build(self) -> Scene {
        let bvhs = build_acceleration_structures(&self.objects, &self.bvh_config);
        let bounds = bvhs
            .iter()
            .fold(Aabb::EMPTY, |acc, bvh| Aabb::surrounding(&acc, &bvh.bounding_box()));

        log::info!(
            "Scene ready: {} objects, {} triangles, {} lights",
            self.objects.len(),
            self.objects.iter().map(|m| m.triangle_count()).sum::<usize>(),
            self.lights.len()
        );

        Scene {
            objects: self.objects,
            bvhs,
            lights: self.lights,
            environment: self.environment,
            bounds,
        }
    }
}

/// An immutable scene: meshes with their BVHs, point lights and an optional
/// environment map.
///
/// `bvhs()[i]` is always built from `objects()[i]`.
pub struct Scene {
    objects: Vec<Arc<Mesh>>,
    bvhs: Vec<Bvh>,
    lights: Vec<PointLight>,
    environment: Option<Arc<EnvironmentMap>>,
    bounds: Aabb,
}

impl Scene {
    pub fn builder() -> SceneBuilder {
        SceneBuilder::new()
    }

    pub fn objects(&self) -> &[Arc<Mesh>] {
        &self.objects
    }

    pub fn bvhs(&self) -> &[Bvh] {
        &self.bvhs
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Environment radiance along `direction`, or `None` without an environment map.
    pub fn environment(&self, direction: Vec3) -> Option<Color> {
        self.environment.as_ref().map(|env| env.lookup(direction))
    }

    pub fn has_environment(&self) -> bool {
        self.environment.is_some()
    }
}

impl Hittable for Scene {
    /// Closest hit over every object.
    fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<HitInfo<'_>> {
        let mut closest: Option<HitInfo<'_>> = None;

        for bvh in &self.bvhs {
            let window = ray_t.with_max(closest.map_or(ray_t.max, |h| h.t));
            if let Some(hit) = bvh.intersect(ray, window) {
                closest = Some(hit);
            }
        }

        closest
    }

    fn bounding_box(&self) -> Aabb {
        self.bounds
    }
}
