//! Shading kernel.
//!
//! Routes each hit on its material variant. Diffuse surfaces gather direct
//! light from the point lights, mirrors and glass recurse back into the
//! scene with a hard depth cap per variant.

use std::f32::consts::PI;

use duet_core::MaterialKind;
use duet_math::{Color, Interval, Ray, Vec3};

use crate::context::RenderConfig;
use crate::hittable::{HitInfo, Hittable};
use crate::scene::Scene;

/// Returned for material variants the kernel does not know how to shade.
pub const ERROR_COLOR: Color = Color::new(100.0, 0.0, 100.0);

/// Shades hits against one scene with one configuration.
#[derive(Clone, Copy)]
pub struct Shader<'a> {
    scene: &'a Scene,
    config: &'a RenderConfig,
}

impl<'a> Shader<'a> {
    pub fn new(scene: &'a Scene, config: &'a RenderConfig) -> Self {
        Self { scene, config }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Radiance arriving along `direction` from infinitely far away.
    pub fn environment(&self, direction: Vec3) -> Color {
        self.scene
            .environment(direction)
            .unwrap_or(self.config.background)
    }

    /// Radiance leaving `hit` towards `view_dir`.
    ///
    /// `view_dir` is a unit vector pointing from the surface back along the
    /// incoming ray. `level` is the number of specular bounces so far.
    pub fn shade(&self, hit: &HitInfo<'_>, view_dir: Vec3, level: u32) -> Color {
        match &hit.material.kind {
            MaterialKind::Diffuse { .. } => {
                if self.config.shadows {
                    self.shade_diffuse(hit)
                } else {
                    self.shade_debug(hit)
                }
            }
            MaterialKind::Mirror { specular } => self.shade_mirror(hit, view_dir, *specular, level),
            MaterialKind::Dielectric { ior, specular } => {
                self.shade_glass(hit, view_dir, *ior, *specular, level)
            }
            _ => {
                log::error!("No shading routine for material '{}'", hit.material.name);
                ERROR_COLOR
            }
        }
    }

    /// Unshadowed albedo. Only the first light is consulted.
    fn shade_debug(&self, hit: &HitInfo<'_>) -> Color {
        match self.scene.lights().first() {
            Some(_) => hit.material.brdf_at(hit.uv) * PI,
            None => Color::ZERO,
        }
    }

    /// Direct lighting from every visible point light.
    fn shade_diffuse(&self, hit: &HitInfo<'_>) -> Color {
        let brdf = hit.material.brdf_at(hit.uv);
        let mut radiance = Color::ZERO;

        for light in self.scene.lights() {
            let to_light = light.position - hit.p;
            let distance_sq = to_light.length_squared();
            if distance_sq <= 0.0 {
                continue;
            }
            let distance = distance_sq.sqrt();
            let l = to_light / distance;

            let cos_theta = hit.normal.dot(l);
            if cos_theta <= 0.0 {
                continue;
            }

            let shadow_ray = Ray::new(self.offset_origin(hit, l), l);
            let window = Interval::new(self.config.epsilons.shadow_t_min, distance);
            if self.scene.intersect(&shadow_ray, window).is_some() {
                continue;
            }

            let irradiance = light.wattage * (cos_theta / (4.0 * PI * distance_sq));
            radiance += irradiance * brdf;
        }

        radiance
    }

    fn shade_mirror(&self, hit: &HitInfo<'_>, view_dir: Vec3, specular: Color, level: u32) -> Color {
        if level >= self.config.max_mirror_depth {
            return self.environment(view_dir);
        }

        let direction = self.reflect(hit, view_dir);
        specular * self.trace_secondary(hit, direction, self.config.epsilons.shadow_t_min, level)
    }

    fn shade_glass(
        &self,
        hit: &HitInfo<'_>,
        view_dir: Vec3,
        ior: f32,
        specular: Color,
        level: u32,
    ) -> Color {
        if level >= self.config.max_glass_depth {
            return self.environment(view_dir);
        }

        let incident = -view_dir;
        let mut normal = hit.normal;
        let mut cos_i = view_dir.dot(normal);
        let eta = if cos_i > 0.0 {
            1.0 / ior
        } else {
            normal = -normal;
            cos_i = -cos_i;
            ior
        };

        let t_min = self.config.epsilons.self_intersection;
        let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
        if k < 0.0 {
            // Total internal reflection
            let direction = self.reflect(hit, view_dir);
            return specular * self.trace_secondary(hit, direction, t_min, level);
        }

        let direction = (eta * incident + (eta * cos_i - k.sqrt()) * normal).normalize();
        self.trace_secondary(hit, direction, t_min, level)
    }

    /// Mirror direction of the incoming ray, kept on the viewer's side of
    /// the geometric surface.
    fn reflect(&self, hit: &HitInfo<'_>, view_dir: Vec3) -> Vec3 {
        let d = -view_dir;
        let n = hit.normal;
        let mut r = d - 2.0 * d.dot(n) * n;

        let facing = if hit.geometric_normal.dot(view_dir) >= 0.0 {
            hit.geometric_normal
        } else {
            -hit.geometric_normal
        };
        let side = r.dot(facing);
        if side < 0.0 {
            r -= 2.0 * side * facing;
        }

        r.normalize()
    }

    /// Follow a secondary ray leaving `hit` along the unit `direction`.
    fn trace_secondary(&self, hit: &HitInfo<'_>, direction: Vec3, t_min: f32, level: u32) -> Color {
        let ray = Ray::new(self.offset_origin(hit, direction), direction);
        match self.scene.intersect(&ray, Interval::new(t_min, f32::INFINITY)) {
            Some(next) => self.shade(&next, -direction, level + 1),
            None => self.environment(direction),
        }
    }

    /// Hit point nudged along the shading normal to the side `direction` leaves from.
    fn offset_origin(&self, hit: &HitInfo<'_>, direction: Vec3) -> Vec3 {
        let eps = self.config.epsilons.self_intersection;
        if direction.dot(hit.normal) >= 0.0 {
            hit.p + hit.normal * eps
        } else {
            hit.p - hit.normal * eps
        }
    }
}
