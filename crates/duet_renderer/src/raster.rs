//! Software rasterizer.
//!
//! Triangles are projected once per frame. The framebuffer is then split
//! into horizontal bands that rasterize every triangle in submission order
//! against their own rows, so depth tests never race and the image matches
//! a serial rasterization.
//!
//! Screen space has its origin at the bottom-left corner of the frame with
//! pixel centres at half-integer coordinates.

use std::time::Instant;

use duet_core::{Material, Mesh, Triangle};
use duet_math::{Color, Frustum, Mat4, UVec2, Vec2, Vec3};
use rayon::prelude::*;

use crate::context::{Epsilons, RenderContext};
use crate::error::RenderResult;
use crate::framebuffer::Framebuffer;
use crate::hittable::HitInfo;
use crate::scene::Scene;
use crate::shading::Shader;

/// Rows per parallel band.
const BAND_ROWS: usize = 16;

/// Frame extents and depth range for the screen mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub near: f32,
    pub far: f32,
}

impl Viewport {
    pub fn from_context(ctx: &RenderContext) -> Self {
        Self {
            width: ctx.width,
            height: ctx.height,
            near: ctx.camera.near,
            far: ctx.camera.far,
        }
    }
}

/// Signed edge function: twice the area of `(a, b, p)`, positive when `p`
/// lies to the left of `a -> b`.
#[inline]
fn edge(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a.y - b.y) * p.x + (b.x - a.x) * p.y + a.x * b.y - b.x * a.y
}

/// Whether pixels exactly on `a -> b` belong to this triangle.
///
/// Horizontal edges are owned when they run leftward, all others when they
/// run downward. A shared edge runs in opposite directions in its two
/// triangles, so exactly one of them owns it.
#[inline]
fn is_top_left(a: Vec2, b: Vec2, eps: f32) -> bool {
    let dy = b.y - a.y;
    if dy.abs() < eps {
        b.x < a.x
    } else {
        dy < 0.0
    }
}

/// A triangle projected to screen space, wound counter-clockwise.
#[derive(Debug, Clone, Copy)]
pub struct ScreenTriangle<'a> {
    screen: [Vec2; 3],
    depth: [f32; 3],
    inv_w: [f32; 3],
    top_left: [bool; 3],
    eps: f32,

    positions: [Vec3; 3],
    normals: [Vec3; 3],
    uvs: [Vec2; 3],
    material: &'a Material,

    min: UVec2,
    max: UVec2,
}

impl<'a> ScreenTriangle<'a> {
    /// Project `triangle` through `view_projection`.
    ///
    /// Returns `None` when a vertex has a near-zero or negative clip `w`,
    /// when the projected area is near zero, and for clockwise triangles
    /// when `cull_back_faces` is set. Clockwise triangles that are kept are
    /// re-wound.
    pub fn project(
        triangle: &Triangle,
        material: &'a Material,
        view_projection: &Mat4,
        viewport: &Viewport,
        cull_back_faces: bool,
        epsilons: &Epsilons,
    ) -> Option<Self> {
        let eps = epsilons.edge;
        let size = Vec2::new(viewport.width as f32, viewport.height as f32);

        let mut screen = [Vec2::ZERO; 3];
        let mut depth = [0.0; 3];
        let mut inv_w = [0.0; 3];
        for i in 0..3 {
            let clip = *view_projection * triangle.positions[i].extend(1.0);
            if clip.w < eps {
                return None;
            }
            let ndc = clip.truncate() / clip.w;
            screen[i] = (ndc.truncate() + 1.0) * 0.5 * size;
            depth[i] = viewport.near + (viewport.far - viewport.near) * (ndc.z + 1.0) * 0.5;
            inv_w[i] = 1.0 / clip.w;
        }

        let mut positions = triangle.positions;
        let mut normals = triangle.normals;
        let mut uvs = triangle.uvs;

        let area = edge(screen[0], screen[1], screen[2]);
        if !area.is_finite() || area.abs() < eps {
            return None;
        }
        if area < 0.0 {
            if cull_back_faces {
                return None;
            }
            screen.swap(1, 2);
            depth.swap(1, 2);
            inv_w.swap(1, 2);
            positions.swap(1, 2);
            normals.swap(1, 2);
            uvs.swap(1, 2);
        }

        let lo = screen[0].min(screen[1]).min(screen[2]);
        let hi = screen[0].max(screen[1]).max(screen[2]);
        let min = lo.floor().max(Vec2::ZERO).min(size);
        let max = hi.ceil().max(Vec2::ZERO).min(size);

        // Edge i is opposite vertex i
        let top_left = [
            is_top_left(screen[1], screen[2], eps),
            is_top_left(screen[2], screen[0], eps),
            is_top_left(screen[0], screen[1], eps),
        ];

        Some(Self {
            screen,
            depth,
            inv_w,
            top_left,
            eps,
            positions,
            normals,
            uvs,
            material,
            min: min.as_uvec2(),
            max: max.as_uvec2(),
        })
    }

    /// Screen-space vertex positions.
    pub fn screen(&self) -> [Vec2; 3] {
        self.screen
    }

    /// Candidate pixel rectangle: inclusive `min`, exclusive `max`.
    pub fn pixel_bounds(&self) -> (UVec2, UVec2) {
        (self.min, self.max)
    }

    fn edge_values(&self, p: Vec2) -> [f32; 3] {
        let [v0, v1, v2] = self.screen;
        [edge(p, v1, v2), edge(p, v2, v0), edge(p, v0, v1)]
    }

    /// Coverage test under the top-left fill rule.
    pub fn covers(&self, p: Vec2) -> bool {
        let w = self.edge_values(p);
        (0..3).all(|i| {
            if w[i].abs() < self.eps {
                self.top_left[i]
            } else {
                w[i] > 0.0
            }
        })
    }

    /// Perspective-correct barycentric weights of screen point `p`.
    ///
    /// No coverage test is applied. Returns `None` where the weights cannot
    /// be normalized.
    pub fn barycentrics_at(&self, p: Vec2) -> Option<Vec3> {
        let w = self.edge_values(p);
        let b = Vec3::new(
            w[0] * self.inv_w[0],
            w[1] * self.inv_w[1],
            w[2] * self.inv_w[2],
        );
        let sum = b.x + b.y + b.z;
        if sum.abs() < f32::MIN_POSITIVE || !sum.is_finite() {
            return None;
        }
        Some(b / sum)
    }

    /// Depth interpolated with perspective-correct weights.
    pub fn depth_at(&self, bary: Vec3) -> f32 {
        bary.dot(Vec3::from_array(self.depth))
    }

    /// Surface attributes at the given weights, shaped like a ray hit seen
    /// from `eye`.
    pub fn fragment(&self, bary: Vec3, eye: Vec3) -> HitInfo<'a> {
        let [p0, p1, p2] = self.positions;
        let [n0, n1, n2] = self.normals;
        let [t0, t1, t2] = self.uvs;

        let p = bary.x * p0 + bary.y * p1 + bary.z * p2;
        let normal = (bary.x * n0 + bary.y * n1 + bary.z * n2).normalize_or_zero();
        let mut geometric_normal = duet_core::mesh::face_normal(&self.positions);
        if geometric_normal.dot(normal) < 0.0 {
            geometric_normal = -geometric_normal;
        }

        HitInfo {
            t: (p - eye).length(),
            p,
            normal,
            geometric_normal,
            uv: bary.x * t0 + bary.y * t1 + bary.z * t2,
            material: self.material,
        }
    }

    /// Rasterize into a band of rows starting at `first_row`.
    ///
    /// `pixels` and `depths` hold whole rows of `width` pixels.
    fn draw_band(
        &self,
        first_row: u32,
        width: u32,
        pixels: &mut [Color],
        depths: &mut [f32],
        shader: &Shader<'_>,
        eye: Vec3,
    ) {
        let rows = (pixels.len() / width as usize) as u32;
        let y0 = self.min.y.max(first_row);
        let y1 = self.max.y.min(first_row + rows);

        for y in y0..y1 {
            let row = (y - first_row) as usize * width as usize;
            for x in self.min.x..self.max.x {
                let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if !self.covers(centre) {
                    continue;
                }
                let Some(bary) = self.barycentrics_at(centre) else {
                    continue;
                };

                let depth = self.depth_at(bary);
                let i = row + x as usize;
                if depth < depths[i] {
                    let fragment = self.fragment(bary, eye);
                    let view_dir = (eye - fragment.p).normalize_or_zero();
                    pixels[i] = shader.shade(&fragment, view_dir, 0);
                    depths[i] = depth;
                }
            }
        }
    }
}

/// Project every triangle of the meshes that survive frustum culling.
fn project_scene<'a>(
    scene: &'a Scene,
    view_projection: &Mat4,
    viewport: &Viewport,
    ctx: &RenderContext,
) -> Vec<ScreenTriangle<'a>> {
    let frustum = Frustum::from_view_projection(*view_projection);
    let visible: Vec<&Mesh> = scene
        .objects()
        .iter()
        .map(|mesh| mesh.as_ref())
        .filter(|mesh| frustum.intersects_aabb(&mesh.bounds))
        .collect();

    log::debug!(
        "Frustum culling kept {} of {} objects",
        visible.len(),
        scene.objects().len()
    );

    visible
        .into_iter()
        .flat_map(|mesh| {
            mesh.triangles.iter().filter_map(move |triangle| {
                ScreenTriangle::project(
                    triangle,
                    mesh.material(triangle),
                    view_projection,
                    viewport,
                    ctx.config.cull_back_faces,
                    &ctx.config.epsilons,
                )
            })
        })
        .collect()
}

/// Rasterize `scene` with an explicit view-projection matrix. `eye` is the
/// world-space viewpoint used for view directions in shading.
pub fn rasterize_with(
    scene: &Scene,
    ctx: &RenderContext,
    view_projection: Mat4,
    eye: Vec3,
) -> RenderResult<Framebuffer> {
    ctx.validate()?;

    let start = Instant::now();
    let viewport = Viewport::from_context(ctx);
    let triangles = project_scene(scene, &view_projection, &viewport, ctx);
    let shader = Shader::new(scene, &ctx.config);

    log::info!(
        "Rasterizing {} triangles into {}x{} frame",
        triangles.len(),
        ctx.width,
        ctx.height
    );

    let mut framebuffer = Framebuffer::new(ctx.width, ctx.height);
    framebuffer.clear(ctx.config.background);

    let width = ctx.width;
    let band_len = BAND_ROWS * width as usize;
    let (pixels, depths) = framebuffer.buffers_mut();
    pixels
        .par_chunks_mut(band_len)
        .zip(depths.par_chunks_mut(band_len))
        .enumerate()
        .for_each(|(band, (pixels, depths))| {
            let first_row = (band * BAND_ROWS) as u32;
            for triangle in &triangles {
                triangle.draw_band(first_row, width, pixels, depths, &shader, eye);
            }
        });

    log::info!(
        "Rasterized frame in {:.1} ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(framebuffer)
}

/// Rasterize `scene` through `ctx.camera`.
pub fn rasterize_frame(scene: &Scene, ctx: &RenderContext) -> RenderResult<Framebuffer> {
    rasterize_with(
        scene,
        ctx,
        ctx.camera.view_projection_matrix(),
        ctx.camera.position,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_core::PointLight;
    use duet_math::Camera;

    fn ortho_viewport() -> (Mat4, Viewport) {
        let vp = Mat4::orthographic_rh_gl(0.0, 16.0, 0.0, 16.0, -1.0, 1.0);
        let viewport = Viewport {
            width: 16,
            height: 16,
            near: 0.1,
            far: 100.0,
        };
        (vp, viewport)
    }

    fn project_flat<'a>(
        points: [Vec2; 3],
        material: &'a Material,
        cull: bool,
    ) -> Option<ScreenTriangle<'a>> {
        let (vp, viewport) = ortho_viewport();
        let triangle = Triangle::flat(points.map(|p| p.extend(0.0)), 0);
        ScreenTriangle::project(&triangle, material, &vp, &viewport, cull, &Epsilons::default())
    }

    #[test]
    fn test_edge_function_sign() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(4.0, 0.0);
        assert!(edge(Vec2::new(1.0, 1.0), a, b) > 0.0);
        assert!(edge(Vec2::new(1.0, -1.0), a, b) < 0.0);
        assert_eq!(edge(Vec2::new(2.0, 0.0), a, b), 0.0);
    }

    #[test]
    fn test_top_left_classification() {
        let eps = 1e-8;
        // Horizontal: leftward owns
        assert!(is_top_left(Vec2::new(4.0, 2.0), Vec2::new(0.0, 2.0), eps));
        assert!(!is_top_left(Vec2::new(0.0, 2.0), Vec2::new(4.0, 2.0), eps));
        // Otherwise: downward owns
        assert!(is_top_left(Vec2::new(1.0, 4.0), Vec2::new(0.0, 0.0), eps));
        assert!(!is_top_left(Vec2::new(0.0, 0.0), Vec2::new(1.0, 4.0), eps));
    }

    #[test]
    fn test_projection_to_pixels() {
        let material = Material::default();
        let tri = project_flat(
            [Vec2::new(1.0, 1.0), Vec2::new(9.0, 1.0), Vec2::new(1.0, 9.0)],
            &material,
            true,
        )
        .expect("visible");

        let [a, b, c] = tri.screen();
        assert!((a - Vec2::new(1.0, 1.0)).length() < 1e-5);
        assert!((b - Vec2::new(9.0, 1.0)).length() < 1e-5);
        assert!((c - Vec2::new(1.0, 9.0)).length() < 1e-5);
        assert_eq!(tri.pixel_bounds(), (UVec2::new(1, 1), UVec2::new(9, 9)));

        assert!(tri.covers(Vec2::new(2.5, 2.5)));
        assert!(!tri.covers(Vec2::new(8.5, 8.5)));
    }

    #[test]
    fn test_back_face_culling() {
        let material = Material::default();
        let clockwise = [Vec2::new(1.0, 1.0), Vec2::new(1.0, 9.0), Vec2::new(9.0, 1.0)];

        assert!(project_flat(clockwise, &material, true).is_none());

        let rewound = project_flat(clockwise, &material, false).expect("kept");
        assert!(rewound.covers(Vec2::new(2.5, 2.5)));
    }

    #[test]
    fn test_degenerate_and_clipped_rejected() {
        let material = Material::default();
        let line = [Vec2::new(1.0, 1.0), Vec2::new(5.0, 5.0), Vec2::new(9.0, 9.0)];
        assert!(project_flat(line, &material, false).is_none());

        // A vertex behind the eye has negative clip w
        let camera = Camera::default();
        let viewport = Viewport {
            width: 16,
            height: 16,
            near: camera.near,
            far: camera.far,
        };
        let behind = Triangle::flat(
            [
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(0.0, 1.0, 3.0),
            ],
            0,
        );
        assert!(ScreenTriangle::project(
            &behind,
            &material,
            &camera.view_projection_matrix(),
            &viewport,
            false,
            &Epsilons::default(),
        )
        .is_none());
    }

    #[test]
    fn test_bounds_clamped_to_frame() {
        let material = Material::default();
        let tri = project_flat(
            [Vec2::new(-5.0, -5.0), Vec2::new(30.0, -5.0), Vec2::new(-5.0, 30.0)],
            &material,
            true,
        )
        .expect("visible");
        assert_eq!(tri.pixel_bounds(), (UVec2::ZERO, UVec2::new(16, 16)));
    }

    #[test]
    fn test_depth_test_keeps_nearest() {
        // Two full-screen quads in front of the default camera
        let quad = |z: f32, name: &str, kd: f32| {
            let a = Vec3::new(-5.0, -5.0, z);
            let b = Vec3::new(5.0, -5.0, z);
            let c = Vec3::new(5.0, 5.0, z);
            let d = Vec3::new(-5.0, 5.0, z);
            Mesh::new(
                vec![Triangle::flat([a, b, c], 0), Triangle::flat([a, c, d], 0)],
                vec![Material::diffuse(name, Color::splat(kd))],
            )
        };
        let scene = Scene::builder()
            .add_mesh(quad(0.0, "near", 0.8))
            .add_mesh(quad(-1.0, "far", 0.2))
            .add_light(PointLight::default())
            .build();
        let ctx = RenderContext::new(Camera::default(), 8, 8);

        let fb = rasterize_frame(&scene, &ctx).expect("frame");
        for (color, depth) in fb.pixels().iter().zip(fb.depths()) {
            assert!((*color - Color::splat(0.8)).length() < 1e-5);
            assert!(depth.is_finite());
        }
    }

    #[test]
    fn test_frustum_culled_mesh_not_drawn() {
        let mut mesh = Mesh::single_triangle();
        mesh.transform(&Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)));
        let scene = Scene::builder()
            .add_mesh(mesh)
            .add_light(PointLight::default())
            .build();
        let ctx = RenderContext::new(Camera::default(), 8, 8);

        let fb = rasterize_frame(&scene, &ctx).expect("frame");
        assert!(fb.depths().iter().all(|d| d.is_infinite()));
    }
}
