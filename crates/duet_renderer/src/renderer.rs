//! Ray-traced frames.
//!
//! The image is split into buckets ordered from the centre outwards and the
//! buckets are rendered in parallel with rayon. Each bucket owns its pixels,
//! so the scene is the only shared state and it is read-only.

use std::time::Instant;

use duet_math::{Color, Interval};
use rayon::prelude::*;

use crate::bucket::{generate_buckets, render_bucket, BucketResult};
use crate::camera::PinholeCamera;
use crate::context::RenderContext;
use crate::error::RenderResult;
use crate::framebuffer::Framebuffer;
use crate::hittable::Hittable;
use crate::scene::Scene;
use crate::shading::Shader;

/// Color and hit distance for one pixel. Misses report an infinite depth.
pub fn trace_pixel(shader: &Shader<'_>, camera: &PinholeCamera, x: u32, y: u32) -> (Color, f32) {
    let ray = camera.ray(x, y);
    match shader.scene().intersect(&ray, Interval::FORWARD) {
        Some(hit) => (shader.shade(&hit, -ray.direction, 0), hit.t),
        None => (shader.environment(ray.direction), f32::INFINITY),
    }
}

/// Ray trace one frame of `scene` as seen through `ctx.camera`.
pub fn raytrace_frame(scene: &Scene, ctx: &RenderContext) -> RenderResult<Framebuffer> {
    ctx.validate()?;

    let start = Instant::now();
    let camera = PinholeCamera::new(&ctx.camera, ctx.width, ctx.height);
    let shader = Shader::new(scene, &ctx.config);
    let buckets = generate_buckets(ctx.width, ctx.height, ctx.config.bucket_size);

    log::info!(
        "Ray tracing {}x{} frame in {} buckets",
        ctx.width,
        ctx.height,
        buckets.len()
    );

    let results: Vec<BucketResult> = buckets
        .par_iter()
        .map(|bucket| render_bucket(bucket, |x, y| trace_pixel(&shader, &camera, x, y)))
        .collect();

    let mut framebuffer = Framebuffer::new(ctx.width, ctx.height);
    for result in &results {
        framebuffer.write_bucket(result);
    }

    log::info!(
        "Ray traced frame in {:.1} ms",
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(framebuffer)
}
