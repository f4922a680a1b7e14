//! Duet renderer - CPU ray tracing and software rasterization.
//!
//! Both pipelines read the same immutable [`Scene`]:
//!
//! - [`raytrace_frame`] casts one eye ray per pixel through the per-mesh
//!   BVHs and shades hits with the recursive [`Shader`].
//! - [`rasterize_frame`] projects triangles to the screen and fills them
//!   with a top-left fill rule and a depth test, shading each fragment with
//!   the same kernel.
//!
//! Frames are rendered in parallel with rayon.

mod bucket;
mod bvh;
mod camera;
mod context;
mod error;
mod framebuffer;
mod hittable;
mod raster;
mod renderer;
mod scene;
mod shading;
mod triangle;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{build_acceleration_structures, Bvh, BvhConfig, BvhNode, SplitPolicy};
pub use camera::PinholeCamera;
pub use context::{Epsilons, RenderConfig, RenderContext, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use error::{RenderError, RenderResult};
pub use framebuffer::Framebuffer;
pub use hittable::{HitInfo, Hittable};
pub use raster::{rasterize_frame, rasterize_with, ScreenTriangle, Viewport};
pub use renderer::{raytrace_frame, trace_pixel};
pub use scene::{Scene, SceneBuilder};
pub use shading::{Shader, ERROR_COLOR};
pub use triangle::{intersect_triangle, PARALLEL_EPSILON};

/// Re-export common math types from duet_math
pub use duet_math::{Aabb, Color, Interval, Ray, Vec3};
