//! Duet Core - scene data shared by the ray tracer and the rasterizer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Triangle`, `Mesh`
//! - **Shading inputs**: `Material`, `Texture`, `EnvironmentMap`, `PointLight`
//! - **Loading**: OBJ/MTL meshes via `tobj`, images via `image`
//!
//! # Example
//!
//! ```ignore
//! use duet_core::{load_obj, Mesh};
//!
//! let mesh = load_obj("cornellbox.obj").unwrap_or_else(|_| Mesh::single_triangle());
//! println!("{} triangles", mesh.triangle_count());
//! ```

pub mod error;
pub mod light;
pub mod material;
pub mod mesh;
pub mod obj;
pub mod texture;

// Re-export commonly used types
pub use error::{LoadError, LoadResult};
pub use light::PointLight;
pub use material::{Material, MaterialKind};
pub use mesh::{Mesh, Triangle};
pub use obj::load_obj;
pub use texture::{EnvironmentMap, Texture};
