//! Errors raised while loading scene assets.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading meshes, textures or environment maps.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No triangles found in {}", .0.display())]
    EmptyMesh(PathBuf),
}

pub type LoadResult<T> = Result<T, LoadError>;
