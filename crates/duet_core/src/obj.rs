//! Wavefront OBJ/MTL loading.
//!
//! All models in the file are merged into one [`Mesh`]. Materials are
//! classified from their MTL parameters:
//!
//! - names starting with `glass` become dielectrics with IOR 1.5
//! - `Ns 100` marks a mirror
//! - everything else is diffuse, optionally textured through `map_Kd`

use std::path::Path;
use std::sync::Arc;

use duet_math::{Color, Vec2, Vec3};

use crate::error::{LoadError, LoadResult};
use crate::material::{Material, MaterialKind, DEFAULT_REFLECTANCE, GLASS_IOR};
use crate::mesh::{face_normal, Mesh, Triangle};
use crate::texture::Texture;

/// Specular exponent that marks a perfect mirror in MTL files.
const MIRROR_SHININESS: f32 = 100.0;

/// Load an OBJ file and its material library.
///
/// A missing or unreadable MTL file is not fatal: the mesh falls back to the
/// default diffuse material. Faces without normals get flat face normals.
/// Texture coordinates are only kept for faces with a textured material.
pub fn load_obj(path: impl AsRef<Path>) -> LoadResult<Mesh> {
    let path = path.as_ref();
    let (models, mtl_result) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            single_index: true,
            triangulate: true,
            ..Default::default()
        },
    )?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let materials = match mtl_result {
        Ok(materials) => materials
            .iter()
            .map(|m| convert_material(m, base_dir))
            .collect(),
        Err(e) => {
            log::warn!("No usable material library for {}: {}", path.display(), e);
            Vec::new()
        }
    };

    let mut triangles = Vec::new();
    let mut skipped = 0usize;

    for model in &models {
        let mesh = &model.mesh;
        let material = mesh.material_id.unwrap_or(0);
        let textured = materials
            .get(material)
            .map(Material::is_textured)
            .unwrap_or(false);
        let has_normals = !mesh.normals.is_empty();
        let use_uvs = textured && !mesh.texcoords.is_empty();

        for face in mesh.indices.chunks_exact(3) {
            let idx = [face[0] as usize, face[1] as usize, face[2] as usize];

            let Some(positions) = gather3(&mesh.positions, idx) else {
                skipped += 1;
                continue;
            };

            let normals = if has_normals {
                gather3(&mesh.normals, idx).unwrap_or([face_normal(&positions); 3])
            } else {
                [face_normal(&positions); 3]
            };

            let uvs = if use_uvs {
                gather2(&mesh.texcoords, idx).unwrap_or([Vec2::ZERO; 3])
            } else {
                [Vec2::ZERO; 3]
            };

            triangles.push(Triangle::new(positions, normals, uvs, material));
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {} faces with out-of-range indices", skipped);
    }
    if triangles.is_empty() {
        return Err(LoadError::EmptyMesh(path.to_path_buf()));
    }

    let mesh = Mesh::new(triangles, materials);
    log::info!(
        "Loaded {} ({} triangles, {} materials)",
        path.display(),
        mesh.triangle_count(),
        mesh.materials.len()
    );
    Ok(mesh)
}

/// Classify an MTL entry into one of the material variants.
fn convert_material(mtl: &tobj::Material, base_dir: &Path) -> Material {
    let ambient = mtl.ambient.map(Color::from_array).unwrap_or(Color::ZERO);
    let reflectance = mtl
        .diffuse
        .map(Color::from_array)
        .unwrap_or(Color::splat(DEFAULT_REFLECTANCE));
    let specular = mtl.specular.map(Color::from_array).unwrap_or(Color::ZERO);

    let kind = if mtl.name.starts_with("glass") {
        MaterialKind::Dielectric {
            ior: GLASS_IOR,
            specular,
        }
    } else if mtl.shininess == Some(MIRROR_SHININESS) {
        MaterialKind::Mirror { specular }
    } else {
        let texture = mtl
            .diffuse_texture
            .as_ref()
            .and_then(|file| match Texture::load(base_dir.join(file)) {
                Ok(texture) => Some(Arc::new(texture)),
                Err(e) => {
                    log::warn!("Unable to load texture {}: {}", file, e);
                    None
                }
            });
        MaterialKind::Diffuse {
            ambient,
            reflectance,
            texture,
        }
    };

    Material {
        name: mtl.name.clone(),
        kind,
    }
}

fn gather3(data: &[f32], idx: [usize; 3]) -> Option<[Vec3; 3]> {
    let get = |i: usize| data.get(i * 3..i * 3 + 3).map(Vec3::from_slice);
    Some([get(idx[0])?, get(idx[1])?, get(idx[2])?])
}

fn gather2(data: &[f32], idx: [usize; 3]) -> Option<[Vec2; 3]> {
    let get = |i: usize| data.get(i * 2..i * 2 + 2).map(Vec2::from_slice);
    Some([get(idx[0])?, get(idx[1])?, get(idx[2])?])
}
