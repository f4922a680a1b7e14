//! Surface materials.
//!
//! A [`Material`] is one of three closed variants, each carrying only the
//! parameters its shading path reads. The renderer resolves the variant once
//! per hit and dispatches on [`MaterialKind`].

use std::f32::consts::PI;
use std::sync::Arc;

use duet_math::{Color, Vec2};

use crate::texture::Texture;

/// Default diffuse reflectance for meshes without a material library.
pub const DEFAULT_REFLECTANCE: f32 = 0.9;

/// Index of refraction assigned to glass materials.
pub const GLASS_IOR: f32 = 1.5;

/// A named material.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
}

/// Material variants.
///
/// Marked non-exhaustive so downstream dispatch keeps a fallback arm that
/// makes unhandled variants visible in the image.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum MaterialKind {
    /// Lambertian surface lit by point lights.
    Diffuse {
        ambient: Color,
        reflectance: Color,
        texture: Option<Arc<Texture>>,
    },
    /// Perfect specular reflector.
    Mirror { specular: Color },
    /// Refracting glass. `specular` attenuates total internal reflection.
    Dielectric { ior: f32, specular: Color },
}

impl Material {
    /// Diffuse material with the given reflectance (Kd).
    pub fn diffuse(name: impl Into<String>, reflectance: Color) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Diffuse {
                ambient: Color::ZERO,
                reflectance,
                texture: None,
            },
        }
    }

    /// Mirror with the given specular reflectance (Ks).
    pub fn mirror(name: impl Into<String>, specular: Color) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Mirror { specular },
        }
    }

    /// Glass with the given index of refraction.
    pub fn dielectric(name: impl Into<String>, ior: f32, specular: Color) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Dielectric { ior, specular },
        }
    }

    /// Attach an albedo texture. No effect on non-diffuse materials.
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        if let MaterialKind::Diffuse { texture: slot, .. } = &mut self.kind {
            *slot = Some(texture);
        }
        self
    }

    /// The albedo texture, if any.
    pub fn texture(&self) -> Option<&Texture> {
        match &self.kind {
            MaterialKind::Diffuse { texture, .. } => texture.as_deref(),
            _ => None,
        }
    }

    pub fn is_textured(&self) -> bool {
        self.texture().is_some()
    }

    /// Lambertian BRDF value `Kd / pi`. Zero for specular variants.
    pub fn brdf(&self) -> Color {
        match &self.kind {
            MaterialKind::Diffuse { reflectance, .. } => *reflectance / PI,
            _ => Color::ZERO,
        }
    }

    /// BRDF modulated by the texture sample at `uv`.
    pub fn brdf_at(&self, uv: Vec2) -> Color {
        match self.texture() {
            Some(texture) => self.brdf() * texture.fetch(uv),
            None => self.brdf(),
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse("default", Color::splat(DEFAULT_REFLECTANCE))
    }
}
