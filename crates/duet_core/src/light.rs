use duet_math::{Color, Vec3};

/// An isotropic point light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    /// Radiant power per channel.
    pub wattage: Color,
}

impl PointLight {
    pub fn new(position: Vec3, wattage: Color) -> Self {
        Self { position, wattage }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(Vec3::splat(3.0), Color::splat(1000.0))
    }
}
