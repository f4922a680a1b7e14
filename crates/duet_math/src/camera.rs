use glam::{Mat4, Vec3};

/// Camera parameters shared by both render pipelines.
///
/// The rasterizer consumes [`Camera::view_projection_matrix`]; the ray tracer
/// builds eye rays through a virtual film of width `film_size` placed at
/// [`Camera::distance_to_film`] in front of the eye.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Film height in world units (ray tracing only).
    pub film_size: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(position: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fov_y: 45.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 100.0,
            film_size: 0.032,
        }
    }

    /// Builder-style field of view override (degrees).
    pub fn with_fov_degrees(mut self, fov_y: f32) -> Self {
        self.fov_y = fov_y.to_radians();
        self
    }

    /// Builder-style depth range override.
    pub fn with_depth_range(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Get the view matrix (world → camera space)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Get the projection matrix (camera → clip space), OpenGL depth convention
    /// (NDC z in [-1, 1]).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Update aspect ratio (e.g., on resolution change)
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Distance from the eye to the film plane that makes the film span `fov_y`.
    pub fn distance_to_film(&self) -> f32 {
        self.film_size / (2.0 * (self.fov_y * 0.5).tan())
    }

    /// Orthonormal camera frame `(u, v, w)`: right, up, and backwards.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let w = -self.forward();
        let u = self.up.cross(w).normalize();
        let v = w.cross(u);
        (u, v, w)
    }
}

impl Default for Camera {
    /// The eye on +Z looking at the origin.
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 1.5), Vec3::ZERO, 512.0 / 384.0)
    }
}
