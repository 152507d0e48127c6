use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;
use crate::geometry::Ray;
use crate::input::Viewport;

/// Orthographic follow camera looking down at the character.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    aspect: f32,
    config: CameraConfig,
}

impl Camera {
    pub fn new(config: CameraConfig, viewport: &Viewport) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            aspect: viewport.aspect().max(0.01),
            config,
        };
        camera.follow(Vec3::ZERO);
        camera
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn resize(&mut self, viewport: &Viewport) {
        self.aspect = viewport.aspect().max(0.01);
    }

    /// Snaps to the follow pose for a character standing at `feet`.
    ///
    /// The camera height is fixed; only the horizontal position tracks the
    /// character.
    pub fn follow(&mut self, feet: Vec3) {
        let offset = self.config.offset;
        self.position = Vec3::new(
            feet.x + offset.x,
            offset.y + self.config.height_bias,
            feet.z + offset.z,
        );
        self.target = Vec3::new(feet.x, self.position.y - self.config.look_drop, feet.z);
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        let half_height = self.config.view_size;
        let half_width = half_height * self.aspect;
        Mat4::orthographic_rh_gl(
            -half_width,
            half_width,
            -half_height,
            half_height,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// World position to normalized device coordinates.
    pub fn world_to_ndc(&self, point: Vec3) -> Vec3 {
        self.view_projection().project_point3(point)
    }

    /// Picking ray through `ndc`. The origin lies on the camera plane and
    /// the direction is the view direction, as for any orthographic camera.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let near = self.config.near;
        let far = self.config.far;
        // NDC depth of the camera plane itself (view-space z = 0).
        let depth = (near + far) / (near - far);
        let origin = self
            .view_projection()
            .inverse()
            .project_point3(Vec3::new(ndc.x, ndc.y, depth));
        Ray::new(origin, self.forward())
    }
}
