use glamx::{Mat4, Vec3};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CameraProjection {
    #[default]
    Perspective,
    /// `fovy` is the height of the view volume in world units
    Orthographic,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub projection: CameraProjection,
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 2.0, 4.0), Vec3::ZERO, 45.0)
    }
}

impl Camera3D {
    pub const DEFAULT_NEAR: f32 = 0.01;
    pub const DEFAULT_FAR: f32 = 1000.0;

    pub fn perspective(position: Vec3, target: Vec3, fovy: f32) -> Self {
        Self {
            position,
            target,
            up: Vec3::Y,
            fovy,
            aspect: 1.0,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
            projection: CameraProjection::Perspective,
        }
    }

    pub fn orthographic(position: Vec3, target: Vec3, height: f32) -> Self {
        Self {
            projection: CameraProjection::Orthographic,
            ..Self::perspective(position, target, height)
        }
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// Unit vector from the position towards the target, zero if both coincide.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            CameraProjection::Perspective => {
                Mat4::perspective_rh_gl(self.fovy.to_radians(), self.aspect, self.near, self.far)
            }
            CameraProjection::Orthographic => {
                let top = self.fovy * 0.5;
                let right = top * self.aspect;
                Mat4::orthographic_rh_gl(-right, right, -top, top, self.near, self.far)
            }
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glamx::Vec4;

    #[test]
    fn target_projects_to_center() {
        let camera = Camera3D::perspective(Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO, 60.0);
        let clip = camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn orthographic_keeps_scale() {
        let camera = Camera3D::orthographic(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 10.0);
        let clip = camera.view_projection() * Vec4::new(5.0, 5.0, 0.0, 1.0);

        assert!((clip.x - 1.0).abs() < 1e-5);
        assert!((clip.y - 1.0).abs() < 1e-5);
        assert_eq!(clip.w, 1.0);
    }
}
