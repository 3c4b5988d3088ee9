use glam::Vec3;

/// Pinhole camera in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            origin: Vec3::new(0.0, 0.0, 4.0),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Camera at `origin` looking at `target`.
    pub fn looking_at(origin: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            origin,
            forward: target - origin,
            up,
            ..Self::default()
        }
    }
}
