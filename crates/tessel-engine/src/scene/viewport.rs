use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::coords::ColorRgba;

use super::{Camera, Mesh};

/// Lifecycle of the program driving the viewport. Each state tints the
/// chrome around the content inlet.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ViewportState {
    #[default]
    Idle,
    CompilerError,
    RuntimeError,
    Loading,
    Playing,
}

impl ViewportState {
    pub fn chrome_tint(self) -> ColorRgba {
        match self {
            ViewportState::Idle => ColorRgba::new(0.8, 0.8, 0.8, 0.6),
            ViewportState::CompilerError => ColorRgba::new(0.8, 0.7, 0.7, 0.6),
            ViewportState::RuntimeError => ColorRgba::new(0.8, 0.6, 0.6, 0.6),
            ViewportState::Loading => ColorRgba::new(0.4, 0.4, 0.8, 0.6),
            ViewportState::Playing => ColorRgba::new(0.9, 0.9, 0.9, 0.6),
        }
    }
}

/// Everything a renderer reads in one frame.
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: ColorRgba,
    /// Width over height of the content inlet.
    pub aspect_ratio: f32,
    pub camera: Camera,
    pub state: ViewportState,
    /// Drawn in order.
    pub meshes: Vec<Mesh>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: ColorRgba::black(),
            aspect_ratio: 16.0 / 9.0,
            camera: Camera::default(),
            state: ViewportState::Idle,
            meshes: Vec::new(),
        }
    }
}

/// The non-mesh part of a [`Scene`], copied by `recache`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportSnapshot {
    pub background: ColorRgba,
    pub aspect_ratio: f32,
    pub camera: Camera,
    pub state: ViewportState,
}

/// Shared scene owned by the animation side and read by renderers.
///
/// Writers take the write lock to mutate meshes; a renderer holds the read
/// lock for its whole mesh pass.
#[derive(Debug, Default)]
pub struct Viewport {
    scene: RwLock<Scene>,
}

impl Viewport {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene: RwLock::new(scene),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Scene> {
        self.scene.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Scene> {
        self.scene.write()
    }

    pub fn snapshot(&self) -> ViewportSnapshot {
        let scene = self.scene.read();
        ViewportSnapshot {
            background: scene.background,
            aspect_ratio: scene.aspect_ratio,
            camera: scene.camera,
            state: scene.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_has_a_distinct_translucent_tint() {
        let states = [
            ViewportState::Idle,
            ViewportState::CompilerError,
            ViewportState::RuntimeError,
            ViewportState::Loading,
            ViewportState::Playing,
        ];
        for (i, a) in states.iter().enumerate() {
            assert_eq!(a.chrome_tint().a, 0.6);
            for b in &states[i + 1..] {
                assert_ne!(a.chrome_tint(), b.chrome_tint());
            }
        }
    }

    #[test]
    fn snapshot_copies_scene_fields() {
        let viewport = Viewport::default();
        viewport.write().state = ViewportState::Playing;
        viewport.write().aspect_ratio = 1.0;

        let snap = viewport.snapshot();
        assert_eq!(snap.state, ViewportState::Playing);
        assert_eq!(snap.aspect_ratio, 1.0);
        assert_eq!(snap.camera, Camera::default());
    }
}
