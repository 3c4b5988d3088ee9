use glam::{Mat3, Mat4, Vec3};

use crate::coords::PixelSize;
use crate::scene::Camera;

/// Content sub-rectangle of the render target.
///
/// `u`/`v` are the inlet's half extents in normalized device coordinates;
/// `size` is the inlet in whole pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Inlet {
    pub u: f32,
    pub v: f32,
    pub size: PixelSize,
}

impl Inlet {
    /// Largest rectangle of `aspect` that leaves at least `padding` pixels
    /// on every side. With `match_inlet` the inlet is the whole target.
    pub fn compute(screen: PixelSize, aspect: f32, padding: f32, match_inlet: bool) -> Self {
        if match_inlet {
            return Self {
                u: 1.0,
                v: 1.0,
                size: screen,
            };
        }

        let w = screen.width.max(1) as f32;
        let h = screen.height.max(1) as f32;
        let aspect = if aspect > 0.0 { aspect } else { w / h };

        let (u, v) = if w / h > aspect {
            let v = (1.0 - padding / (h / 2.0)).max(0.0);
            (v * aspect * h / w, v)
        } else {
            let u = (1.0 - padding / (w / 2.0)).max(0.0);
            (u, u / aspect * w / h)
        };

        Self {
            u,
            v,
            size: PixelSize::new((u * w) as u32, (v * h) as u32),
        }
    }

    pub fn fills_frame(&self) -> bool {
        self.u >= 1.0 && self.v >= 1.0
    }
}

/// Transforms uploaded with every mesh.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraMatrices {
    pub model_view: Mat4,
    pub projection: Mat4,
    pub normal: Mat4,
}

impl CameraMatrices {
    pub fn new(camera: &Camera, aspect: f32, screen: PixelSize, inlet: &Inlet) -> Self {
        let z = camera.forward.try_normalize().unwrap_or(Vec3::NEG_Z);
        let x = z.cross(camera.up).normalize_or_zero();
        let y = x.cross(z);

        // rows x, y, -z; orthonormal so the inverse is the transpose
        let rotation = Mat4::from_mat3(Mat3::from_cols(x, y, -z).transpose());
        let model_view = rotation * Mat4::from_translation(-camera.origin);
        let inverse = Mat4::from_translation(camera.origin) * rotation.transpose();

        let (n, f) = (camera.near, camera.far);
        let depth = f - n;
        let standard = Mat4::from_cols(
            [1.0, 0.0, 0.0, 0.0].into(),
            [0.0, aspect, 0.0, 0.0].into(),
            [0.0, 0.0, -f / depth, -1.0].into(),
            [0.0, 0.0, -f * n / depth, 0.0].into(),
        );

        let w = screen.width.max(1) as f32;
        let h = screen.height.max(1) as f32;
        let fit = Mat4::from_scale(Vec3::new(
            inlet.size.width as f32 / w,
            inlet.size.height as f32 / h,
            1.0,
        ));

        Self {
            model_view,
            projection: fit * standard,
            normal: inverse.transpose(),
        }
    }
}
