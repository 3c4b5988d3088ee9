use crate::device::GpuInit;
use crate::resources::PoolLimits;

/// Renderer construction parameters.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Used only when the renderer creates its own device.
    pub gpu: GpuInit,

    /// Highest multisample count probed on resize.
    pub max_sample_count: u32,

    /// Perimeter vertices of the dot fan. Clamped to at least 3.
    pub dot_segments: u32,

    /// Minimum chrome border in pixels while editing.
    pub padding: f32,

    /// Minimum chrome border in pixels in presentation mode.
    pub presentation_padding: f32,

    /// Depth pulled toward the camera per mesh drawn, in clip units.
    pub z_offset_step: f32,

    /// Inlet width at which stroke and dot radii are taken literally.
    /// Narrower or wider inlets scale them proportionally.
    pub reference_width: f32,

    pub pool: PoolLimits,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            gpu: GpuInit::default(),
            max_sample_count: 8,
            dot_segments: 8,
            padding: 10.0,
            presentation_padding: 45.0,
            z_offset_step: 3e-6,
            reference_width: 1480.0,
            pool: PoolLimits::default(),
        }
    }
}

impl RendererConfig {
    pub(crate) fn dot_segments(&self) -> u32 {
        self.dot_segments.max(3)
    }
}
