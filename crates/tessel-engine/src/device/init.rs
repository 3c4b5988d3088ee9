/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends wgpu may pick an adapter from.
    pub backends: wgpu::Backends,

    /// Adapter preference. Export and display both want the discrete GPU.
    pub power_preference: wgpu::PowerPreference,

    /// Force a software adapter (CI machines without a GPU).
    pub force_fallback_adapter: bool,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    ///
    /// `None` requests downlevel defaults raised to the adapter's texture
    /// resolution, which every backend can satisfy.
    pub required_limits: Option<wgpu::Limits>,

    /// Enable adapter-specific format features when the adapter has them.
    ///
    /// Without this only 1x and 4x multisampling are available.
    pub adapter_format_features: bool,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: None,
            adapter_format_features: true,
        }
    }
}
