use anyhow::{Context, Result};

use super::GpuInit;

/// Owns the wgpu core objects used for offscreen rendering.
///
/// This type is the low-level rendering context:
/// - creates and stores Adapter/Device/Queue
/// - answers multisample capability queries
/// - blocks on queue completion for readback
///
/// There is no surface: every renderer draws into its own offscreen target
/// and hands pixels to the caller through `blit`.
pub struct Gpu {
    /// Selected adapter.
    adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,
}

impl Gpu {
    /// Creates a headless GPU context.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            backends,
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
            adapter_format_features,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let mut features = required_features;
        if adapter_format_features {
            features |= adapter.features() & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }

        let limits = required_limits.unwrap_or_else(|| {
            wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits())
        });

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tessel device"),
                required_features: features,
                required_limits: limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Blocking wrapper around [`Gpu::new`] for callers outside an executor.
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the adapter description (name, backend, driver).
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Largest sample count `<= ceiling` usable by every format in `formats`.
    ///
    /// Probes downward by halving (8, 4, 2) and falls back to 1, which is
    /// always supported.
    pub fn supported_sample_count(&self, formats: &[wgpu::TextureFormat], ceiling: u32) -> u32 {
        let ceiling = ceiling.clamp(1, 16);
        let mut count = 1u32 << (31 - ceiling.leading_zeros());

        while count > 1 {
            let supported = formats
                .iter()
                .all(|f| self.format_flags(*f).sample_count_supported(count));
            if supported {
                return count;
            }
            count /= 2;
        }
        1
    }

    /// Blocks until all submitted work has completed.
    pub fn wait_idle(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .context("device poll failed")?;
        Ok(())
    }

    fn format_flags(&self, format: wgpu::TextureFormat) -> wgpu::TextureFormatFeatureFlags {
        let features = self.device.features();
        if features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
            self.adapter.get_texture_format_features(format).flags
        } else {
            format.guaranteed_format_features(features).flags
        }
    }
}
