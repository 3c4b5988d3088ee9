/// What pipelines are compiled against: the device and the attachment
/// formats and sample count of the current targets.
pub(crate) struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    pub sample_count: u32,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub(crate) fn new(
        device: &'a wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        Self {
            device,
            color_format,
            depth_format,
            sample_count,
        }
    }
}
