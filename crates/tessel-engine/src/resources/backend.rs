use std::sync::Arc;

use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::coords::PixelSize;
use crate::device::Gpu;

use super::buffer::BufferKind;

/// The handful of device calls the resource pool needs.
///
/// Keeping the pool generic over this lets its bookkeeping be exercised
/// without a GPU.
pub trait GpuBackend: Send + Sync + 'static {
    type Buffer: Clone + Send + Sync + 'static;
    type Texture: Clone + Send + Sync + 'static;

    fn create_buffer(&self, kind: BufferKind, contents: &[u8], label: &str) -> Self::Buffer;

    fn write_buffer(&self, buffer: &Self::Buffer, contents: &[u8]);

    fn create_texture(&self, image: &RgbaImage, label: &str) -> Self::Texture;

    /// Largest width or height `create_texture` accepts.
    fn max_texture_dimension(&self) -> u32;
}

/// A sampled texture together with its default view.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: PixelSize,
}

#[derive(Clone)]
pub struct WgpuBackend {
    gpu: Arc<Gpu>,
}

impl WgpuBackend {
    pub fn new(gpu: Arc<Gpu>) -> Self {
        Self { gpu }
    }

    pub fn gpu(&self) -> &Arc<Gpu> {
        &self.gpu
    }
}

impl GpuBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Texture = GpuTexture;

    fn create_buffer(&self, kind: BufferKind, contents: &[u8], label: &str) -> wgpu::Buffer {
        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };
        self.gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, contents: &[u8]) {
        // queue writes must be a multiple of COPY_BUFFER_ALIGNMENT
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
        if contents.len() % align == 0 {
            self.gpu.queue().write_buffer(buffer, 0, contents);
        } else {
            let mut padded = contents.to_vec();
            padded.resize(contents.len().next_multiple_of(align), 0);
            self.gpu.queue().write_buffer(buffer, 0, &padded);
        }
    }

    fn create_texture(&self, image: &RgbaImage, label: &str) -> GpuTexture {
        let size = PixelSize::new(image.width(), image.height());
        let texture = self.gpu.device().create_texture_with_data(
            self.gpu.queue(),
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: size.to_extent(),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            image.as_raw(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        GpuTexture {
            texture,
            view,
            size,
        }
    }

    fn max_texture_dimension(&self) -> u32 {
        self.gpu.device().limits().max_texture_dimension_2d
    }
}
