use std::sync::mpsc;

use anyhow::{Context, Result, bail};

use crate::coords::PixelSize;
use crate::device::Gpu;

pub(crate) const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Offscreen attachments for one renderer.
///
/// With more than one sample the pass draws into `msaa` and resolves into
/// `resolve`; with one sample it draws into `resolve` directly. `staging`
/// receives a copy of `resolve` with rows padded to the copy alignment.
pub(crate) struct FrameTargets {
    size: PixelSize,
    sample_count: u32,
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
    resolve: wgpu::Texture,
    resolve_view: wgpu::TextureView,
    staging: wgpu::Buffer,
    padded_row: u32,
}

impl FrameTargets {
    pub(crate) fn new(gpu: &Gpu, size: PixelSize, sample_count: u32) -> Self {
        let device = gpu.device();
        let extent = size.to_extent();

        let attachment = |label: &str, format, samples, usage| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: extent,
                mip_level_count: 1,
                sample_count: samples,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let msaa_view = (sample_count > 1).then(|| {
            attachment(
                "tessel msaa color",
                COLOR_FORMAT,
                sample_count,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
            .create_view(&wgpu::TextureViewDescriptor::default())
        });

        let depth_view = attachment(
            "tessel depth",
            DEPTH_FORMAT,
            sample_count,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
        .create_view(&wgpu::TextureViewDescriptor::default());

        let resolve = attachment(
            "tessel resolve",
            COLOR_FORMAT,
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let resolve_view = resolve.create_view(&wgpu::TextureViewDescriptor::default());

        let padded_row = padded_row_bytes(size.width);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel staging"),
            size: padded_row as u64 * size.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            size,
            sample_count,
            msaa_view,
            depth_view,
            resolve,
            resolve_view,
            staging,
            padded_row,
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> PixelSize {
        self.size
    }

    #[inline]
    pub(crate) fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub(crate) fn color_attachment(&self, clear: wgpu::Color) -> wgpu::RenderPassColorAttachment<'_> {
        let (view, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&self.resolve_view)),
            None => (&self.resolve_view, None),
        };
        wgpu::RenderPassColorAttachment {
            view,
            resolve_target,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(clear),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        }
    }

    pub(crate) fn depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Discard,
            }),
            stencil_ops: None,
        }
    }

    pub(crate) fn copy_to_staging(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.resolve,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row),
                    rows_per_image: Some(self.size.height),
                },
            },
            self.size.to_extent(),
        );
    }

    /// Maps the staging buffer and copies it row by row into `dst`, dropping
    /// the row padding.
    pub(crate) fn read_into(&self, gpu: &Gpu, dst: &mut [u8]) -> Result<()> {
        let expected = self.size.packed_len();
        if dst.len() != expected {
            bail!(
                "blit destination holds {} bytes, expected {expected} for {}x{}",
                dst.len(),
                self.size.width,
                self.size.height
            );
        }

        let slice = self.staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        gpu.wait_idle()?;
        rx.recv()
            .context("staging map callback never ran")?
            .context("failed to map staging buffer")?;

        {
            let mapped = slice.get_mapped_range();
            let row = self.size.width as usize * 4;
            for (y, out) in dst.chunks_exact_mut(row).enumerate() {
                let start = y * self.padded_row as usize;
                out.copy_from_slice(&mapped[start..start + row]);
            }
        }
        self.staging.unmap();
        Ok(())
    }
}

fn padded_row_bytes(width: u32) -> u32 {
    (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
}
