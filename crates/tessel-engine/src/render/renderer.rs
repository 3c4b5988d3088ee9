use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bytemuck::Pod;

use crate::coords::{ALPHA_EPSILON, ColorRgba, PixelSize};
use crate::device::Gpu;
use crate::resources::{
    ActiveStack, BufferKind, GpuBuffer, Handle, ResourceManager, WgpuBackend,
};
use crate::scene::{
    Camera, HandleSlot, Mesh, MeshHandles, Viewport, ViewportSnapshot, ViewportState,
};

use super::chrome::{chrome_color, chrome_vertices};
use super::convert::{dot_instances, lin_instances, tri_vertices};
use super::pipelines::Pipelines;
use super::projection::{CameraMatrices, Inlet};
use super::targets::{COLOR_FORMAT, DEPTH_FORMAT, FrameTargets};
use super::vertex::{FragUniform, LINE_CORNERS, LINE_INDICES, VertUniform, dot_fan};
use super::{RenderCtx, RendererConfig};

/// What one `render` call did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub meshes_drawn: u32,
    /// Meshes left out: transparent, out of pool handles, or failed upload.
    pub meshes_skipped: u32,
    /// Another renderer's manager was active, so nothing was recorded.
    pub inactive: bool,
}

type Buffer = GpuBuffer<wgpu::Buffer>;

enum MeshOutcome {
    Drawn(u32),
    Empty,
    Skipped,
}

/// Shared instancing templates, built once.
struct Templates {
    line_corners: Buffer,
    line_indices: Buffer,
    dot_corners: Buffer,
    dot_indices: Buffer,
}

/// Offscreen renderer for one viewport.
///
/// Per-frame contract: `set_screen_size` once (and on every resize),
/// `recache` whenever the viewport's camera or state may have changed,
/// then `render` followed by `blit`.
pub struct Renderer {
    gpu: Arc<Gpu>,
    config: RendererConfig,
    resources: Arc<ResourceManager<WgpuBackend>>,

    pipelines: Pipelines,
    targets: Option<FrameTargets>,
    templates: Templates,
    chrome: Buffer,

    screen: PixelSize,
    match_inlet: bool,
    presentation: bool,

    viewport: Option<Arc<Viewport>>,
    snapshot: ViewportSnapshot,
    inlet: Inlet,
    matrices: CameraMatrices,
}

impl Renderer {
    /// Creates a renderer on its own device, registered on the global active stack.
    pub fn new(config: RendererConfig) -> Result<Self> {
        let gpu = Gpu::new_blocking(config.gpu.clone()).context("renderer device creation failed")?;
        Self::with_gpu(Arc::new(gpu), config, ActiveStack::global())
    }

    /// Creates a renderer on a shared device. Its resource manager becomes
    /// the active one on `stack` until the renderer is dropped.
    pub fn with_gpu(gpu: Arc<Gpu>, config: RendererConfig, stack: &ActiveStack) -> Result<Self> {
        let backend = WgpuBackend::new(gpu.clone());
        let resources = ResourceManager::new(backend, config.pool, stack);

        let sample_count = probe_sample_count(&gpu, &config);
        let pipelines = Pipelines::new(&RenderCtx::new(
            gpu.device(),
            COLOR_FORMAT,
            DEPTH_FORMAT,
            sample_count,
        ))
        .context("renderer pipeline creation failed")?;

        let backend = resources.backend();
        let (dot_corners, dot_indices) = dot_fan(config.dot_segments());
        let templates = Templates {
            line_corners: GpuBuffer::vertex(backend, &LINE_CORNERS, "tessel line corners"),
            line_indices: GpuBuffer::index(backend, &LINE_INDICES, "tessel line indices"),
            dot_corners: GpuBuffer::vertex(backend, &dot_corners, "tessel dot corners"),
            dot_indices: GpuBuffer::index(backend, &dot_indices, "tessel dot indices"),
        };

        let snapshot = ViewportSnapshot {
            background: ColorRgba::black(),
            aspect_ratio: 16.0 / 9.0,
            camera: Camera::default(),
            state: ViewportState::Idle,
        };
        let screen = PixelSize::new(1, 1);
        let inlet = Inlet::compute(screen, snapshot.aspect_ratio, config.padding, false);
        let matrices = CameraMatrices::new(&snapshot.camera, snapshot.aspect_ratio, screen, &inlet);

        Ok(Self {
            gpu,
            config,
            resources,
            pipelines,
            targets: None,
            templates,
            chrome: GpuBuffer::empty(BufferKind::Vertex),
            screen,
            match_inlet: false,
            presentation: false,
            viewport: None,
            snapshot,
            inlet,
            matrices,
        })
    }

    /// (Re)creates the render targets at `width` x `height`.
    ///
    /// With `match_inlet` the content fills the whole target and no chrome
    /// is drawn.
    pub fn set_screen_size(&mut self, width: u32, height: u32, match_inlet: bool) -> Result<()> {
        let size = PixelSize::new(width, height);
        if !size.is_valid() {
            bail!("screen size {width}x{height} has a zero dimension");
        }
        let max = self.gpu.device().limits().max_texture_dimension_2d;
        if width > max || height > max {
            bail!("screen size {width}x{height} exceeds the device limit {max}");
        }

        self.targets = None;

        let sample_count = probe_sample_count(&self.gpu, &self.config);
        if sample_count != self.pipelines.sample_count() {
            self.pipelines = Pipelines::new(&RenderCtx::new(
                self.gpu.device(),
                COLOR_FORMAT,
                DEPTH_FORMAT,
                sample_count,
            ))
            .context("pipeline rebuild on resize failed")?;
        }

        let targets = FrameTargets::new(&self.gpu, size, sample_count);
        log::debug!(
            "render targets {}x{} at {}x msaa",
            targets.size().width,
            targets.size().height,
            targets.sample_count()
        );
        self.targets = Some(targets);
        self.screen = size;
        self.match_inlet = match_inlet;
        self.relayout();

        log::debug!("inlet {}x{}", self.inlet.size.width, self.inlet.size.height);
        Ok(())
    }

    /// Presentation mode uses the larger padding and a black border.
    pub fn set_presentation_mode(&mut self, presentation: bool) {
        self.presentation = presentation;
        self.relayout();
    }

    /// Copies camera, background, state and aspect ratio out of `viewport`
    /// and remembers it as the mesh source for `render`.
    pub fn recache(&mut self, viewport: &Arc<Viewport>) {
        self.snapshot = viewport.snapshot();
        self.viewport = Some(viewport.clone());
        self.relayout();
    }

    /// Records and submits one frame into the staging buffer.
    ///
    /// Does nothing unless this renderer's resource manager is the active one.
    pub fn render(&self) -> FrameStats {
        let mut stats = FrameStats::default();
        if !self.resources.is_active() {
            stats.inactive = true;
            return stats;
        }
        let Some(targets) = self.targets.as_ref() else {
            log::debug!("render before set_screen_size");
            return stats;
        };

        let device = self.gpu.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tessel frame encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("tessel frame pass"),
                color_attachments: &[Some(targets.color_attachment(self.snapshot.background.to_wgpu()))],
                depth_stencil_attachment: Some(targets.depth_attachment()),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if !self.inlet.fills_frame()
                && let Some(vbo) = self.chrome.raw()
            {
                pass.set_pipeline(&self.pipelines.frame);
                pass.set_vertex_buffer(0, vbo.slice(..));
                pass.draw(0..self.chrome.len(), 0..1);
                stats.draw_calls += 1;
            }

            if let Some(viewport) = self.viewport.as_ref() {
                let scene = viewport.read();
                let mut z_offset = 0.0;
                for mesh in &scene.meshes {
                    match self.draw_mesh(&mut pass, mesh, z_offset) {
                        MeshOutcome::Drawn(calls) => {
                            stats.draw_calls += calls;
                            stats.meshes_drawn += 1;
                            z_offset += self.config.z_offset_step;
                        }
                        MeshOutcome::Empty => {}
                        MeshOutcome::Skipped => stats.meshes_skipped += 1,
                    }
                }
            }
        }

        targets.copy_to_staging(&mut encoder);
        self.gpu.queue().submit([encoder.finish()]);
        stats
    }

    /// Copies the last rendered frame into `dst` as tightly packed BGRA8.
    /// `dst` must be exactly `width * height * 4` bytes.
    pub fn blit(&self, dst: &mut [u8]) -> Result<()> {
        let targets = self
            .targets
            .as_ref()
            .context("blit before set_screen_size")?;
        targets.read_into(&self.gpu, dst).context("frame readback failed")
    }

    pub fn gpu(&self) -> &Arc<Gpu> {
        &self.gpu
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn resources(&self) -> &Arc<ResourceManager<WgpuBackend>> {
        &self.resources
    }

    pub fn is_active(&self) -> bool {
        self.resources.is_active()
    }

    pub fn screen_size(&self) -> PixelSize {
        self.screen
    }

    pub fn sample_count(&self) -> u32 {
        self.pipelines.sample_count()
    }

    pub fn inlet(&self) -> &Inlet {
        &self.inlet
    }

    pub fn matrices(&self) -> &CameraMatrices {
        &self.matrices
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn relayout(&mut self) {
        let padding = if self.presentation {
            self.config.presentation_padding
        } else {
            self.config.padding
        };
        let aspect = self.snapshot.aspect_ratio;
        self.inlet = Inlet::compute(self.screen, aspect, padding, self.match_inlet);
        self.matrices = CameraMatrices::new(&self.snapshot.camera, aspect, self.screen, &self.inlet);

        let color = chrome_color(self.snapshot.state, self.presentation, self.match_inlet);
        let verts = chrome_vertices(&self.inlet, color);
        self.chrome
            .write_or_grow(self.resources.backend(), &verts, "tessel chrome");
    }

    /// Uploads (if needed) and draws one mesh.
    fn draw_mesh(&self, pass: &mut wgpu::RenderPass<'_>, mesh: &Mesh, z_offset: f32) -> MeshOutcome {
        if mesh.uniform.opacity < ALPHA_EPSILON {
            return MeshOutcome::Skipped;
        }

        let handles = mesh.handles();
        let mut modified = mesh.is_modified();
        if let Some((owner, stale)) = handles.claim(self.resources.id(), self.resources.stack()) {
            if let Some(owner) = owner {
                let stack = self.resources.stack();
                for handle in stale.into_iter().filter(|h| !h.is_none()) {
                    stack.release_buffer_in(owner, handle);
                }
            }
            modified = true;
        }

        let Some(vert_h) = self.slot(handles, HandleSlot::VertUniform) else { return MeshOutcome::Skipped };
        let Some(frag_h) = self.slot(handles, HandleSlot::FragUniform) else { return MeshOutcome::Skipped };

        let Some(tris) = self.upload(mesh, HandleSlot::Tris, modified, || tri_vertices(&mesh.tris)) else {
            return MeshOutcome::Skipped;
        };
        let Some(lins) = self.upload(mesh, HandleSlot::Lins, modified, || lin_instances(&mesh.lins)) else {
            return MeshOutcome::Skipped;
        };
        let Some(dots) = self.upload(mesh, HandleSlot::Dots, modified, || dot_instances(&mesh.dots)) else {
            return MeshOutcome::Skipped;
        };

        let nonempty = |b: &Option<Buffer>| b.as_ref().is_some_and(|b| !b.is_empty());
        if !nonempty(&tris) && !nonempty(&lins) && !nonempty(&dots) {
            mesh.clear_modified();
            return MeshOutcome::Empty;
        }

        if let Err(err) = self.write_uniforms(mesh, vert_h, frag_h, modified, z_offset) {
            log::warn!("uniform upload failed: {err:#}");
            return MeshOutcome::Skipped;
        }

        let device = self.gpu.device();
        let (Some(vert), Some(frag)) = (self.resources.buffer_for(vert_h), self.resources.buffer_for(frag_h)) else {
            return MeshOutcome::Skipped;
        };
        let (Some(vert), Some(frag)) = (vert.raw(), frag.raw()) else { return MeshOutcome::Skipped };
        let Some(texture) = self.resources.texture_for(mesh.texture) else { return MeshOutcome::Skipped };
        let bind_group = self.pipelines.mesh_bind_group(device, vert, frag, &texture);

        let mut calls = 0;

        if let Some(tris) = tris.as_ref().filter(|b| !b.is_empty())
            && let Some(raw) = tris.raw()
        {
            pass.set_pipeline(&self.pipelines.tri);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, raw.slice(..));
            pass.draw(0..tris.len(), 0..1);
            calls += 1;
        }

        if let Some(lins) = lins.as_ref().filter(|b| !b.is_empty())
            && let (Some(raw), Some(corners), Some(indices)) = (
                lins.raw(),
                self.templates.line_corners.raw(),
                self.templates.line_indices.raw(),
            )
        {
            pass.set_pipeline(&self.pipelines.lin);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, corners.slice(..));
            pass.set_vertex_buffer(1, raw.slice(..));
            pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.templates.line_indices.len(), 0, 0..lins.len());
            calls += 1;
        }

        if let Some(dots) = dots.as_ref().filter(|b| !b.is_empty())
            && let (Some(raw), Some(corners), Some(indices)) = (
                dots.raw(),
                self.templates.dot_corners.raw(),
                self.templates.dot_indices.raw(),
            )
        {
            pass.set_pipeline(&self.pipelines.dot);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, corners.slice(..));
            pass.set_vertex_buffer(1, raw.slice(..));
            pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.templates.dot_indices.len(), 0, 0..dots.len());
            calls += 1;
        }

        mesh.clear_modified();
        MeshOutcome::Drawn(calls)
    }

    /// Handle stored in `slot`, registering one on first use.
    /// `None` when the pool is exhausted.
    fn slot(&self, handles: &MeshHandles, slot: HandleSlot) -> Option<Handle> {
        let current = handles.get(slot);
        if !current.is_none() {
            return Some(current);
        }
        let fresh = self.resources.register();
        if fresh.is_none() {
            return None;
        }
        handles.set(slot, fresh);
        Some(fresh)
    }

    /// Re-uploads one primitive list when the mesh changed.
    ///
    /// `Some(None)` means the list is empty and needs no buffer; `None`
    /// aborts the mesh for this frame.
    fn upload<T, F>(&self, mesh: &Mesh, slot: HandleSlot, modified: bool, convert: F) -> Option<Option<Buffer>>
    where
        T: Pod,
        F: FnOnce() -> Vec<T>,
    {
        let empty = match slot {
            HandleSlot::Tris => mesh.tris.is_empty(),
            HandleSlot::Lins => mesh.lins.is_empty(),
            HandleSlot::Dots => mesh.dots.is_empty(),
            HandleSlot::VertUniform | HandleSlot::FragUniform => true,
        };
        if empty {
            return Some(None);
        }

        let handle = self.slot(mesh.handles(), slot)?;
        if modified {
            let data = convert();
            if let Err(err) = self.resources.write(handle, &data, BufferKind::Vertex) {
                log::warn!("mesh upload failed: {err:#}");
                return None;
            }
        }
        Some(self.resources.buffer_for(handle))
    }

    fn write_uniforms(
        &self,
        mesh: &Mesh,
        vert_h: Handle,
        frag_h: Handle,
        modified: bool,
        z_offset: f32,
    ) -> Result<()> {
        let m = &self.matrices;
        let scale = self.inlet.size.width as f32 / self.config.reference_width.max(1.0);
        let vu = VertUniform {
            model_view: m.model_view.to_cols_array_2d(),
            projection: m.projection.to_cols_array_2d(),
            normal: m.normal.to_cols_array_2d(),
            viewport_size: [self.screen.width as f32, self.screen.height as f32],
            inlet_size: [self.inlet.size.width as f32, self.inlet.size.height as f32],
            stroke_radius: mesh.uniform.stroke_radius * scale,
            max_miter_scale: mesh.uniform.stroke_miter_scale,
            dot_radius: mesh.uniform.dot_radius * scale,
            z_offset,
        };
        self.resources.write_uniform(vert_h, &vu)?;

        let frag_missing = self
            .resources
            .buffer_for(frag_h)
            .is_none_or(|b| b.raw().is_none());
        if modified || frag_missing {
            let fu = FragUniform {
                opacity: mesh.uniform.opacity,
                gloss: mesh.uniform.gloss,
                _pad: [0.0; 2],
            };
            self.resources.write_uniform(frag_h, &fu)?;
        }
        Ok(())
    }
}

fn probe_sample_count(gpu: &Gpu, config: &RendererConfig) -> u32 {
    let count = gpu.supported_sample_count(&[COLOR_FORMAT, DEPTH_FORMAT], config.max_sample_count);
    log::info!("using {count}x multisampling");
    count
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::device::headless;
    use crate::resources::PoolLimits;
    use crate::scene::{Scene, Tri, TriVertex};

    fn renderer(stack: &ActiveStack, config: RendererConfig) -> Option<Renderer> {
        let gpu = headless()?;
        Some(Renderer::with_gpu(gpu, config, stack).unwrap())
    }

    /// Triangle at z = 0 spanning `extent` world units each way.
    fn triangle(col: ColorRgba, extent: f32) -> Mesh {
        let vert = |x: f32, y: f32| TriVertex {
            pos: Vec3::new(x, y, 0.0),
            norm: Vec3::Z,
            uv: Vec2::ZERO,
            col,
        };
        let mut mesh = Mesh::new();
        mesh.tris.push(Tri {
            verts: [vert(-extent, -extent), vert(extent, -extent), vert(0.0, extent)],
        });
        mesh
    }

    fn square_scene(background: ColorRgba, meshes: Vec<Mesh>) -> Arc<Viewport> {
        Arc::new(Viewport::new(Scene {
            background,
            aspect_ratio: 1.0,
            meshes,
            ..Scene::default()
        }))
    }

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let at = ((y * width + x) * 4) as usize;
        [frame[at], frame[at + 1], frame[at + 2], frame[at + 3]]
    }

    #[test]
    fn empty_frame_is_background() {
        let stack = ActiveStack::new();
        let Some(mut r) = renderer(&stack, RendererConfig::default()) else { return };
        r.set_screen_size(32, 32, true).unwrap();
        r.recache(&square_scene(ColorRgba::new(0.0, 0.0, 1.0, 1.0), Vec::new()));

        let stats = r.render();
        assert_eq!(stats.draw_calls, 0);

        let mut frame = vec![0u8; 32 * 32 * 4];
        r.blit(&mut frame).unwrap();
        assert_eq!(pixel(&frame, 32, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 32, 31, 31), [255, 0, 0, 255]);
    }

    #[test]
    fn triangle_covers_center() {
        let stack = ActiveStack::new();
        let Some(mut r) = renderer(&stack, RendererConfig::default()) else { return };
        r.set_screen_size(64, 64, true).unwrap();
        let red = ColorRgba::new(1.0, 0.0, 0.0, 1.0);
        let blue = ColorRgba::new(0.0, 0.0, 1.0, 1.0);
        // one world unit at the default camera distance is a quarter of the half-frame
        r.recache(&square_scene(blue, vec![triangle(red, 1.0)]));

        let stats = r.render();
        assert_eq!(stats.meshes_drawn, 1);
        assert_eq!(stats.draw_calls, 1);

        let mut frame = vec![0u8; 64 * 64 * 4];
        r.blit(&mut frame).unwrap();
        assert_eq!(pixel(&frame, 64, 32, 32), [0, 0, 255, 255]);
        assert_eq!(pixel(&frame, 64, 0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 64, 63, 63), [255, 0, 0, 255]);

        // second frame reuses the uploads
        let before = r.resources().live_buffers();
        r.render();
        assert_eq!(r.resources().live_buffers(), before);
    }

    #[test]
    fn chrome_surrounds_inlet() {
        let stack = ActiveStack::new();
        let Some(mut r) = renderer(&stack, RendererConfig::default()) else { return };
        r.set_screen_size(200, 100, false).unwrap();
        let blue = ColorRgba::new(0.0, 0.0, 1.0, 1.0);
        r.recache(&square_scene(blue, Vec::new()));

        let stats = r.render();
        assert_eq!(stats.draw_calls, 1);

        let mut frame = vec![0u8; 200 * 100 * 4];
        r.blit(&mut frame).unwrap();
        assert_eq!(pixel(&frame, 200, 100, 50), [255, 0, 0, 255]);
        assert_ne!(pixel(&frame, 200, 2, 50), [255, 0, 0, 255]);
    }

    #[test]
    fn transparent_mesh_is_skipped() {
        let stack = ActiveStack::new();
        let Some(mut r) = renderer(&stack, RendererConfig::default()) else { return };
        r.set_screen_size(16, 16, true).unwrap();
        let mut mesh = triangle(ColorRgba::white(), 10.0);
        mesh.uniform.opacity = 0.0;
        r.recache(&square_scene(ColorRgba::black(), vec![mesh]));

        let stats = r.render();
        assert_eq!(stats.meshes_skipped, 1);
        assert_eq!(stats.draw_calls, 0);
        assert_eq!(r.resources().live_buffers(), 0);
    }

    #[test]
    fn exhausted_pool_skips_mesh() {
        let stack = ActiveStack::new();
        let config = RendererConfig {
            pool: PoolLimits {
                max_buffers: 4,
                ..PoolLimits::default()
            },
            ..RendererConfig::default()
        };
        let Some(mut r) = renderer(&stack, config) else { return };
        r.set_screen_size(16, 16, true).unwrap();
        r.recache(&square_scene(ColorRgba::black(), vec![triangle(ColorRgba::white(), 10.0)]));

        let stats = r.render();
        assert_eq!(stats.meshes_skipped, 1);
        assert_eq!(stats.meshes_drawn, 0);
    }

    #[test]
    fn only_top_renderer_draws() {
        let stack = ActiveStack::new();
        let Some(mut first) = renderer(&stack, RendererConfig::default()) else { return };
        first.set_screen_size(16, 16, true).unwrap();
        first.recache(&square_scene(ColorRgba::black(), vec![triangle(ColorRgba::white(), 10.0)]));
        {
            let Some(mut second) = renderer(&stack, RendererConfig::default()) else { return };
            second.set_screen_size(16, 16, true).unwrap();

            let paused = first.render();
            assert!(paused.inactive);
            assert_eq!(paused.draw_calls, 0);
            assert_eq!(paused.meshes_drawn, 0);
            assert_eq!(first.resources().live_buffers(), 0);
            assert!(!second.render().inactive);
        }
        let resumed = first.render();
        assert!(!resumed.inactive);
        assert_eq!(resumed.draw_calls, 1);
    }

    #[test]
    fn mesh_moves_between_renderers() {
        let stack = ActiveStack::new();
        let viewport = square_scene(ColorRgba::black(), vec![triangle(ColorRgba::white(), 10.0)]);

        let Some(mut first) = renderer(&stack, RendererConfig::default()) else { return };
        first.set_screen_size(16, 16, true).unwrap();
        first.recache(&viewport);
        assert_eq!(first.render().meshes_drawn, 1);
        let used = first.resources().live_buffers();
        assert!(used >= 3);

        let Some(mut second) = renderer(&stack, RendererConfig::default()) else { return };
        second.set_screen_size(16, 16, true).unwrap();
        second.recache(&viewport);
        assert_eq!(second.render().meshes_drawn, 1);

        // the first renderer's handles went back to its pool
        assert_eq!(first.resources().live_buffers(), 0);
        assert_eq!(second.resources().live_buffers(), used);
    }

    #[test]
    fn resize_is_repeatable() {
        let stack = ActiveStack::new();
        let Some(mut r) = renderer(&stack, RendererConfig::default()) else { return };
        r.set_screen_size(40, 30, false).unwrap();
        let inlet = *r.inlet();
        let matrices = *r.matrices();
        r.set_screen_size(40, 30, false).unwrap();
        assert_eq!(*r.inlet(), inlet);
        assert_eq!(*r.matrices(), matrices);
        assert_eq!(r.screen_size(), PixelSize::new(40, 30));
        assert!(r.sample_count() >= 1);

        let targets = r.targets.as_ref().unwrap();
        assert_eq!(targets.size(), PixelSize::new(40, 30));
        assert_eq!(targets.sample_count(), r.sample_count());
    }

    #[test]
    fn rejects_bad_sizes() {
        let stack = ActiveStack::new();
        let Some(mut r) = renderer(&stack, RendererConfig::default()) else { return };
        assert!(r.blit(&mut [0u8; 4]).is_err());
        assert!(r.set_screen_size(0, 10, false).is_err());

        r.set_screen_size(8, 8, true).unwrap();
        r.render();
        assert!(r.blit(&mut [0u8; 4]).is_err());
    }
}
