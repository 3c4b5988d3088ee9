use std::f32::consts::TAU;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};

use tessel_engine::coords::ColorRgba;
use tessel_engine::device::{Gpu, GpuInit};
use tessel_engine::export::{ExportSettings, Exporter, FrameSink, FrameSource, PngSequence};
use tessel_engine::logging::{LoggingConfig, init_logging};
use tessel_engine::render::{Renderer, RendererConfig};
use tessel_engine::resources::ActiveStack;
use tessel_engine::scene::{Camera, Dot, Mesh, Scene, Tri, TriVertex, Viewport};

const PREVIEW: (u32, u32) = (960, 540);

/// Usage: `tessel-studio [OUTPUT_DIR] [FRAMES]`
fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    let out = PathBuf::from(args.next().unwrap_or_else(|| "tessel-out".to_owned()));
    let frames: u64 = match args.next() {
        Some(n) => n.parse().with_context(|| format!("frame count {n:?} is not a number"))?,
        None => 60,
    };

    let gpu = Arc::new(Gpu::new_blocking(GpuInit::default())?);
    let viewport = Arc::new(Viewport::new(demo_scene()));
    let stack = ActiveStack::global();

    // Interactive preview: one frame through the display renderer.
    let mut display = Renderer::with_gpu(gpu.clone(), RendererConfig::default(), stack)?;
    display.set_screen_size(PREVIEW.0, PREVIEW.1, false)?;
    display.recache(&viewport);
    let stats = display.render();
    log::info!(
        "preview: {} meshes, {} draw calls, {} skipped",
        stats.meshes_drawn,
        stats.draw_calls,
        stats.meshes_skipped
    );

    let mut frame = vec![0; display.screen_size().packed_len()];
    display.blit(&mut frame)?;
    let mut preview = PngSequence::new(out.join("preview"))?;
    preview.write_frame(0, display.screen_size(), &frame)?;

    // Export: the display renderer stays idle until the exporter is done.
    let settings = ExportSettings {
        width: 640,
        height: 360,
        fps: 30,
    };
    let exporter = Exporter::new(gpu, settings, RendererConfig::default(), stack)?;
    let mut sink = PngSequence::new(out.join("frames"))?;
    let mut source = Turntable {
        viewport: viewport.clone(),
        frames,
    };
    let summary = exporter.run(&mut source, &mut sink)?;

    println!(
        "wrote {} frames to {}{}",
        summary.frames,
        sink.dir().display(),
        if summary.cancelled { " (cancelled)" } else { "" }
    );

    // Display renderer is active again.
    display.recache(&viewport);
    display.render();
    Ok(())
}

/// Orbits the camera once around the scene over the export.
struct Turntable {
    viewport: Arc<Viewport>,
    frames: u64,
}

impl FrameSource for Turntable {
    fn viewport(&self) -> Arc<Viewport> {
        self.viewport.clone()
    }

    fn advance(&mut self, index: u64, _time: f64) -> Result<bool> {
        if index >= self.frames {
            return Ok(false);
        }
        let angle = TAU * index as f32 / self.frames.max(1) as f32;
        let origin = Vec3::new(4.0 * angle.sin(), 1.5, 4.0 * angle.cos());

        let mut scene = self.viewport.write();
        scene.camera = Camera::looking_at(origin, Vec3::ZERO, Vec3::Y);
        if let Some(ring) = scene.meshes.last_mut() {
            ring.uniform.dot_radius = 4.0 + 2.0 * (angle * 3.0).sin();
            ring.mark_modified();
        }
        Ok(true)
    }
}

fn demo_scene() -> Scene {
    let floor = {
        let corner = |x: f32, z: f32, col: ColorRgba| TriVertex {
            pos: Vec3::new(x, -1.0, z),
            norm: Vec3::Y,
            uv: Vec2::new((x + 1.5) / 3.0, (z + 1.5) / 3.0),
            col,
        };
        let warm = ColorRgba::new(0.9, 0.6, 0.3, 1.0);
        let cool = ColorRgba::new(0.3, 0.5, 0.9, 1.0);
        let (a, b) = (corner(-1.5, -1.5, warm), corner(1.5, -1.5, cool));
        let (c, d) = (corner(1.5, 1.5, warm), corner(-1.5, 1.5, cool));

        let mut mesh = Mesh::new();
        mesh.tris.push(Tri { verts: [a, b, c] });
        mesh.tris.push(Tri { verts: [a, c, d] });
        mesh.uniform.gloss = 0.3;
        mesh
    };

    let outline = {
        let hexagon: Vec<Vec3> = (0..6)
            .map(|i| {
                let t = TAU * i as f32 / 6.0;
                Vec3::new(t.cos(), 0.0, t.sin())
            })
            .collect();
        let mut mesh = Mesh::new();
        mesh.push_polyline(&hexagon, ColorRgba::white(), true);
        mesh.uniform.stroke_radius = 3.0;
        mesh
    };

    let ring = {
        let mut mesh = Mesh::new();
        mesh.dots.extend((0..12).map(|i| {
            let t = TAU * i as f32 / 12.0;
            Dot {
                pos: Vec3::new(1.3 * t.cos(), 0.5, 1.3 * t.sin()),
                norm: Vec3::Y,
                col: ColorRgba::new(1.0, 0.3, 0.4, 1.0),
                angle: t,
            }
        }));
        mesh
    };

    Scene {
        background: ColorRgba::new(0.08, 0.08, 0.1, 1.0),
        meshes: vec![floor, outline, ring],
        ..Scene::default()
    }
}
