use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::device::Gpu;
use crate::render::{Renderer, RendererConfig};
use crate::resources::ActiveStack;

use super::{CancelToken, ExportSettings, FrameSink, FrameSource};

/// Result of a finished or cancelled export.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ExportSummary {
    pub frames: u64,
    pub cancelled: bool,
}

/// Renders a frame sequence with its own renderer.
///
/// The renderer's resource manager sits on top of the active stack from
/// construction until the exporter is dropped, so an interactive renderer
/// sharing the stack records nothing in between.
pub struct Exporter {
    settings: ExportSettings,
    renderer: Renderer,
    frame: Vec<u8>,
    cancel: CancelToken,
}

impl Exporter {
    pub fn new(
        gpu: Arc<Gpu>,
        settings: ExportSettings,
        config: RendererConfig,
        stack: &ActiveStack,
    ) -> Result<Self> {
        settings.validate().context("invalid export settings")?;

        let mut renderer =
            Renderer::with_gpu(gpu, config, stack).context("export renderer creation failed")?;
        renderer
            .set_screen_size(settings.width, settings.height, true)
            .context("export target creation failed")?;

        Ok(Self {
            settings,
            renderer,
            frame: vec![0; settings.size().packed_len()],
            cancel: CancelToken::new(),
        })
    }

    /// Token that stops `run` before its next frame.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Renders frames until `source` runs out or the token is cancelled,
    /// then tears the renderer down.
    pub fn run(mut self, source: &mut dyn FrameSource, sink: &mut dyn FrameSink) -> Result<ExportSummary> {
        let s = self.settings;
        log::info!("export started: {}x{} at {} fps", s.width, s.height, s.fps);

        let viewport = source.viewport();
        let mut summary = ExportSummary::default();

        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let index = summary.frames;
            let more = source
                .advance(index, s.frame_time(index))
                .with_context(|| format!("scene update for frame {index} failed"))?;
            if !more {
                break;
            }

            self.renderer.recache(&viewport);
            let stats = self.renderer.render();
            if stats.inactive {
                bail!("export renderer lost the active stack at frame {index}");
            }
            self.renderer
                .blit(&mut self.frame)
                .with_context(|| format!("readback of frame {index} failed"))?;
            sink.write_frame(index, s.size(), &self.frame)
                .with_context(|| format!("writing frame {index} failed"))?;

            log::debug!("exported frame {index} ({} draw calls)", stats.draw_calls);
            summary.frames += 1;
        }

        if summary.cancelled {
            log::info!("export cancelled after {} frames", summary.frames);
        } else {
            log::info!("export finished: {} frames", summary.frames);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::coords::{ColorRgba, PixelSize};
    use crate::device::headless;
    use crate::scene::{Dot, Mesh, Scene, Viewport};

    struct Orbit {
        viewport: Arc<Viewport>,
        frames: u64,
    }

    impl FrameSource for Orbit {
        fn viewport(&self) -> Arc<Viewport> {
            self.viewport.clone()
        }

        fn advance(&mut self, index: u64, time: f64) -> Result<bool> {
            if index >= self.frames {
                return Ok(false);
            }
            let mut scene = self.viewport.write();
            scene.camera.origin = Vec3::new(time.sin() as f32, 0.0, 4.0);
            for mesh in &scene.meshes {
                mesh.mark_modified();
            }
            Ok(true)
        }
    }

    #[derive(Default)]
    struct Collect {
        frames: Vec<(u64, usize)>,
        cancel_after: Option<(u64, CancelToken)>,
    }

    impl FrameSink for Collect {
        fn write_frame(&mut self, index: u64, size: PixelSize, bgra: &[u8]) -> Result<()> {
            assert_eq!(bgra.len(), size.packed_len());
            self.frames.push((index, bgra.len()));
            if let Some((after, token)) = &self.cancel_after
                && index + 1 >= *after
            {
                token.cancel();
            }
            Ok(())
        }
    }

    fn orbit(frames: u64) -> Orbit {
        let mut mesh = Mesh::new();
        mesh.dots.push(Dot {
            pos: Vec3::ZERO,
            norm: Vec3::Z,
            col: ColorRgba::white(),
            angle: 0.0,
        });
        Orbit {
            viewport: Arc::new(Viewport::new(Scene {
                meshes: vec![mesh],
                ..Scene::default()
            })),
            frames,
        }
    }

    fn small() -> ExportSettings {
        ExportSettings {
            width: 32,
            height: 18,
            fps: 10,
        }
    }

    #[test]
    fn invalid_settings_fail_before_rendering() {
        let Some(gpu) = headless() else { return };
        let stack = ActiveStack::new();
        let bad = ExportSettings { width: 33, ..small() };
        assert!(Exporter::new(gpu, bad, RendererConfig::default(), &stack).is_err());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn exports_every_frame_then_pops() {
        let Some(gpu) = headless() else { return };
        let stack = ActiveStack::new();
        let exporter = Exporter::new(gpu, small(), RendererConfig::default(), &stack).unwrap();
        assert_eq!(stack.depth(), 1);

        let mut sink = Collect::default();
        let summary = exporter.run(&mut orbit(4), &mut sink).unwrap();

        assert_eq!(summary, ExportSummary { frames: 4, cancelled: false });
        assert_eq!(sink.frames.iter().map(|f| f.0).collect::<Vec<_>>(), [0, 1, 2, 3]);
        assert!(sink.frames.iter().all(|f| f.1 == 32 * 18 * 4));
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn cancel_stops_between_frames() {
        let Some(gpu) = headless() else { return };
        let stack = ActiveStack::new();
        let exporter = Exporter::new(gpu, small(), RendererConfig::default(), &stack).unwrap();

        let mut sink = Collect {
            cancel_after: Some((2, exporter.cancel_token())),
            ..Collect::default()
        };
        let summary = exporter.run(&mut orbit(100), &mut sink).unwrap();

        assert_eq!(summary, ExportSummary { frames: 2, cancelled: true });
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn interactive_renderer_pauses_during_export() {
        let Some(gpu) = headless() else { return };
        let stack = ActiveStack::new();
        let mut interactive = Renderer::with_gpu(gpu.clone(), RendererConfig::default(), &stack).unwrap();
        interactive.set_screen_size(16, 16, false).unwrap();

        let exporter = Exporter::new(gpu, small(), RendererConfig::default(), &stack).unwrap();
        assert!(interactive.render().inactive);

        exporter.run(&mut orbit(1), &mut Collect::default()).unwrap();
        assert!(!interactive.render().inactive);
    }
}
