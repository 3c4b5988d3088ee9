//! Frame-by-frame export.
//!
//! An [`Exporter`] owns a dedicated [`Renderer`](crate::render::Renderer)
//! at the export resolution. A [`FrameSource`] advances the scene, a
//! [`FrameSink`] receives each frame, and a [`CancelToken`] stops the run
//! between frames.

mod cancel;
mod exporter;
mod settings;
mod sink;

pub use cancel::CancelToken;
pub use exporter::{ExportSummary, Exporter};
pub use settings::ExportSettings;
pub use sink::{FrameSink, FrameSource, PngSequence};
