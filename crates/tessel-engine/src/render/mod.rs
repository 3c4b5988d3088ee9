//! Offscreen rendering of a [`Viewport`](crate::scene::Viewport).
//!
//! A [`Renderer`] owns its multisampled color and depth targets, a staging
//! buffer for readback and a [`ResourceManager`](crate::resources::ResourceManager)
//! holding every mesh buffer it uploads.
//!
//! Convention:
//! - Scene geometry is in world units; the camera maps it into the inlet,
//!   a fixed-aspect rectangle centered in the target.
//! - The border around the inlet (the chrome) is drawn first at depth 0,
//!   so meshes never bleed into it.
//! - Frames are read back as tightly packed BGRA8, top row first.

mod chrome;
mod config;
mod convert;
mod ctx;
mod pipelines;
mod projection;
mod renderer;
mod targets;
mod vertex;

pub(crate) use ctx::RenderCtx;

pub use chrome::{chrome_color, chrome_vertices};
pub use config::RendererConfig;
pub use convert::{dot_instances, lin_instances, tri_vertices};
pub use projection::{CameraMatrices, Inlet};
pub use renderer::{FrameStats, Renderer};
pub use vertex::{DotInstance, FragUniform, FrameVertex, LinInstance, TriVertexGpu, VertUniform};
