//! Tessel engine crate.
//!
//! Offscreen GPU rendering of animated scenes made of triangles, stroked
//! polylines and dots, for interactive preview and frame-by-frame export.

pub mod device;
pub mod logging;

pub mod coords;
pub mod resources;
pub mod scene;

pub mod export;
pub mod render;

pub use resources::{poll_texture, release_buffer, release_texture};
