//! Scene data the renderer consumes.
//!
//! Responsibilities:
//! - mesh geometry (triangles, stroke segments, dots) and its material block
//! - the camera and lifecycle state of the viewport
//! - per-mesh pool handles and the "modified" flag the renderer clears

mod camera;
mod mesh;
mod viewport;

pub use camera::Camera;
pub use mesh::{Dot, HandleSlot, Lin, LinVertex, Mesh, MeshHandles, MeshUniform, Tri, TriVertex};
pub use viewport::{Scene, Viewport, ViewportSnapshot, ViewportState};
