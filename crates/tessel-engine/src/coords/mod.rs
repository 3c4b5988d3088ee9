//! Small value types shared by the scene model and the renderer.
//!
//! Colors are straight alpha. Sizes are physical pixels; the renderer works
//! in NDC after projection, so no logical-pixel space exists here.

mod color;
mod size;

pub use color::{ColorRgba, ALPHA_EPSILON};
pub use size::PixelSize;
