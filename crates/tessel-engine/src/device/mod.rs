//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a surface
//! - probing multisample support for render target formats
//! - waiting on the queue for CPU readback

mod gpu;
mod init;

pub use gpu::Gpu;
pub use init::GpuInit;

#[cfg(test)]
pub(crate) use gpu::tests::headless;
