//! GPU resource pool.
//!
//! Buffers and textures are addressed by integer [`Handle`]s so scene meshes
//! can hold on to them across frames. A [`ResourceManager`] owns the pool for
//! one renderer; the [`ActiveStack`] decides which manager is live.

mod active;
mod backend;
mod buffer;
mod handle;
mod manager;
mod texture;

pub use active::{ActiveStack, ManagerId, ResourceRoute, poll_texture, release_buffer, release_texture};
pub use backend::{GpuBackend, GpuTexture, WgpuBackend};
pub use buffer::{BufferKind, GpuBuffer, WriteKind};
pub use handle::Handle;
pub use manager::{PoolLimits, ResourceManager};

#[cfg(test)]
pub(crate) use backend::tests as backend_tests;
