use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use bytemuck::Pod;
use image::RgbaImage;
use parking_lot::Mutex;

use super::active::{ActiveStack, ManagerId, ResourceRoute};
use super::backend::GpuBackend;
use super::buffer::{BufferKind, GpuBuffer, WriteKind};
use super::handle::{Handle, HandlePool};
use super::texture;

/// Pool sizes. Buffer ids are issued from `2..max_buffers` and texture ids
/// from `2..max_textures`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PoolLimits {
    pub max_buffers: u32,
    pub max_textures: u32,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_buffers: 1 << 16,
            max_textures: 1 << 8,
        }
    }
}

struct PoolState<B: GpuBackend> {
    free_buffers: HandlePool,
    buffers: BTreeMap<Handle, GpuBuffer<B::Buffer>>,
    // warn once per exhaustion episode
    buffers_exhausted: bool,

    free_textures: HandlePool,
    textures: BTreeMap<Handle, B::Texture>,
    texture_paths: HashMap<PathBuf, Handle>,
}

/// Owns every GPU buffer and texture a renderer draws with.
///
/// Handles are plain integers so meshes can cache them. All mutation goes
/// through one lock; texture decoding happens outside it.
pub struct ResourceManager<B: GpuBackend> {
    id: ManagerId,
    backend: B,
    stack: ActiveStack,
    max_textures: u32,
    state: Mutex<PoolState<B>>,
}

impl<B: GpuBackend> ResourceManager<B> {
    /// Creates a manager, binds the blank and missing-image textures, and
    /// pushes it onto `stack` as the active manager.
    pub fn new(backend: B, limits: PoolLimits, stack: &ActiveStack) -> Arc<Self> {
        let max_buffers = limits.max_buffers.max(Handle::FIRST_LIVE);
        let max_textures = limits.max_textures.max(Handle::FIRST_LIVE);

        let mut textures = BTreeMap::new();
        textures.insert(
            Handle::BLANK,
            backend.create_texture(&texture::blank_image(), "blank texture"),
        );
        textures.insert(
            Handle::MISSING,
            backend.create_texture(&texture::missing_image(), "missing texture"),
        );

        let manager = Arc::new(Self {
            id: ManagerId::next(),
            backend,
            stack: stack.clone(),
            max_textures,
            state: Mutex::new(PoolState {
                free_buffers: HandlePool::with_range(Handle::FIRST_LIVE..max_buffers),
                buffers: BTreeMap::new(),
                buffers_exhausted: false,
                free_textures: HandlePool::with_range(Handle::FIRST_LIVE..max_textures),
                textures,
                texture_paths: HashMap::new(),
            }),
        });

        let route: Arc<dyn ResourceRoute> = manager.clone();
        stack.push(manager.id, Arc::downgrade(&route));
        manager
    }

    #[inline]
    pub fn id(&self) -> ManagerId {
        self.id
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True when this manager is on top of its stack.
    pub fn is_active(&self) -> bool {
        self.stack.is_top(self.id)
    }

    pub fn stack(&self) -> &ActiveStack {
        &self.stack
    }

    /// Reserves a buffer id bound to an empty buffer.
    /// Returns [`Handle::NONE`] when the pool is exhausted.
    pub fn register(&self) -> Handle {
        let mut state = self.state.lock();
        let Some(handle) = state.free_buffers.acquire() else {
            if !state.buffers_exhausted {
                log::warn!("buffer pool exhausted ({} live)", state.buffers.len());
                state.buffers_exhausted = true;
            }
            return Handle::NONE;
        };
        state
            .buffers
            .insert(handle, GpuBuffer::empty(BufferKind::Vertex));
        handle
    }

    /// Releases a buffer id. Ignores `0` and ids this manager did not issue.
    pub fn deregister(&self, handle: Handle) -> bool {
        if handle.is_none() {
            return false;
        }
        let mut state = self.state.lock();
        if state.buffers.remove(&handle).is_none() {
            log::warn!("deregister of unknown buffer {handle}");
            return false;
        }
        state.buffers_exhausted = false;
        state.free_buffers.release(handle)
    }

    /// Uploads `data` into the buffer bound to `handle`.
    ///
    /// Uniform writes must carry exactly one element and always replace the
    /// previous buffer. Vertex writes reuse the allocation while they fit.
    /// Index buffers are immutable and replaced on every write.
    pub fn write<T: Pod>(&self, handle: Handle, data: &[T], kind: BufferKind) -> Result<WriteKind> {
        if kind == BufferKind::Uniform && data.len() != 1 {
            bail!(
                "uniform write to {handle} carries {} elements, expected exactly 1",
                data.len()
            );
        }

        let mut state = self.state.lock();
        let Some(slot) = state.buffers.get_mut(&handle) else {
            bail!("write to unregistered buffer {handle}");
        };

        let label = buffer_label(kind);
        if slot.kind() != kind {
            *slot = GpuBuffer::empty(kind);
        }
        let outcome = match kind {
            BufferKind::Vertex => slot.write_or_grow(&self.backend, data, label),
            BufferKind::Index | BufferKind::Uniform => {
                *slot = if data.is_empty() {
                    GpuBuffer::empty(kind)
                } else {
                    GpuBuffer::from_slice(&self.backend, kind, data, label)
                };
                if data.is_empty() {
                    WriteKind::Empty
                } else {
                    WriteKind::Reallocated
                }
            }
        };
        Ok(outcome)
    }

    pub fn write_uniform<T: Pod>(&self, handle: Handle, value: &T) -> Result<()> {
        self.write(handle, std::slice::from_ref(value), BufferKind::Uniform)
            .map(|_| ())
    }

    /// Snapshot of the buffer bound to `handle`. Backend buffers are
    /// reference counted, so the copy stays valid after a later reallocation.
    pub fn buffer_for(&self, handle: Handle) -> Option<GpuBuffer<B::Buffer>> {
        self.state.lock().buffers.get(&handle).cloned()
    }

    /// Loads a texture by path, caching successful loads.
    ///
    /// Returns [`Handle::NONE`] when the texture pool is exhausted and
    /// [`Handle::MISSING`] when the file cannot be decoded.
    pub fn poll_texture(&self, path: &Path) -> Handle {
        let reserved = {
            let mut state = self.state.lock();
            if let Some(&cached) = state.texture_paths.get(path) {
                return cached;
            }
            let Some(slot) = state.free_textures.acquire() else {
                log::warn!("texture pool exhausted while loading {}", path.display());
                return Handle::NONE;
            };
            slot
        };

        let decoded = texture::decode(path, self.backend.max_texture_dimension());

        let mut state = self.state.lock();
        match decoded {
            Err(err) => {
                state.free_textures.release(reserved);
                log::warn!("{err:#}");
                Handle::MISSING
            }
            Ok(image) => {
                if let Some(&cached) = state.texture_paths.get(path) {
                    // another caller finished first
                    state.free_textures.release(reserved);
                    return cached;
                }
                let tex = self.backend.create_texture(&image, &path.display().to_string());
                state.textures.insert(reserved, tex);
                state.texture_paths.insert(path.to_path_buf(), reserved);
                log::debug!("texture {} bound to {reserved}", path.display());
                reserved
            }
        }
    }

    /// Decodes `path` and binds it to the explicit slot `wanted`, replacing
    /// whatever was there. Returns [`Handle::MISSING`] on failure.
    pub fn create_texture(&self, path: &Path, wanted: Handle) -> Handle {
        if !self.is_texture_slot(wanted) {
            return Handle::MISSING;
        }
        match texture::decode(path, self.backend.max_texture_dimension()) {
            Ok(image) => self.bind_image(&image, wanted, &path.display().to_string()),
            Err(err) => {
                log::warn!("{err:#}");
                Handle::MISSING
            }
        }
    }

    /// Binds an in-memory image to `wanted`. Slots outside the texture pool
    /// are refused with [`Handle::MISSING`].
    pub fn bind_image(&self, image: &RgbaImage, wanted: Handle, label: &str) -> Handle {
        if !self.is_texture_slot(wanted) {
            return Handle::MISSING;
        }
        let tex = self.backend.create_texture(image, label);
        let mut state = self.state.lock();
        state.free_textures.take(wanted);
        state.texture_paths.retain(|_, h| *h != wanted);
        state.textures.insert(wanted, tex);
        wanted
    }

    fn is_texture_slot(&self, handle: Handle) -> bool {
        if handle.is_reserved_texture() {
            log::warn!("refusing to overwrite reserved texture {handle}");
            return false;
        }
        if handle.raw() >= self.max_textures {
            log::warn!("texture {handle} is outside the pool (max {})", self.max_textures);
            return false;
        }
        true
    }

    /// Frees a texture slot. The blank and missing-image slots are never released.
    pub fn release_texture(&self, handle: Handle) -> bool {
        if handle.is_reserved_texture() {
            return false;
        }
        let mut state = self.state.lock();
        if state.textures.remove(&handle).is_none() {
            return false;
        }
        state.texture_paths.retain(|_, h| *h != handle);
        state.free_textures.release(handle)
    }

    /// Texture bound to `handle`, or the missing-image placeholder.
    pub fn texture_for(&self, handle: Handle) -> Option<B::Texture> {
        let state = self.state.lock();
        state
            .textures
            .get(&handle)
            .or_else(|| state.textures.get(&Handle::MISSING))
            .cloned()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    pub fn available_buffers(&self) -> usize {
        self.state.lock().free_buffers.available()
    }

    pub fn live_textures(&self) -> usize {
        self.state.lock().textures.len()
    }
}

impl<B: GpuBackend> ResourceRoute for ResourceManager<B> {
    fn poll_texture(&self, path: &Path) -> Handle {
        ResourceManager::poll_texture(self, path)
    }

    fn release_buffer(&self, handle: Handle) -> bool {
        self.deregister(handle)
    }

    fn release_texture(&self, handle: Handle) -> bool {
        ResourceManager::release_texture(self, handle)
    }
}

impl<B: GpuBackend> Drop for ResourceManager<B> {
    fn drop(&mut self) {
        self.stack.remove(self.id);
        let state = self.state.get_mut();
        log::debug!(
            "resource manager {} dropped with {} buffers and {} textures",
            self.id.raw(),
            state.buffers.len(),
            state.textures.len()
        );
    }
}

fn buffer_label(kind: BufferKind) -> &'static str {
    match kind {
        BufferKind::Vertex => "pooled vertex buffer",
        BufferKind::Index => "pooled index buffer",
        BufferKind::Uniform => "pooled uniform buffer",
    }
}
