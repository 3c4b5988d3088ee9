use bytemuck::Pod;

use super::backend::GpuBackend;

/// What a pooled buffer is bound as.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferKind {
    /// Mutable per-vertex or per-instance data. Updated in place while it fits.
    Vertex,
    /// Immutable `u16` index data.
    Index,
    /// Single-element uniform block. Always replaced wholesale.
    Uniform,
}

/// Outcome of [`GpuBuffer::write_or_grow`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WriteKind {
    /// Contents overwritten inside the existing allocation.
    InPlace,
    /// A fresh allocation sized exactly to the new contents.
    Reallocated,
    /// Zero elements written. The allocation (if any) is kept.
    Empty,
}

/// A typed view over a raw backend buffer.
///
/// `len` counts elements currently valid. `capacity_bytes` is the size of the
/// underlying allocation and only grows through reallocation.
#[derive(Debug, Clone)]
pub struct GpuBuffer<R> {
    raw: Option<R>,
    kind: BufferKind,
    len: u32,
    stride: u32,
    capacity_bytes: u64,
}

impl<R: Clone> GpuBuffer<R> {
    pub fn empty(kind: BufferKind) -> Self {
        Self {
            raw: None,
            kind,
            len: 0,
            stride: 0,
            capacity_bytes: 0,
        }
    }

    pub fn vertex<B, T>(backend: &B, data: &[T], label: &str) -> Self
    where
        B: GpuBackend<Buffer = R>,
        T: Pod,
    {
        Self::from_slice(backend, BufferKind::Vertex, data, label)
    }

    pub fn index<B>(backend: &B, indices: &[u16], label: &str) -> Self
    where
        B: GpuBackend<Buffer = R>,
    {
        Self::from_slice(backend, BufferKind::Index, indices, label)
    }

    pub fn constant<B, T>(backend: &B, value: &T, label: &str) -> Self
    where
        B: GpuBackend<Buffer = R>,
        T: Pod,
    {
        Self::from_slice(backend, BufferKind::Uniform, std::slice::from_ref(value), label)
    }

    /// Writes `data`, reusing the allocation when the buffer is a vertex buffer
    /// with room for it and reallocating otherwise.
    pub fn write_or_grow<B, T>(&mut self, backend: &B, data: &[T], label: &str) -> WriteKind
    where
        B: GpuBackend<Buffer = R>,
        T: Pod,
    {
        if data.is_empty() {
            self.len = 0;
            return WriteKind::Empty;
        }

        let bytes: &[u8] = bytemuck::cast_slice(data);
        let fits = self.kind == BufferKind::Vertex && bytes.len() as u64 <= self.capacity_bytes;

        if let (Some(raw), true) = (&self.raw, fits) {
            backend.write_buffer(raw, bytes);
            self.len = data.len() as u32;
            self.stride = std::mem::size_of::<T>() as u32;
            return WriteKind::InPlace;
        }

        *self = Self::from_slice(backend, self.kind, data, label);
        WriteKind::Reallocated
    }

    #[inline]
    pub fn raw(&self) -> Option<&R> {
        self.raw.as_ref()
    }

    #[inline]
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// Capacity in elements of the current stride.
    pub fn capacity(&self) -> u32 {
        match self.stride {
            0 => 0,
            s => (self.capacity_bytes / s as u64) as u32,
        }
    }

    pub(crate) fn from_slice<B, T>(backend: &B, kind: BufferKind, data: &[T], label: &str) -> Self
    where
        B: GpuBackend<Buffer = R>,
        T: Pod,
    {
        if data.is_empty() {
            return Self::empty(kind);
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self {
            raw: Some(backend.create_buffer(kind, bytes, label)),
            kind,
            len: data.len() as u32,
            stride: std::mem::size_of::<T>() as u32,
            capacity_bytes: bytes.len() as u64,
        }
    }
}
