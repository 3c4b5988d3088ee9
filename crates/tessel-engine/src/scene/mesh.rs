use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use glam::{Vec2, Vec3};
use parking_lot::Mutex;

use crate::coords::ColorRgba;
use crate::resources::{ActiveStack, Handle, ManagerId};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriVertex {
    pub pos: Vec3,
    pub norm: Vec3,
    pub uv: Vec2,
    pub col: ColorRgba,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tri {
    pub verts: [TriVertex; 3],
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinVertex {
    pub pos: Vec3,
    pub col: ColorRgba,
}

/// One stroke segment from `a` to `b`.
///
/// `prev`/`next` index into the owning mesh's `lins`. Of two segments that
/// describe the same edge in opposite directions only the `dominant` one is
/// drawn.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Lin {
    pub a: LinVertex,
    pub b: LinVertex,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub dominant: bool,
}

impl Lin {
    pub fn new(a: LinVertex, b: LinVertex) -> Self {
        Self {
            a,
            b,
            prev: None,
            next: None,
            dominant: true,
        }
    }

    #[inline]
    pub fn tangent(&self) -> Vec3 {
        self.b.pos - self.a.pos
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Dot {
    pub pos: Vec3,
    pub norm: Vec3,
    pub col: ColorRgba,
    pub angle: f32,
}

/// Per-mesh material block. Radii are in pixels at the renderer's reference width.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeshUniform {
    pub opacity: f32,
    pub gloss: f32,
    pub stroke_radius: f32,
    pub stroke_miter_scale: f32,
    pub dot_radius: f32,
}

impl Default for MeshUniform {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            gloss: 0.0,
            stroke_radius: 2.0,
            stroke_miter_scale: 4.0,
            dot_radius: 4.0,
        }
    }
}

/// Pool slots a mesh holds on to between frames.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HandleSlot {
    VertUniform,
    FragUniform,
    Tris,
    Lins,
    Dots,
}

impl HandleSlot {
    pub const ALL: [HandleSlot; 5] = [
        HandleSlot::VertUniform,
        HandleSlot::FragUniform,
        HandleSlot::Tris,
        HandleSlot::Lins,
        HandleSlot::Dots,
    ];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Buffer handles written back by the renderer, tagged with the manager
/// that issued them. Atomic so a renderer can fill them in under the
/// viewport's read lock.
///
/// Dropping the handles returns them to their manager.
#[derive(Debug, Default)]
pub struct MeshHandles {
    owner: AtomicU64,
    slots: [AtomicU32; 5],
    // stack the owner lives on, for release on drop
    stack: Mutex<Option<ActiveStack>>,
}

impl MeshHandles {
    pub fn get(&self, slot: HandleSlot) -> Handle {
        Handle::from_raw(self.slots[slot.index()].load(Ordering::Acquire))
    }

    pub fn set(&self, slot: HandleSlot, handle: Handle) {
        self.slots[slot.index()].store(handle.raw(), Ordering::Release);
    }

    pub fn owner(&self) -> Option<ManagerId> {
        ManagerId::from_raw(self.owner.load(Ordering::Acquire))
    }

    /// Makes `owner`, living on `stack`, the issuing manager.
    ///
    /// When ownership changes, every slot is cleared and the previous owner
    /// is returned with the handles it had issued so they can be released.
    pub fn claim(&self, owner: ManagerId, stack: &ActiveStack) -> Option<(Option<ManagerId>, [Handle; 5])> {
        let prev = self.owner.swap(owner.raw(), Ordering::AcqRel);
        if prev == owner.raw() {
            return None;
        }
        *self.stack.lock() = Some(stack.clone());
        Some((ManagerId::from_raw(prev), self.clear_slots()))
    }

    /// Clears ownership and every slot.
    pub fn take_all(&self) -> (Option<ManagerId>, [Handle; 5]) {
        let prev = self.owner.swap(0, Ordering::AcqRel);
        (ManagerId::from_raw(prev), self.clear_slots())
    }

    fn clear_slots(&self) -> [Handle; 5] {
        std::array::from_fn(|i| Handle::from_raw(self.slots[i].swap(0, Ordering::AcqRel)))
    }
}

impl Drop for MeshHandles {
    fn drop(&mut self) {
        let Some(stack) = self.stack.get_mut().take() else { return };
        let (owner, handles) = self.take_all();
        let Some(owner) = owner else { return };
        let released = handles
            .into_iter()
            .filter(|h| !h.is_none())
            .filter(|h| stack.release_buffer_in(owner, *h))
            .count();
        if released > 0 {
            log::debug!("dropped mesh returned {released} buffers to manager {}", owner.raw());
        }
    }
}

/// Triangle, stroke and dot geometry drawn as one unit.
///
/// Mutate the public lists freely, then call [`Mesh::mark_modified`] so the
/// next frame re-uploads them.
#[derive(Debug)]
pub struct Mesh {
    pub tris: Vec<Tri>,
    pub lins: Vec<Lin>,
    pub dots: Vec<Dot>,
    pub uniform: MeshUniform,
    /// Texture sampled by the triangles. [`Handle::BLANK`] leaves vertex colour untouched.
    pub texture: Handle,

    handles: MeshHandles,
    modified: AtomicBool,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            tris: Vec::new(),
            lins: Vec::new(),
            dots: Vec::new(),
            uniform: MeshUniform::default(),
            texture: Handle::BLANK,
            handles: MeshHandles::default(),
            modified: AtomicBool::new(true),
        }
    }
}

// Clones never share pool handles.
impl Clone for Mesh {
    fn clone(&self) -> Self {
        Self {
            tris: self.tris.clone(),
            lins: self.lins.clone(),
            dots: self.dots.clone(),
            uniform: self.uniform,
            texture: self.texture,
            ..Self::default()
        }
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an open or closed polyline with its segments linked to each other.
    pub fn push_polyline(&mut self, points: &[Vec3], col: ColorRgba, closed: bool) {
        if points.len() < 2 {
            return;
        }
        let base = self.lins.len() as u32;
        let count = (if closed { points.len() } else { points.len() - 1 }) as u32;

        for i in 0..count {
            let a = points[i as usize];
            let b = points[(i as usize + 1) % points.len()];
            let mut lin = Lin::new(LinVertex { pos: a, col }, LinVertex { pos: b, col });
            lin.prev = match i {
                0 if closed => Some(base + count - 1),
                0 => None,
                _ => Some(base + i - 1),
            };
            lin.next = match i + 1 {
                n if n == count && closed => Some(base),
                n if n == count => None,
                _ => Some(base + i + 1),
            };
            self.lins.push(lin);
        }
        self.mark_modified();
    }

    #[inline]
    pub fn mark_modified(&self) {
        self.modified.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn clear_modified(&self) {
        self.modified.store(false, Ordering::Release);
    }

    #[inline]
    pub fn handles(&self) -> &MeshHandles {
        &self.handles
    }

    /// Returns this mesh's buffers to the manager that issued them.
    /// The next renderer to meet the mesh registers fresh ones.
    pub fn release_resources(&self, stack: &ActiveStack) -> usize {
        let (owner, handles) = self.handles.take_all();
        self.mark_modified();
        let Some(owner) = owner else { return 0 };
        handles
            .into_iter()
            .filter(|h| !h.is_none())
            .filter(|h| stack.release_buffer_in(owner, *h))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::backend_tests::CountingBackend;
    use crate::resources::{PoolLimits, ResourceManager};

    #[test]
    fn polyline_links_neighbours() {
        let mut mesh = Mesh::new();
        let pts = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        mesh.push_polyline(&pts, ColorRgba::white(), false);

        assert_eq!(mesh.lins.len(), 3);
        assert_eq!(mesh.lins[0].prev, None);
        assert_eq!(mesh.lins[0].next, Some(1));
        assert_eq!(mesh.lins[1].prev, Some(0));
        assert_eq!(mesh.lins[2].next, None);
        assert_eq!(mesh.lins[1].tangent(), Vec3::Y - Vec3::X);
    }

    #[test]
    fn closed_polyline_wraps_around() {
        let mut mesh = Mesh::new();
        mesh.push_polyline(&[Vec3::ZERO, Vec3::X, Vec3::Y], ColorRgba::white(), true);
        assert_eq!(mesh.lins.len(), 3);
        assert_eq!(mesh.lins[0].prev, Some(2));
        assert_eq!(mesh.lins[2].next, Some(0));
        assert_eq!(mesh.lins[2].b.pos, Vec3::ZERO);
    }

    #[test]
    fn claim_by_new_owner_returns_foreign_handles() {
        let stack = ActiveStack::new();
        let handles = MeshHandles::default();
        let first = ManagerId::next();
        let second = ManagerId::next();

        assert_eq!(handles.claim(first, &stack), Some((None, [Handle::NONE; 5])));
        handles.set(HandleSlot::Tris, Handle::from_raw(7));
        assert_eq!(handles.claim(first, &stack), None);

        let (prev, taken) = handles.claim(second, &stack).unwrap();
        assert_eq!(prev, Some(first));
        assert_eq!(taken[HandleSlot::Tris as usize], Handle::from_raw(7));
        assert_eq!(handles.get(HandleSlot::Tris), Handle::NONE);
        assert_eq!(handles.owner(), Some(second));
    }

    #[test]
    fn clone_starts_without_handles() {
        let mesh = Mesh::new();
        mesh.handles().claim(ManagerId::next(), &ActiveStack::new());
        mesh.handles().set(HandleSlot::Dots, Handle::from_raw(3));
        mesh.clear_modified();

        let copy = mesh.clone();
        assert_eq!(copy.handles().owner(), None);
        assert_eq!(copy.handles().get(HandleSlot::Dots), Handle::NONE);
        assert!(copy.is_modified());
    }

    #[test]
    fn release_resources_returns_handles_to_owner() {
        let stack = ActiveStack::new();
        let rm = ResourceManager::new(CountingBackend::default(), PoolLimits::default(), &stack);
        let before = rm.available_buffers();

        let mesh = Mesh::new();
        mesh.handles().claim(rm.id(), &stack);
        mesh.handles().set(HandleSlot::VertUniform, rm.register());
        mesh.handles().set(HandleSlot::Lins, rm.register());
        mesh.clear_modified();

        assert_eq!(mesh.release_resources(&stack), 2);
        assert_eq!(rm.available_buffers(), before);
        assert!(mesh.is_modified());
        assert_eq!(mesh.release_resources(&stack), 0);
    }

    #[test]
    fn dropped_mesh_returns_every_slot() {
        let stack = ActiveStack::new();
        let rm = ResourceManager::new(CountingBackend::default(), PoolLimits::default(), &stack);
        let before = rm.available_buffers();

        let mesh = Mesh::new();
        mesh.handles().claim(rm.id(), &stack);
        for slot in HandleSlot::ALL {
            mesh.handles().set(slot, rm.register());
        }
        assert_eq!(rm.available_buffers(), before - 5);

        drop(mesh);
        assert_eq!(rm.available_buffers(), before);
        assert_eq!(rm.live_buffers(), 0);
    }

    #[test]
    fn replacing_clones_does_not_drain_the_pool() {
        let stack = ActiveStack::new();
        let rm = ResourceManager::new(CountingBackend::default(), PoolLimits::default(), &stack);
        let before = rm.available_buffers();

        let mut mesh = Mesh::new();
        for _ in 0..10 {
            mesh.handles().claim(rm.id(), &stack);
            mesh.handles().set(HandleSlot::Tris, rm.register());
            mesh = mesh.clone();
        }
        drop(mesh);
        assert_eq!(rm.available_buffers(), before);
    }

    #[test]
    fn dropping_after_manager_is_gone_is_harmless() {
        let stack = ActiveStack::new();
        let mesh = Mesh::new();
        {
            let rm = ResourceManager::new(CountingBackend::default(), PoolLimits::default(), &stack);
            mesh.handles().claim(rm.id(), &stack);
            mesh.handles().set(HandleSlot::Dots, rm.register());
        }
        assert_eq!(stack.depth(), 0);
        drop(mesh);
    }
}
