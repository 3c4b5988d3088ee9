use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;

use super::Handle;

/// Process-unique identity of a resource manager.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ManagerId(u64);

impl ManagerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id. Never zero.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) fn from_raw(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }
}

/// Operations that callers outside the renderer may route to a manager
/// without knowing its backend type.
pub trait ResourceRoute: Send + Sync {
    fn poll_texture(&self, path: &Path) -> Handle;
    fn release_buffer(&self, handle: Handle) -> bool;
    fn release_texture(&self, handle: Handle) -> bool;
}

struct Entry {
    id: ManagerId,
    route: Weak<dyn ResourceRoute>,
}

/// Ordered stack of live resource managers. The top entry is the one whose
/// renderer may draw and the one free-standing calls are routed to.
///
/// Managers push themselves when created and remove themselves on drop, so a
/// nested export renderer takes over until it is torn down.
#[derive(Clone, Default)]
pub struct ActiveStack {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl std::fmt::Debug for ActiveStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveStack")
            .field("top", &self.top())
            .field("depth", &self.depth())
            .finish()
    }
}

impl ActiveStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide stack used by [`Renderer::new`](crate::render::Renderer::new).
    pub fn global() -> &'static ActiveStack {
        static GLOBAL: OnceLock<ActiveStack> = OnceLock::new();
        GLOBAL.get_or_init(ActiveStack::new)
    }

    pub(crate) fn push(&self, id: ManagerId, route: Weak<dyn ResourceRoute>) {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.id != id);
        entries.push(Entry { id, route });
        log::debug!("resource manager {} pushed (depth {})", id.raw(), entries.len());
    }

    /// Removes `id` wherever it sits. The entry below becomes active again
    /// only if `id` was on top.
    pub(crate) fn remove(&self, id: ManagerId) {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.id != id);
        log::debug!("resource manager {} popped (depth {})", id.raw(), entries.len());
    }

    pub fn top(&self) -> Option<ManagerId> {
        self.entries.lock().last().map(|e| e.id)
    }

    pub fn is_top(&self, id: ManagerId) -> bool {
        self.top() == Some(id)
    }

    pub fn depth(&self) -> usize {
        self.entries.lock().len()
    }

    /// Loads (or looks up) a texture through the active manager.
    /// Returns [`Handle::NONE`] when no manager is active.
    pub fn poll_texture(&self, path: &Path) -> Handle {
        match self.top_route() {
            Some(route) => route.poll_texture(path),
            None => Handle::NONE,
        }
    }

    pub fn release_buffer(&self, handle: Handle) -> bool {
        self.top_route().is_some_and(|r| r.release_buffer(handle))
    }

    pub fn release_texture(&self, handle: Handle) -> bool {
        self.top_route().is_some_and(|r| r.release_texture(handle))
    }

    /// Releases a buffer in the manager that issued it, active or not.
    pub fn release_buffer_in(&self, owner: ManagerId, handle: Handle) -> bool {
        self.route(owner).is_some_and(|r| r.release_buffer(handle))
    }

    // The stack lock is dropped before calling into a manager.
    fn top_route(&self) -> Option<Arc<dyn ResourceRoute>> {
        let entries = self.entries.lock();
        entries.last().and_then(|e| e.route.upgrade())
    }

    fn route(&self, id: ManagerId) -> Option<Arc<dyn ResourceRoute>> {
        let entries = self.entries.lock();
        entries
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.route.upgrade())
    }
}

/// Loads a texture through the globally active manager.
pub fn poll_texture(path: impl AsRef<Path>) -> Handle {
    ActiveStack::global().poll_texture(path.as_ref())
}

/// Releases a buffer handle in the globally active manager.
pub fn release_buffer(handle: Handle) -> bool {
    ActiveStack::global().release_buffer(handle)
}

/// Releases a texture handle in the globally active manager.
pub fn release_texture(handle: Handle) -> bool {
    ActiveStack::global().release_texture(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::backend::tests::CountingBackend;
    use crate::resources::{PoolLimits, ResourceManager};

    #[test]
    fn newest_manager_is_active_until_dropped() {
        let stack = ActiveStack::new();
        let outer = ResourceManager::new(CountingBackend::default(), PoolLimits::default(), &stack);
        assert!(outer.is_active());

        let inner = ResourceManager::new(CountingBackend::default(), PoolLimits::default(), &stack);
        assert!(inner.is_active());
        assert!(!outer.is_active());
        assert_eq!(stack.depth(), 2);

        drop(inner);
        assert!(outer.is_active());
        assert_eq!(stack.depth(), 1);

        drop(outer);
        assert_eq!(stack.top(), None);
    }

    #[test]
    fn releases_route_to_the_active_manager() {
        let stack = ActiveStack::new();
        let outer = ResourceManager::new(CountingBackend::default(), PoolLimits::default(), &stack);
        let h = outer.register();

        let inner = ResourceManager::new(CountingBackend::default(), PoolLimits::default(), &stack);
        // inner never issued `h`
        assert!(!stack.release_buffer(h));
        assert!(stack.release_buffer_in(outer.id(), h));
        assert!(!outer.deregister(h));

        drop(inner);
    }

    #[test]
    fn empty_stack_routes_nowhere() {
        let stack = ActiveStack::new();
        assert_eq!(stack.poll_texture(Path::new("x.png")), Handle::NONE);
        assert!(!stack.release_buffer(Handle::from_raw(2)));
        assert!(!stack.release_texture(Handle::from_raw(2)));
    }

    #[test]
    fn manager_ids_are_unique_and_nonzero() {
        let a = ManagerId::next();
        let b = ManagerId::next();
        assert_ne!(a, b);
        assert!(ManagerId::from_raw(a.raw()).is_some());
        assert!(ManagerId::from_raw(0).is_none());
    }
}
