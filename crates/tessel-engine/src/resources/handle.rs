use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

/// Opaque key for a pooled GPU buffer or texture slot.
///
/// `0` means "none / allocation failed" for buffers and names the blank 1x1
/// image for textures. Texture `1` is the "missing image" placeholder.
/// Buffer handles are issued from [`Handle::FIRST_LIVE`] upward.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Handle(u32);

impl Handle {
    pub const NONE: Handle = Handle(0);
    pub const BLANK: Handle = Handle(0);
    pub const MISSING: Handle = Handle(1);

    /// First raw value ever handed out for a buffer.
    pub const FIRST_LIVE: u32 = 2;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// True for the two permanently bound texture slots.
    #[inline]
    pub const fn is_reserved_texture(self) -> bool {
        self.0 < Self::FIRST_LIVE
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered free-id set.
///
/// `acquire` always returns the lowest free id, so ids are reused densely.
#[derive(Debug, Clone)]
pub(crate) struct HandlePool {
    free: BTreeSet<u32>,
}

impl HandlePool {
    pub(crate) fn with_range(range: Range<u32>) -> Self {
        Self {
            free: range.collect(),
        }
    }

    pub(crate) fn acquire(&mut self) -> Option<Handle> {
        self.free.pop_first().map(Handle)
    }

    /// Removes a specific id from the free set. Returns false if it was not free.
    pub(crate) fn take(&mut self, handle: Handle) -> bool {
        self.free.remove(&handle.0)
    }

    /// Returns an id to the free set. Returns false if it was already free.
    pub(crate) fn release(&mut self, handle: Handle) -> bool {
        self.free.insert(handle.0)
    }

    pub(crate) fn is_free(&self, handle: Handle) -> bool {
        self.free.contains(&handle.0)
    }

    pub(crate) fn available(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn acquire_returns_lowest_free_id() {
        let mut pool = HandlePool::with_range(2..6);
        assert_eq!(pool.acquire(), Some(Handle(2)));
        assert_eq!(pool.acquire(), Some(Handle(3)));
        assert!(pool.release(Handle(2)));
        assert_eq!(pool.acquire(), Some(Handle(2)));
    }

    #[test]
    fn exhausted_pool_yields_none() {
        let mut pool = HandlePool::with_range(2..4);
        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_some());
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn double_release_is_reported() {
        let mut pool = HandlePool::with_range(2..4);
        let h = pool.acquire().unwrap();
        assert!(pool.release(h));
        assert!(!pool.release(h));
    }

    #[test]
    fn live_handles_stay_unique_under_churn() {
        let mut pool = HandlePool::with_range(2..40);
        let mut live: Vec<Handle> = Vec::new();
        let mut seed = 0x2545_f491_u32;

        for _ in 0..2000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;

            if seed % 3 == 0 && !live.is_empty() {
                let victim = live.swap_remove(seed as usize % live.len());
                assert!(pool.release(victim));
            } else if let Some(h) = pool.acquire() {
                assert!(h.raw() >= Handle::FIRST_LIVE);
                live.push(h);
            }

            let distinct: HashSet<_> = live.iter().copied().collect();
            assert_eq!(distinct.len(), live.len());
            assert!(live.iter().all(|h| !pool.is_free(*h)));
        }
    }

    #[test]
    fn reserved_texture_handles() {
        assert!(Handle::BLANK.is_reserved_texture());
        assert!(Handle::MISSING.is_reserved_texture());
        assert!(!Handle::from_raw(Handle::FIRST_LIVE).is_reserved_texture());
        assert!(Handle::NONE.is_none());
    }
}
