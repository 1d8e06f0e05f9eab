//! Per-handler tracked allocations.
//!
//! Every registry entry owns a [`ScopedAllocator`]. Handlers allocate their
//! instance buffers through it instead of holding raw `Vec`s, so when the
//! entry is torn down every buffer the handler forgot to release is swept in
//! one pass.

use std::fmt;

use crate::config::{DEFAULT_ALLOCATOR_CAPACITY, DEFAULT_ALLOCATOR_STEP};
use crate::error::AllocError;

/// Handle to a live allocation in a [`ScopedAllocator`].
///
/// Handles are generational: once released, a handle never resolves again,
/// even if its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    slot: usize,
    generation: u64,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    block: Option<Box<[u8]>>,
}

/// Tracked allocation arena.
pub struct ScopedAllocator {
    slots: Vec<Slot>,
    usage: usize,
    step: usize,
}

impl ScopedAllocator {
    /// Create an allocator with default sizing.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ALLOCATOR_CAPACITY, DEFAULT_ALLOCATOR_STEP)
    }

    /// Create an allocator with `capacity` tracking slots growing by `step`.
    pub fn with_capacity(capacity: usize, step: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::default);
        Self {
            slots,
            usage: 0,
            step: step.max(1),
        }
    }

    /// Fallible variant of [`with_capacity`](Self::with_capacity).
    pub fn try_with_capacity(capacity: usize, step: usize) -> Result<Self, AllocError> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|source| AllocError::Exhausted {
                size: capacity,
                source,
            })?;
        slots.resize_with(capacity, Slot::default);
        Ok(Self {
            slots,
            usage: 0,
            step: step.max(1),
        })
    }

    /// Allocate `size` zeroed bytes.
    pub fn alloc(&mut self, size: usize) -> Result<Allocation, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }

        if self.usage >= self.slots.len() {
            self.grow()?;
        }

        let index = match self.slots.iter().position(|slot| slot.block.is_none()) {
            Some(index) => index,
            None => {
                let index = self.slots.len();
                self.grow()?;
                index
            }
        };

        let block = zeroed(size)?;
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.block = Some(block);
        self.usage += 1;

        Ok(Allocation {
            slot: index,
            generation: slot.generation,
        })
    }

    /// Allocate `count * size` zeroed bytes.
    pub fn calloc(&mut self, count: usize, size: usize) -> Result<Allocation, AllocError> {
        let total = count
            .checked_mul(size)
            .ok_or(AllocError::Overflow { count, size })?;
        self.alloc(total)
    }

    /// Release an allocation.
    ///
    /// Releasing an untracked or already released handle is a no-op; returns
    /// whether anything was freed.
    pub fn release(&mut self, allocation: Allocation) -> bool {
        match self.slots.get_mut(allocation.slot) {
            Some(slot) if slot.generation == allocation.generation && slot.block.is_some() => {
                slot.block = None;
                self.usage -= 1;
                true
            }
            _ => false,
        }
    }

    /// Bytes of a live allocation.
    pub fn get(&self, allocation: Allocation) -> Option<&[u8]> {
        self.slots
            .get(allocation.slot)
            .filter(|slot| slot.generation == allocation.generation)
            .and_then(|slot| slot.block.as_deref())
    }

    /// Mutable bytes of a live allocation.
    pub fn get_mut(&mut self, allocation: Allocation) -> Option<&mut [u8]> {
        self.slots
            .get_mut(allocation.slot)
            .filter(|slot| slot.generation == allocation.generation)
            .and_then(|slot| slot.block.as_deref_mut())
    }

    pub fn is_live(&self, allocation: Allocation) -> bool {
        self.get(allocation).is_some()
    }

    /// Release every tracked allocation; returns how many were live.
    ///
    /// Slot generations survive the sweep so outstanding handles stay dead.
    pub fn sweep_all(&mut self) -> usize {
        let mut released = 0;
        for slot in &mut self.slots {
            if slot.block.take().is_some() {
                released += 1;
            }
        }
        self.usage = 0;
        released
    }

    /// Number of live allocations.
    pub fn usage(&self) -> usize {
        self.usage
    }

    /// Number of tracking slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Total bytes held by live allocations.
    pub fn live_bytes(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.block.as_ref())
            .map(|block| block.len())
            .sum()
    }

    fn grow(&mut self) -> Result<(), AllocError> {
        self.slots
            .try_reserve_exact(self.step)
            .map_err(|source| AllocError::Exhausted {
                size: self.step,
                source,
            })?;
        let len = self.slots.len() + self.step;
        self.slots.resize_with(len, Slot::default);
        Ok(())
    }
}

impl Default for ScopedAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScopedAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedAllocator")
            .field("usage", &self.usage)
            .field("capacity", &self.slots.len())
            .field("step", &self.step)
            .finish()
    }
}

fn zeroed(size: usize) -> Result<Box<[u8]>, AllocError> {
    let mut block = Vec::new();
    block
        .try_reserve_exact(size)
        .map_err(|source| AllocError::Exhausted { size, source })?;
    block.resize(size, 0);
    Ok(block.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_tracks_and_zeroes() {
        let mut alloc = ScopedAllocator::with_capacity(2, 2);
        let a = alloc.alloc(16).unwrap();

        assert_eq!(alloc.usage(), 1);
        assert_eq!(alloc.get(a).unwrap(), &[0u8; 16]);

        alloc.get_mut(a).unwrap()[0] = 9;
        assert_eq!(alloc.get(a).unwrap()[0], 9);
        assert_eq!(alloc.live_bytes(), 16);
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut alloc = ScopedAllocator::new();
        assert!(matches!(alloc.alloc(0), Err(AllocError::ZeroSize)));
        assert!(matches!(alloc.calloc(0, 8), Err(AllocError::ZeroSize)));
        assert_eq!(alloc.usage(), 0);
    }

    #[test]
    fn calloc_rejects_overflow() {
        let mut alloc = ScopedAllocator::new();
        assert!(matches!(
            alloc.calloc(usize::MAX, 2),
            Err(AllocError::Overflow { .. })
        ));

        let a = alloc.calloc(4, 8).unwrap();
        assert_eq!(alloc.get(a).unwrap().len(), 32);
    }

    #[test]
    fn grows_by_step_when_full() {
        let mut alloc = ScopedAllocator::with_capacity(1, 3);
        let handles: Vec<_> = (0..5).map(|i| alloc.alloc(i + 1).unwrap()).collect();

        assert_eq!(alloc.usage(), 5);
        assert_eq!(alloc.capacity(), 7);
        for (i, handle) in handles.iter().enumerate() {
            assert_eq!(alloc.get(*handle).unwrap().len(), i + 1);
        }
    }

    #[test]
    fn zero_capacity_grows_on_first_alloc() {
        let mut alloc = ScopedAllocator::with_capacity(0, 8);
        alloc.alloc(1).unwrap();
        assert_eq!(alloc.capacity(), 8);
    }

    #[test]
    fn release_is_idempotent_and_ignores_strangers() {
        let mut alloc = ScopedAllocator::new();
        let mut other = ScopedAllocator::with_capacity(64, 8);
        let a = alloc.alloc(8).unwrap();

        for _ in 0..40 {
            other.alloc(1).unwrap();
        }
        let stranger = other.alloc(1).unwrap();

        assert!(!alloc.release(stranger));
        assert!(alloc.release(a));
        assert!(!alloc.release(a));
        assert_eq!(alloc.usage(), 0);
    }

    #[test]
    fn released_handle_does_not_alias_reused_slot() {
        let mut alloc = ScopedAllocator::with_capacity(1, 1);
        let first = alloc.alloc(4).unwrap();
        alloc.release(first);
        let second = alloc.alloc(4).unwrap();

        assert!(alloc.get(first).is_none());
        assert!(alloc.is_live(second));
        assert!(!alloc.release(first));
        assert!(alloc.is_live(second));
    }

    #[test]
    fn sweep_releases_everything() {
        let mut alloc = ScopedAllocator::with_capacity(2, 2);
        let handles: Vec<_> = (0..6).map(|_| alloc.alloc(32).unwrap()).collect();
        alloc.release(handles[0]);

        assert_eq!(alloc.sweep_all(), 5);
        assert_eq!(alloc.usage(), 0);
        assert_eq!(alloc.live_bytes(), 0);
        assert!(handles.iter().all(|h| !alloc.is_live(*h)));

        let fresh = alloc.alloc(1).unwrap();
        assert!(handles.iter().all(|h| *h != fresh));
    }
}
