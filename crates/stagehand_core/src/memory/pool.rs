//! # Record Pool
//!
//! Free-list allocator for bookkeeping records that are handed out and
//! returned every frame.

/// A record that can be cleared and parked in a [`RecordPool`].
///
/// `recycle` must drop everything the record references (callbacks,
/// payloads, entity handles) so a parked record never extends the
/// lifetime of caller-owned data. Identity fields that are stable for
/// the record's pool lifetime are kept.
pub trait Recycle {
    /// Clears all payload fields.
    fn recycle(&mut self);
}

/// One storage slot: the record plus whether it is currently handed out.
struct Slot<R> {
    record: R,
    in_use: bool,
}

/// A growable free-list pool of reusable records.
///
/// Records are never destroyed individually. Releasing a record clears it
/// and pushes its slot onto the free list; acquiring pops the free list
/// before constructing anything new. The pool only grows, trading memory
/// for zero steady-state allocation.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. It lives on the frame thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: RecordPool<TimerRecord<()>> = RecordPool::with_capacity(64);
///
/// // Acquire - O(1), constructs only when the free list is empty
/// let handle = pool.acquire(|| TimerRecord::new(TimerId::new(1)));
///
/// // Release - O(1), the record is cleared and kept for reuse
/// pool.release(handle);
/// ```
pub struct RecordPool<R> {
    /// Every record ever created, in creation order.
    slots: Vec<Slot<R>>,
    /// Indices of parked records, most recently released last.
    free_list: Vec<usize>,
}

/// Handle to a record owned by a [`RecordPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: usize,
}

impl PoolHandle {
    /// Returns the slot index of this handle.
    ///
    /// Slots are assigned in creation order, so the index of a freshly
    /// constructed record equals the number of records created before it.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    /// Builds a handle from a slot index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self { index }
    }
}

impl<R: Recycle> RecordPool<R> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Creates an empty pool with room for `capacity` records before the
    /// backing storage has to grow.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
        }
    }

    /// Total number of records ever created by this pool.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the pool has never created a record.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of parked records ready for reuse.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Number of records currently handed out.
    #[inline]
    #[must_use]
    pub fn in_use_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Hands out a cleared record.
    ///
    /// Reuses the most recently released record if there is one, otherwise
    /// stores `fresh()` in a new slot. `fresh` is where the caller supplies
    /// the identity of a brand new record.
    pub fn acquire<F>(&mut self, fresh: F) -> PoolHandle
    where
        F: FnOnce() -> R,
    {
        if let Some(index) = self.free_list.pop() {
            self.slots[index].in_use = true;
            return PoolHandle { index };
        }

        let index = self.slots.len();
        self.slots.push(Slot {
            record: fresh(),
            in_use: true,
        });
        PoolHandle { index }
    }

    /// Clears a record and parks it for reuse.
    ///
    /// Returns `false` without touching anything if the handle is unknown
    /// or the record is already parked.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index) else {
            return false;
        };
        if !slot.in_use {
            return false;
        }

        slot.record.recycle();
        slot.in_use = false;
        self.free_list.push(handle.index);
        true
    }

    /// Returns true if the handle refers to a record that is handed out.
    #[inline]
    #[must_use]
    pub fn is_in_use(&self, handle: PoolHandle) -> bool {
        self.slots.get(handle.index).is_some_and(|slot| slot.in_use)
    }

    /// Gets a record, parked or not.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&R> {
        self.slots.get(handle.index).map(|slot| &slot.record)
    }

    /// Gets a mutable record, parked or not.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut R> {
        self.slots.get_mut(handle.index).map(|slot| &mut slot.record)
    }
}

impl<R: Recycle> Default for RecordPool<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::ops::Index<PoolHandle> for RecordPool<R> {
    type Output = R;

    #[inline]
    fn index(&self, handle: PoolHandle) -> &R {
        &self.slots[handle.index].record
    }
}

impl<R> std::ops::IndexMut<PoolHandle> for RecordPool<R> {
    #[inline]
    fn index_mut(&mut self, handle: PoolHandle) -> &mut R {
        &mut self.slots[handle.index].record
    }
}
