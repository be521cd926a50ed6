use crate::core::primitive::*;
use crate::core::stats::*;

use std::fmt;
use std::ops::Range;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;

thread_local!(static ALLOCATED_BUFFERS: StatCounter = StatCounter::new("BVH/Allocated primref buffers"));
thread_local!(static BUFFER_MEMORY: StatMemoryCounter = StatMemoryCounter::new("BVH/Primref buffer memory"));

/// Receives the size of every primitive reference buffer the builder
/// allocates (positive) or releases (negative).
pub trait MemoryMonitor: Sync {
    fn memory_monitor(&self, bytes: i64, post: bool);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullMemoryMonitor;

impl MemoryMonitor for NullMemoryMonitor {
    fn memory_monitor(&self, _bytes: i64, _post: bool) {}
}

/// Tracks live and peak bytes; a finished build must leave `current` at
/// zero.
#[derive(Debug, Default)]
pub struct AtomicMemoryMonitor {
    current: AtomicI64,
    peak: AtomicI64,
    allocations: AtomicI64,
}

impl AtomicMemoryMonitor {
    pub fn new() -> Self {
        AtomicMemoryMonitor::default()
    }
    pub fn current(&self) -> i64 {
        return self.current.load(Ordering::Acquire);
    }
    pub fn peak(&self) -> i64 {
        return self.peak.load(Ordering::Acquire);
    }
    pub fn allocations(&self) -> i64 {
        return self.allocations.load(Ordering::Acquire);
    }
}

impl MemoryMonitor for AtomicMemoryMonitor {
    fn memory_monitor(&self, bytes: i64, _post: bool) {
        let now = self.current.fetch_add(bytes, Ordering::AcqRel) + bytes;
        if bytes > 0 {
            self.allocations.fetch_add(1, Ordering::AcqRel);
            self.peak.fetch_max(now, Ordering::AcqRel);
        }
    }
}

/// Names one buffer of the pool. The generation changes whenever the slot
/// is recycled, so an id that outlived its buffer is caught on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId {
    index: u32,
    generation: u32,
}

pub type PrimRefVector = Arc<RwLock<Vec<PrimRefMB>>>;

struct PoolSlot {
    generation: u32,
    ref_count: usize,
    prims: Option<PrimRefVector>,
}

#[derive(Default)]
struct PoolState {
    slots: Vec<PoolSlot>,
    free_slots: Vec<u32>,
    live: usize,
}

/// Reference counted storage for the primitive reference buffers of one
/// build.
///
/// Buffers enter the pool through `insert`, which hands back the first
/// `BufferHandle`. Cloning a handle adds a reference, dropping one removes
/// it, and the buffer is released the moment the last handle goes away.
/// Sets only carry the `BufferId`; they read and reorder their range through
/// the pool.
pub struct PrimRefPool<'a> {
    state: Mutex<PoolState>,
    monitor: &'a dyn MemoryMonitor,
}

impl<'a> PrimRefPool<'a> {
    pub fn new(monitor: &'a dyn MemoryMonitor) -> Self {
        PrimRefPool {
            state: Mutex::new(PoolState::default()),
            monitor,
        }
    }

    fn bytes_of(len: usize) -> i64 {
        return (len * std::mem::size_of::<PrimRefMB>()) as i64;
    }

    pub fn insert(&'a self, prims: Vec<PrimRefMB>) -> BufferHandle<'a> {
        let bytes = Self::bytes_of(prims.len());
        self.monitor.memory_monitor(bytes, false);
        ALLOCATED_BUFFERS.with(|c| c.inc());
        BUFFER_MEMORY.with(|c| c.add(bytes as usize));

        let prims = Some(Arc::new(RwLock::new(prims)));
        let mut state = self.state.lock().unwrap();
        state.live += 1;
        let id = if let Some(index) = state.free_slots.pop() {
            let slot = &mut state.slots[index as usize];
            slot.ref_count = 1;
            slot.prims = prims;
            BufferId {
                index,
                generation: slot.generation,
            }
        } else {
            state.slots.push(PoolSlot {
                generation: 0,
                ref_count: 1,
                prims,
            });
            BufferId {
                index: (state.slots.len() - 1) as u32,
                generation: 0,
            }
        };
        return BufferHandle { pool: self, id };
    }

    /// A new handle on a buffer some other handle keeps alive.
    pub fn acquire(&'a self, id: BufferId) -> BufferHandle<'a> {
        self.inc_ref(id);
        return BufferHandle { pool: self, id };
    }

    fn inc_ref(&self, id: BufferId) {
        let mut state = self.state.lock().unwrap();
        let slot = Self::live_slot(&mut state, id);
        slot.ref_count += 1;
    }

    fn dec_ref(&self, id: BufferId) {
        let released = {
            let mut state = self.state.lock().unwrap();
            let slot = Self::live_slot(&mut state, id);
            slot.ref_count -= 1;
            if slot.ref_count == 0 {
                slot.generation = slot.generation.wrapping_add(1);
                let prims = slot.prims.take();
                state.free_slots.push(id.index);
                state.live -= 1;
                prims
            } else {
                None
            }
        };
        if let Some(prims) = released {
            let len = prims.read().unwrap().len();
            self.monitor.memory_monitor(-Self::bytes_of(len), true);
        }
    }

    fn live_slot(state: &mut PoolState, id: BufferId) -> &mut PoolSlot {
        let slot = &mut state.slots[id.index as usize];
        if slot.generation != id.generation || slot.prims.is_none() {
            panic!("stale primref buffer {:?}", id);
        }
        return slot;
    }

    pub fn get(&self, id: BufferId) -> PrimRefVector {
        let mut state = self.state.lock().unwrap();
        let slot = Self::live_slot(&mut state, id);
        return match slot.prims.as_ref() {
            Some(prims) => prims.clone(),
            None => panic!("stale primref buffer {:?}", id),
        };
    }

    /// Runs `f` over `range` of buffer `id` under a shared lock.
    pub fn with_prims<R>(
        &self,
        id: BufferId,
        range: &Range<usize>,
        f: impl FnOnce(&[PrimRefMB]) -> R,
    ) -> R {
        let buffer = self.get(id);
        let prims = buffer.read().unwrap();
        return f(&prims[range.clone()]);
    }

    /// Runs `f` over a private copy of `range` and stores the result back.
    /// Siblings work on disjoint ranges of one buffer concurrently, so the
    /// exclusive lock is only held for the copy back.
    pub fn update_range<R>(
        &self,
        id: BufferId,
        range: &Range<usize>,
        f: impl FnOnce(&mut [PrimRefMB]) -> R,
    ) -> R {
        let buffer = self.get(id);
        let mut local = buffer.read().unwrap()[range.clone()].to_vec();
        let r = f(&mut local);
        buffer.write().unwrap()[range.clone()].copy_from_slice(&local);
        return r;
    }

    pub fn ref_count(&self, id: BufferId) -> usize {
        let state = self.state.lock().unwrap();
        let slot = &state.slots[id.index as usize];
        if slot.generation != id.generation || slot.prims.is_none() {
            return 0;
        }
        return slot.ref_count;
    }

    pub fn is_live(&self, id: BufferId) -> bool {
        return self.ref_count(id) > 0;
    }

    /// Number of buffers not yet released.
    pub fn live_buffers(&self) -> usize {
        return self.state.lock().unwrap().live;
    }
}

impl fmt::Debug for PrimRefPool<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("PrimRefPool")
            .field("slots", &state.slots.len())
            .field("live", &state.live)
            .finish()
    }
}

/// Owning reference to one pool buffer.
pub struct BufferHandle<'a> {
    pool: &'a PrimRefPool<'a>,
    id: BufferId,
}

impl<'a> BufferHandle<'a> {
    pub fn id(&self) -> BufferId {
        return self.id;
    }
}

impl Clone for BufferHandle<'_> {
    fn clone(&self) -> Self {
        self.pool.inc_ref(self.id);
        BufferHandle {
            pool: self.pool,
            id: self.id,
        }
    }
}

impl Drop for BufferHandle<'_> {
    fn drop(&mut self) {
        self.pool.dec_ref(self.id);
    }
}

impl fmt::Debug for BufferHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BufferHandle").field(&self.id).finish()
    }
}
