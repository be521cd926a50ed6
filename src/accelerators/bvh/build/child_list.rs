use super::prim_pool::*;
use super::record::*;

use smallvec::SmallVec;
use std::ops::Index;
use std::ops::IndexMut;

/// Hard upper bound on the branching factor of any node.
pub const MAX_BRANCHING_FACTOR: usize = 8;

/// The children of one node while they are being grown, together with one
/// buffer handle per child.
///
/// The handle in slot `i` keeps alive the buffer `children[i]` reads from.
/// The local root's buffer was created by an ancestor, so the list only adds
/// a reference to it; buffers created by temporal splits below are owned
/// here and released when the last child referencing them is gone.
pub struct LocalChildList<'a> {
    children: SmallVec<[BuildRecordMB; MAX_BRANCHING_FACTOR]>,
    primvecs: SmallVec<[BufferHandle<'a>; MAX_BRANCHING_FACTOR]>,
    pub depth: usize,
}

impl<'a> LocalChildList<'a> {
    pub fn new(pool: &'a PrimRefPool<'a>, record: &BuildRecordMB) -> Self {
        let mut children = SmallVec::new();
        let mut primvecs = SmallVec::new();
        primvecs.push(pool.acquire(record.prims.buffer));
        children.push(record.clone());
        LocalChildList {
            children,
            primvecs,
            depth: record.depth,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        return self.children.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.children.is_empty();
    }

    pub fn records(&self) -> &[BuildRecordMB] {
        return &self.children;
    }

    pub fn records_mut(&mut self) -> &mut [BuildRecordMB] {
        return &mut self.children;
    }

    /// Replaces child `best` by `lrecord` and appends `rrecord`.
    ///
    /// A child that reads the same buffer as `best` shares its handle;
    /// a child that reads a different one must be reading `new_vector`.
    pub fn split(
        &mut self,
        best: usize,
        lrecord: BuildRecordMB,
        rrecord: BuildRecordMB,
        new_vector: Option<BufferHandle<'a>>,
    ) {
        assert!(self.children.len() < MAX_BRANCHING_FACTOR);
        let mut new_vector = new_vector;
        let shared = self.primvecs[best].id();

        let mut handle_for = |record: &BuildRecordMB, primvecs: &[BufferHandle<'a>]| {
            if record.prims.buffer == shared {
                return primvecs[best].clone();
            }
            return match new_vector.take() {
                Some(handle) if handle.id() == record.prims.buffer => handle,
                _ => panic!("child reads a buffer the list does not track"),
            };
        };
        let lhandle = handle_for(&lrecord, &self.primvecs);
        let rhandle = handle_for(&rrecord, &self.primvecs);

        // the old handle of `best` goes away here; both children already hold their own
        self.primvecs[best] = lhandle;
        self.primvecs.push(rhandle);

        self.children[best] = lrecord;
        self.children.push(rrecord);
    }
}

impl Index<usize> for LocalChildList<'_> {
    type Output = BuildRecordMB;
    fn index(&self, i: usize) -> &BuildRecordMB {
        return &self.children[i];
    }
}

impl IndexMut<usize> for LocalChildList<'_> {
    fn index_mut(&mut self, i: usize) -> &mut BuildRecordMB {
        return &mut self.children[i];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accelerators::bvh::build::set::*;
    use crate::core::geometry::*;
    use crate::core::pbrt::*;
    use crate::core::primitive::*;

    fn prims(n: usize) -> Vec<PrimRefMB> {
        let b = Bounds3f::from(((0.0, 0.0, 0.0), (1.0, 1.0, 1.0)));
        (0..n)
            .map(|i| PrimRefMB::new(&LBBox3f::from_static(&b), 1, 1, 0, i as u32))
            .collect()
    }

    fn record(buffer: BufferId, range: std::ops::Range<usize>, depth: usize) -> BuildRecordMB {
        let info = PrimInfoMB::from_prims(&prims(range.len()));
        BuildRecordMB::new(SetMB::new(&info, buffer, range, &Interval::default()), depth)
    }

    #[test]
    fn aliasing_children_share_the_parent_buffer() {
        let monitor = AtomicMemoryMonitor::new();
        let pool = PrimRefPool::new(&monitor);
        let root = pool.insert(prims(4));
        let id = root.id();
        {
            let mut list = LocalChildList::new(&pool, &record(id, 0..4, 1));
            assert_eq!(pool.ref_count(id), 2);
            list.split(0, record(id, 0..2, 2), record(id, 2..4, 2), None);
            assert_eq!(list.len(), 2);
            assert_eq!(pool.ref_count(id), 3);
            list.split(1, record(id, 2..3, 2), record(id, 3..4, 2), None);
            assert_eq!(pool.ref_count(id), 4);
        }
        assert_eq!(pool.ref_count(id), 1);
        drop(root);
        assert_eq!(pool.live_buffers(), 0);
        assert_eq!(monitor.current(), 0);
    }

    #[test]
    fn temporal_buffer_dies_with_the_list() {
        let monitor = AtomicMemoryMonitor::new();
        let pool = PrimRefPool::new(&monitor);
        let root = pool.insert(prims(4));
        let id = root.id();
        let fresh_id;
        {
            let mut list = LocalChildList::new(&pool, &record(id, 0..4, 1));
            let fresh = pool.insert(prims(4));
            fresh_id = fresh.id();
            list.split(0, record(fresh_id, 0..4, 2), record(id, 0..4, 2), Some(fresh));
            assert_eq!(pool.ref_count(fresh_id), 1);
            assert_eq!(pool.ref_count(id), 2);

            // split the child living in the fresh buffer again, spatially
            list.split(0, record(fresh_id, 0..2, 3), record(fresh_id, 2..4, 3), None);
            assert_eq!(pool.ref_count(fresh_id), 2);
            assert_eq!(pool.live_buffers(), 2);
        }
        assert!(!pool.is_live(fresh_id));
        assert_eq!(pool.ref_count(id), 1);
        drop(root);
        assert_eq!(monitor.current(), 0);
    }

    #[test]
    #[should_panic]
    fn full_list_rejects_split() {
        let monitor = NullMemoryMonitor;
        let pool = PrimRefPool::new(&monitor);
        let root = pool.insert(prims(16));
        let id = root.id();
        let mut list = LocalChildList::new(&pool, &record(id, 0..16, 1));
        for i in 0..MAX_BRANCHING_FACTOR {
            list.split(0, record(id, 0..1, 2), record(id, 1..2, 2), None);
            assert_eq!(list.len(), i + 2);
        }
    }
}
