use super::callbacks::*;
use super::child_list::*;
use super::record::*;
use crate::core::error::*;
use crate::core::geometry::*;
use crate::core::misc::*;
use crate::core::primitive::*;

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::OnceLock;

pub type MBVHNodeRef = Arc<MBVHBuildNode>;
pub type MBVHChild = NodeRecordMB<MBVHNodeRef>;

#[derive(Debug)]
pub struct MBVHLeaf {
    pub prims: Vec<PrimRefMB>,
    pub time_range: Interval,
    pub depth: usize,
}

/// Plain in-memory motion blur BVH. Interior children are written once,
/// possibly from another thread, and read after the build has joined.
#[derive(Debug)]
pub enum MBVHBuildNode {
    Interior {
        has_time_splits: bool,
        children: [OnceLock<MBVHChild>; MAX_BRANCHING_FACTOR],
    },
    Leaf(MBVHLeaf),
}

impl MBVHBuildNode {
    pub fn init_interior(has_time_splits: bool) -> Self {
        MBVHBuildNode::Interior {
            has_time_splits,
            children: Default::default(),
        }
    }

    pub fn init_leaf(prims: &[PrimRefMB], time_range: &Interval, depth: usize) -> Self {
        MBVHBuildNode::Leaf(MBVHLeaf {
            prims: prims.to_vec(),
            time_range: *time_range,
            depth,
        })
    }

    pub fn is_leaf(&self) -> bool {
        return matches!(self, MBVHBuildNode::Leaf(_));
    }

    pub fn has_time_splits(&self) -> bool {
        return match self {
            MBVHBuildNode::Interior {
                has_time_splits, ..
            } => *has_time_splits,
            MBVHBuildNode::Leaf(_) => false,
        };
    }

    /// Children in slot order.
    pub fn children(&self) -> Vec<&MBVHChild> {
        return match self {
            MBVHBuildNode::Interior { children, .. } => {
                children.iter().filter_map(|c| c.get()).collect()
            }
            MBVHBuildNode::Leaf(_) => Vec::new(),
        };
    }

    pub fn set_child(&self, i: usize, child: &MBVHChild) {
        match self {
            MBVHBuildNode::Interior { children, .. } => {
                if children[i].set(child.clone()).is_err() {
                    panic!("child {} of a node was written twice", i);
                }
            }
            MBVHBuildNode::Leaf(_) => panic!("leaf nodes have no children"),
        }
    }

    /// Leaves in depth first, slot order.
    pub fn leaves(&self) -> Vec<&MBVHLeaf> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        return leaves;
    }

    fn collect_leaves<'t>(&'t self, leaves: &mut Vec<&'t MBVHLeaf>) {
        match self {
            MBVHBuildNode::Leaf(leaf) => leaves.push(leaf),
            MBVHBuildNode::Interior { .. } => {
                for child in self.children() {
                    child.node.collect_leaves(leaves);
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        return 1 + self
            .children()
            .iter()
            .map(|c| c.node.node_count())
            .sum::<usize>();
    }

    pub fn time_split_count(&self) -> usize {
        let own = if self.has_time_splits() { 1 } else { 0 };
        return own
            + self
                .children()
                .iter()
                .map(|c| c.node.time_split_count())
                .sum::<usize>();
    }

    pub fn height(&self) -> usize {
        return 1 + self
            .children()
            .iter()
            .map(|c| c.node.height())
            .max()
            .unwrap_or(0);
    }

    /// References stored in all leaves. Time splits store a primitive once
    /// per time range it was split into.
    pub fn primitive_count(&self) -> usize {
        return self.leaves().iter().map(|l| l.prims.len()).sum();
    }

    /// `(geom_id, prim_id)` of every primitive reachable from this node.
    pub fn distinct_primitives(&self) -> BTreeSet<(u32, u32)> {
        let mut ids = BTreeSet::new();
        for leaf in self.leaves() {
            for prim in leaf.prims.iter() {
                ids.insert((prim.geom_id, prim.prim_id));
            }
        }
        return ids;
    }

    /// Primitive ids of each leaf in depth first order. Two trees with the
    /// same partitioning have the same signature.
    pub fn leaf_signature(&self) -> Vec<Vec<u64>> {
        return self
            .leaves()
            .iter()
            .map(|l| l.prims.iter().map(|p| p.id()).collect())
            .collect();
    }

    pub fn summary(&self) -> MBVHTreeSummary {
        let leaves = self.leaves();
        return MBVHTreeSummary {
            nodes: self.node_count(),
            leaves: leaves.len(),
            primitive_references: self.primitive_count(),
            distinct_primitives: self.distinct_primitives().len(),
            time_split_nodes: self.time_split_count(),
            height: self.height(),
            max_leaf_size: leaves.iter().map(|l| l.prims.len()).max().unwrap_or(0),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MBVHTreeSummary {
    pub nodes: usize,
    pub leaves: usize,
    pub primitive_references: usize,
    pub distinct_primitives: usize,
    pub time_split_nodes: usize,
    pub height: usize,
    pub max_leaf_size: usize,
}

/// Per task allocation context of `MBVHTreeCallbacks`.
#[derive(Debug, Default)]
pub struct NodeAllocator {
    pub index: usize,
    pub nodes: usize,
}

/// Builds `MBVHBuildNode` trees, optionally driving a progress bar.
#[derive(Default)]
pub struct MBVHTreeCallbacks {
    allocs: AtomicUsize,
    progress: Option<ProgressReporter>,
    cancelled: AtomicBool,
}

impl MBVHTreeCallbacks {
    pub fn new() -> Self {
        MBVHTreeCallbacks::default()
    }

    pub fn with_progress(progress: ProgressReporter) -> Self {
        MBVHTreeCallbacks {
            progress: Some(progress),
            ..Default::default()
        }
    }

    /// Number of allocation contexts handed out so far.
    pub fn alloc_count(&self) -> usize {
        return self.allocs.load(Ordering::Acquire);
    }

    /// Makes the next progress report abort the build.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn progress(&self) -> Option<&ProgressReporter> {
        return self.progress.as_ref();
    }
}

impl MBlurBuildCallbacks for MBVHTreeCallbacks {
    type Node = MBVHNodeRef;
    type Alloc = NodeAllocator;

    fn create_alloc(&self) -> NodeAllocator {
        let index = self.allocs.fetch_add(1, Ordering::AcqRel);
        return NodeAllocator { index, nodes: 0 };
    }

    fn create_node(&self, has_time_splits: bool, alloc: &mut NodeAllocator) -> MBVHNodeRef {
        alloc.nodes += 1;
        return Arc::new(MBVHBuildNode::init_interior(has_time_splits));
    }

    fn update_node(&self, node: &MBVHNodeRef, i: usize, child: &MBVHChild) {
        node.set_child(i, child);
    }

    fn create_leaf(
        &self,
        record: &BuildRecordMB,
        prims: &[PrimRefMB],
        alloc: &mut NodeAllocator,
    ) -> MBVHNodeRef {
        alloc.nodes += 1;
        return Arc::new(MBVHBuildNode::init_leaf(
            prims,
            &record.prims.time_range,
            record.depth,
        ));
    }

    fn progress_monitor(&self, num_prims: usize) -> Result<(), BuildError> {
        if self.cancelled.load(Ordering::Acquire) {
            return Err(BuildError::cancelled("progress monitor requested abort"));
        }
        if let Some(progress) = self.progress.as_ref() {
            progress.update(num_prims);
        }
        return Ok(());
    }
}
