use super::set::*;
use super::split::*;
use crate::core::geometry::*;

use std::cmp::Ordering;

/// A node under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecordMB {
    /// Depth of the root of this subtree.
    pub depth: usize,
    pub prims: SetMB,
    /// Best split found for `prims`.
    pub split: Split,
}

impl BuildRecordMB {
    pub fn new(prims: SetMB, depth: usize) -> Self {
        BuildRecordMB {
            depth,
            prims,
            split: Split::invalid(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        return self.prims.size();
    }

    /// Sibling order by primitive count, smallest first. Use
    /// `cmp_by_size(b, a)` for largest first.
    pub fn cmp_by_size(a: &BuildRecordMB, b: &BuildRecordMB) -> Ordering {
        return a.size().cmp(&b.size());
    }
}

/// What a finished subtree hands back to its parent: the node, its linear
/// bounds, and the time range those bounds are valid for.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecordMB<N> {
    pub node: N,
    pub lbounds: LBBox3f,
    pub dt: Interval,
}

impl<N> NodeRecordMB<N> {
    pub fn new(node: N, lbounds: LBBox3f, dt: Interval) -> Self {
        NodeRecordMB { node, lbounds, dt }
    }
}
