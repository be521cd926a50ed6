use super::callbacks::*;
use super::child_list::*;
use super::heuristic_binning::*;
use super::heuristic_timesplit::*;
use super::prim_pool::*;
use super::record::*;
use super::set::*;
use super::settings::*;
use super::split::*;
use crate::core::error::*;
use crate::core::geometry::*;
use crate::core::pbrt::*;
use crate::core::primitive::*;
use crate::core::stats::*;

use log::*;
use rayon::prelude::*;
use std::sync::atomic::fence;
use std::sync::atomic::Ordering;

thread_local!(static INTERIOR_NODES: StatCounter = StatCounter::new("BVH/Interior nodes"));
thread_local!(static LEAF_NODES: StatCounter = StatCounter::new("BVH/Leaf nodes"));
thread_local!(static TEMPORAL_SPLITS: StatCounter = StatCounter::new("BVH/Temporal splits"));
thread_local!(static FALLBACK_SPLITS: StatCounter = StatCounter::new("BVH/Fallback splits"));

/// Top-down SAH builder for primitives with multi-segment motion.
///
/// Every node either becomes a leaf, splits its primitives in space, or
/// splits its time range in two. Space splits reorder a range of the buffer
/// they read in place. Time splits keep the right half in the parent's buffer
/// and move the left half into a new one, so buffers are shared between
/// siblings and live in a `PrimRefPool`.
pub struct BVHBuilderMSMBlur<'a, R: RecalculatePrimRef + ?Sized, C: MBlurBuildCallbacks> {
    cfg: Settings,
    pool: &'a PrimRefPool<'a>,
    recalc: &'a R,
    callbacks: &'a C,
    heuristic_object_split: HeuristicArrayBinningMB,
    heuristic_temporal_split: HeuristicMBlurTemporalSplit<'a, R>,
}

impl<'a, R: RecalculatePrimRef + ?Sized, C: MBlurBuildCallbacks> BVHBuilderMSMBlur<'a, R, C> {
    pub fn new(
        pool: &'a PrimRefPool<'a>,
        recalc: &'a R,
        callbacks: &'a C,
        settings: &Settings,
    ) -> Result<Self, BuildError> {
        if settings.branching_factor > MAX_BRANCHING_FACTOR {
            return Err(BuildError::BranchingFactor {
                requested: settings.branching_factor,
                max: MAX_BRANCHING_FACTOR,
            });
        }
        let mut cfg = *settings;
        if cfg.branching_factor < 2 {
            warn!(
                "branching factor {} cannot split a node. Using 2.",
                cfg.branching_factor
            );
            cfg.branching_factor = 2;
        }
        if cfg.min_leaf_size == 0 {
            cfg.min_leaf_size = 1;
        }
        return Ok(BVHBuilderMSMBlur {
            cfg,
            pool,
            recalc,
            callbacks,
            heuristic_object_split: HeuristicArrayBinningMB::new(),
            heuristic_temporal_split: HeuristicMBlurTemporalSplit::new(recalc),
        });
    }

    pub fn settings(&self) -> &Settings {
        return &self.cfg;
    }

    fn prims_of(&self, set: &SetMB) -> Vec<PrimRefMB> {
        // copied out so no buffer lock is held while rayon may steal work
        return self
            .pool
            .with_prims(set.buffer, &set.object_range, |prims| prims.to_vec());
    }

    /// Best cost driven split of `set`. A time split is only tried while the
    /// set spans more than one time segment, and only wins when strictly
    /// cheaper than the best object split.
    pub fn find(&self, set: &SetMB) -> Split {
        let prims = self.prims_of(set);
        let log_block_size = self.cfg.log_block_size;
        let object_split = self
            .heuristic_object_split
            .find(set, &prims, log_block_size);

        if set.time_range.size() > 1.01 / set.max_num_time_segments() as Float {
            let temporal_split = self
                .heuristic_temporal_split
                .find(set, &prims, log_block_size);
            if temporal_split.split_sah() < object_split.split_sah() {
                return temporal_split;
            }
        }
        return object_split;
    }

    /// Split used by the large leaf builder. With `single_leaf_time_segment`
    /// it cuts time at the middle segment boundary of the first primitive
    /// that still spans several segments; otherwise it is the median split.
    pub fn find_fallback(&self, record: &BuildRecordMB) -> Split {
        if self.cfg.single_leaf_time_segment {
            let set = &record.prims;
            let center = self
                .pool
                .with_prims(set.buffer, &set.object_range, |prims| {
                    prims.iter().find_map(|prim| {
                        let total = prim.total_time_segments;
                        let itime_range = time_segment_range(&set.time_range, total as Float);
                        assert!(!itime_range.is_empty());
                        if itime_range.len() > 1 {
                            let icenter = (itime_range.start + itime_range.end) / 2;
                            Some(icenter as Float / total as Float)
                        } else {
                            None
                        }
                    })
                });
            if let Some(split_time) = center {
                return Split::temporal(1.0, split_time);
            }
        }
        return Split::fallback();
    }

    /// Sorts the set's range by primitive id; partitioning scrambles it.
    pub fn deterministic_order(&self, set: &SetMB) {
        self.pool
            .update_range(set.buffer, &set.object_range, |prims| {
                prims.sort_by_key(|p| p.id());
            });
    }

    /// Splits the set's range at its middle index.
    pub fn split_fallback(&self, set: &SetMB) -> (SetMB, SetMB) {
        let begin = set.object_range.start;
        let end = set.object_range.end;
        let center = (begin + end) / 2;
        let (linfo, rinfo) = self
            .pool
            .with_prims(set.buffer, &set.object_range, |prims| {
                let mid = center - begin;
                (
                    PrimInfoMB::from_prims(&prims[..mid]),
                    PrimInfoMB::from_prims(&prims[mid..]),
                )
            });
        let lset = SetMB::new(&linfo, set.buffer, begin..center, &set.time_range);
        let rset = SetMB::new(&rinfo, set.buffer, center..end, &set.time_range);
        return (lset, rset);
    }

    /// Carries out `brecord.split`. A time split also returns the handle of
    /// the buffer its left half was written to.
    pub fn partition(&self, brecord: &BuildRecordMB) -> (SetMB, SetMB, Option<BufferHandle<'a>>) {
        let set = &brecord.prims;
        match brecord.split.kind {
            SplitKind::Temporal { time } => {
                TEMPORAL_SPLITS.with(|c| c.inc());
                trace!(
                    "temporal split of {} prims at t={} in [{}, {}]",
                    set.size(),
                    time,
                    set.time_range.lower,
                    set.time_range.upper
                );
                let part = self
                    .pool
                    .update_range(set.buffer, &set.object_range, |prims| {
                        self.heuristic_temporal_split
                            .split(time, &set.time_range, prims)
                    });
                let lcount = part.lprims.len();
                let new_vector = self.pool.insert(part.lprims);
                let lset = SetMB::new(&part.linfo, new_vector.id(), 0..lcount, &part.dt0);
                let rset = SetMB::new(
                    &part.rinfo,
                    set.buffer,
                    set.object_range.clone(),
                    &part.dt1,
                );
                return (lset, rset, Some(new_vector));
            }
            SplitKind::Object { dim, pos, mapping } => {
                let halves = self
                    .pool
                    .update_range(set.buffer, &set.object_range, |prims| {
                        self.heuristic_object_split.split(dim, pos, &mapping, prims)
                    });
                if let Some((linfo, rinfo)) = halves {
                    let center = set.object_range.start + linfo.count;
                    let lset = SetMB::new(
                        &linfo,
                        set.buffer,
                        set.object_range.start..center,
                        &set.time_range,
                    );
                    let rset = SetMB::new(
                        &rinfo,
                        set.buffer,
                        center..set.object_range.end,
                        &set.time_range,
                    );
                    return (lset, rset, None);
                }
            }
            SplitKind::Fallback => {}
        }

        FALLBACK_SPLITS.with(|c| c.inc());
        trace!("fallback split of {} prims", set.size());
        self.deterministic_order(set);
        let (lset, rset) = self.split_fallback(set);
        return (lset, rset, None);
    }

    fn create_leaf(
        &self,
        record: &BuildRecordMB,
        alloc: &mut C::Alloc,
    ) -> NodeRecordMB<C::Node> {
        LEAF_NODES.with(|c| c.inc());
        let prims = self.prims_of(&record.prims);
        let node = self.callbacks.create_leaf(record, &prims, alloc);
        let lbounds = record.prims.linear_bounds(self.pool, self.recalc);
        return NodeRecordMB::new(node, lbounds, record.prims.time_range);
    }

    fn node_bounds(
        &self,
        current: &BuildRecordMB,
        has_time_splits: bool,
        values: &[(LBBox3f, Interval)],
    ) -> (LBBox3f, Interval) {
        if has_time_splits {
            // children only bound parts of the time range
            let lbounds = current.prims.linear_bounds(self.pool, self.recalc);
            return (lbounds, current.prims.time_range);
        }
        let mut lbounds = LBBox3f::empty();
        for (b, _) in values {
            lbounds.extend(b);
        }
        return (lbounds, values[0].1);
    }

    /// Builds a subtree without looking at costs. Splits the largest child
    /// that is not yet leaf sized until the node is full, so every leaf ends
    /// up with at most `max_leaf_size` primitives.
    pub fn create_large_leaf(
        &self,
        current: &BuildRecordMB,
        alloc: &mut C::Alloc,
    ) -> Result<NodeRecordMB<C::Node>, BuildError> {
        if current.depth > self.cfg.max_depth {
            return Err(BuildError::DepthLimit {
                depth: current.depth,
                max_depth: self.cfg.max_depth,
            });
        }

        let mut current = current.clone();
        current.split = self.find_fallback(&current);

        if current.size() <= self.cfg.max_leaf_size && !current.split.is_temporal() {
            return Ok(self.create_leaf(&current, alloc));
        }

        let max_leaf_size = self.cfg.max_leaf_size;
        let mut children = LocalChildList::new(self.pool, &current);
        loop {
            let mut best_child = None;
            let mut best_size = 0;
            for (i, child) in children.records().iter().enumerate() {
                if child.size() <= max_leaf_size && !child.split.is_temporal() {
                    continue;
                }
                if child.size() > best_size {
                    best_size = child.size();
                    best_child = Some(i);
                }
            }
            let best = match best_child {
                Some(best) => best,
                None => break,
            };

            let brecord = children[best].clone();
            let (lset, rset, new_vector) = self.partition(&brecord);
            let mut lrecord = BuildRecordMB::new(lset, current.depth + 1);
            let mut rrecord = BuildRecordMB::new(rset, current.depth + 1);
            lrecord.split = self.find_fallback(&lrecord);
            rrecord.split = self.find_fallback(&rrecord);
            children.split(best, lrecord, rrecord, new_vector);

            if children.len() >= self.cfg.branching_factor {
                break;
            }
        }

        let has_time_splits = children
            .records()
            .iter()
            .any(|c| c.prims.time_range != current.prims.time_range);

        INTERIOR_NODES.with(|c| c.inc());
        let node = self.callbacks.create_node(has_time_splits, alloc);

        let mut values = Vec::with_capacity(children.len());
        for (i, child) in children.records().iter().enumerate() {
            let r = self.create_large_leaf(child, alloc)?;
            values.push((r.lbounds, r.dt));
            self.callbacks.update_node(&node, i, &r);
        }

        let (lbounds, dt) = self.node_bounds(&current, has_time_splits, &values);
        return Ok(NodeRecordMB::new(node, lbounds, dt));
    }

    /// Builds the subtree of `current`, whose split must already be set.
    ///
    /// Without `alloc` a fresh allocation context is created. `toplevel`
    /// marks subtrees spawned as their own task; those report progress once
    /// they are small enough to be built on one thread.
    pub fn recurse(
        &self,
        current: &BuildRecordMB,
        alloc: Option<&mut C::Alloc>,
        toplevel: bool,
    ) -> Result<NodeRecordMB<C::Node>, BuildError> {
        let mut own_alloc;
        let alloc = match alloc {
            Some(alloc) => alloc,
            None => {
                own_alloc = self.callbacks.create_alloc();
                &mut own_alloc
            }
        };

        if toplevel && current.size() <= self.cfg.single_thread_threshold {
            self.callbacks.progress_monitor(current.size())?;
        }

        let leaf_sah = self.cfg.int_cost * current.prims.leaf_sah(self.cfg.log_block_size);
        let split_sah = self.cfg.trav_cost * current.prims.half_area()
            + self.cfg.int_cost * current.split.split_sah();

        if current.size() <= self.cfg.min_leaf_size
            || current.depth + MIN_LARGE_LEAF_LEVELS >= self.cfg.max_depth
            || (current.size() <= self.cfg.max_leaf_size && leaf_sah <= split_sah)
        {
            self.deterministic_order(&current.prims);
            return self.create_large_leaf(current, alloc);
        }

        let mut children = LocalChildList::new(self.pool, current);
        loop {
            let mut best_child = None;
            let mut best_area = NEG_INFINITY;
            for (i, child) in children.records().iter().enumerate() {
                if child.size() <= self.cfg.min_leaf_size {
                    continue;
                }
                let area = child.prims.info.geom_bounds.expected_approx_half_area();
                if area > best_area {
                    best_area = area;
                    best_child = Some(i);
                }
            }
            let best = match best_child {
                Some(best) => best,
                None => break,
            };

            let brecord = children[best].clone();
            let (lset, rset, new_vector) = self.partition(&brecord);
            let mut lrecord = BuildRecordMB::new(lset, current.depth + 1);
            let mut rrecord = BuildRecordMB::new(rset, current.depth + 1);
            lrecord.split = self.find(&lrecord.prims);
            rrecord.split = self.find(&rrecord.prims);
            children.split(best, lrecord, rrecord, new_vector);

            if children.len() >= self.cfg.branching_factor {
                break;
            }
        }

        if children.len() == 1 {
            drop(children);
            self.deterministic_order(&current.prims);
            return self.create_large_leaf(current, alloc);
        }

        let has_time_splits = children
            .records()
            .iter()
            .any(|c| c.prims.time_range != current.prims.time_range);

        INTERIOR_NODES.with(|c| c.inc());
        let node = self.callbacks.create_node(has_time_splits, alloc);

        let values = if current.size() > self.cfg.single_thread_threshold {
            children
                .records()
                .par_iter()
                .enumerate()
                .map(|(i, child)| -> Result<(LBBox3f, Interval), BuildError> {
                    let r = self.recurse(child, None, true)?;
                    self.callbacks.update_node(&node, i, &r);
                    fence(Ordering::Release);
                    return Ok((r.lbounds, r.dt));
                })
                .collect::<Result<Vec<_>, BuildError>>()?
        } else {
            let mut values = vec![(LBBox3f::empty(), Interval::empty()); children.len()];
            for i in (0..children.len()).rev() {
                let r = self.recurse(&children[i], Some(&mut *alloc), false)?;
                values[i] = (r.lbounds, r.dt);
                self.callbacks.update_node(&node, i, &r);
            }
            values
        };

        let (lbounds, dt) = self.node_bounds(current, has_time_splits, &values);
        return Ok(NodeRecordMB::new(node, lbounds, dt));
    }

    /// Builds the tree over `record`, which reads a buffer the caller keeps
    /// alive for the whole build.
    pub fn build(&self, record: &BuildRecordMB) -> Result<NodeRecordMB<C::Node>, BuildError> {
        let mut record = record.clone();
        record.split = self.find(&record.prims);
        let ret = self.recurse(&record, None, true);
        fence(Ordering::SeqCst);
        return ret;
    }
}

/// Builds a motion blur BVH over `prims`, whose aggregate is `pinfo`.
///
/// The root covers the time range `[0, 1]` at depth 1. All primitive
/// reference buffers, including the one `prims` is moved into, are released
/// before this returns, whether the build succeeded or not.
pub fn build_msmblur<R, C>(
    prims: Vec<PrimRefMB>,
    pinfo: &PrimInfoMB,
    monitor: &dyn MemoryMonitor,
    recalc: &R,
    callbacks: &C,
    settings: &Settings,
) -> Result<NodeRecordMB<C::Node>, BuildError>
where
    R: RecalculatePrimRef + ?Sized,
    C: MBlurBuildCallbacks,
{
    let pool = PrimRefPool::new(monitor);
    let builder = BVHBuilderMSMBlur::new(&pool, recalc, callbacks, settings)?;
    debug!(
        "msmblur build: {} prims, max {} time segments, {:?}",
        pinfo.size(),
        pinfo.max_num_time_segments,
        builder.settings()
    );

    let count = prims.len();
    let root = pool.insert(prims);
    let set = SetMB::new(pinfo, root.id(), 0..count, &Interval::new(0.0, 1.0));
    let record = BuildRecordMB::new(set, 1);
    let ret = builder.build(&record);
    drop(root);

    debug_assert_eq!(pool.live_buffers(), 0);
    match &ret {
        Ok(r) => debug!(
            "msmblur build done: bounds {:?}, time [{}, {}]",
            r.lbounds.bounds(),
            r.dt.lower,
            r.dt.upper
        ),
        Err(e) => debug!("msmblur build failed: {}", e),
    }
    return ret;
}
