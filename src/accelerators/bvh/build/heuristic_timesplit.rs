use super::set::*;
use super::split::*;
use crate::core::geometry::*;
use crate::core::pbrt::*;
use crate::core::primitive::*;

use rayon::prelude::*;

/// Below this many references the temporal heuristic stays on the calling
/// thread.
const PARALLEL_GRAIN: usize = 1024;

/// Result of cutting a set's time range in two.
#[derive(Debug)]
pub struct TemporalPartition {
    /// References re-bounded over `dt0`, in a freshly allocated buffer.
    pub lprims: Vec<PrimRefMB>,
    pub linfo: PrimInfoMB,
    pub rinfo: PrimInfoMB,
    pub dt0: Interval,
    pub dt1: Interval,
}

/// Binned temporal split. Candidate times are snapped to the time-segment
/// grid, and each candidate is scored by re-bounding every primitive over
/// both halves.
pub struct HeuristicMBlurTemporalSplit<'a, R: RecalculatePrimRef + ?Sized> {
    recalc: &'a R,
}

impl<'a, R: RecalculatePrimRef + ?Sized> HeuristicMBlurTemporalSplit<'a, R> {
    pub fn new(recalc: &'a R) -> Self {
        HeuristicMBlurTemporalSplit { recalc }
    }

    fn bound_halves(
        &self,
        prims: &[PrimRefMB],
        dt0: &Interval,
        dt1: &Interval,
    ) -> (PrimInfoMB, PrimInfoMB) {
        let empty = || (PrimInfoMB::empty(), PrimInfoMB::empty());
        let fold = |(mut s0, mut s1): (PrimInfoMB, PrimInfoMB), prim: &PrimRefMB| {
            s0.add_primref(&self.recalc.recalculate(prim, dt0));
            s1.add_primref(&self.recalc.recalculate(prim, dt1));
            (s0, s1)
        };
        if prims.len() < PARALLEL_GRAIN {
            return prims.iter().fold(empty(), fold);
        }
        return prims
            .par_iter()
            .with_min_len(PARALLEL_GRAIN)
            .fold(empty, fold)
            .reduce(empty, |(mut a0, mut a1), (b0, b1)| {
                a0.merge(&b0);
                a1.merge(&b1);
                (a0, a1)
            });
    }

    pub fn find(&self, set: &SetMB, prims: &[PrimRefMB], log_block_size: usize) -> Split {
        let time_range = set.time_range;
        let mut best = Split::invalid();
        for b in 0..NUM_TEMPORAL_BINS - 1 {
            let t = (b + 1) as Float / NUM_TEMPORAL_BINS as Float;
            let ct = lerp(t, time_range.lower, time_range.upper);
            let center_time = set.align_time(ct);
            if center_time <= time_range.lower || center_time >= time_range.upper {
                continue;
            }
            let (dt0, dt1) = time_range.split(center_time);
            let (s0, s1) = self.bound_halves(prims, &dt0, &dt1);
            let sah = s0.leaf_sah(log_block_size) + s1.leaf_sah(log_block_size);
            if sah < best.sah {
                best = Split::temporal(sah, center_time);
            }
        }
        return best;
    }

    /// Left side: a new buffer with every reference re-bounded over
    /// `[lower, time]`. Right side: `prims` itself, overwritten with the
    /// references re-bounded over `[time, upper]`.
    pub fn split(
        &self,
        time: Float,
        time_range: &Interval,
        prims: &mut [PrimRefMB],
    ) -> TemporalPartition {
        let (dt0, dt1) = time_range.split(time);
        let lprims: Vec<PrimRefMB> = prims
            .par_iter()
            .with_min_len(PARALLEL_GRAIN)
            .map(|p| self.recalc.recalculate(p, &dt0))
            .collect();
        prims
            .par_iter_mut()
            .with_min_len(PARALLEL_GRAIN)
            .for_each(|p| *p = self.recalc.recalculate(p, &dt1));
        let linfo = PrimInfoMB::from_prims(&lprims);
        let rinfo = PrimInfoMB::from_prims(prims);
        return TemporalPartition {
            lprims,
            linfo,
            rinfo,
            dt0,
            dt1,
        };
    }
}
