use super::set::*;
use super::split::*;
use crate::core::geometry::*;
use crate::core::pbrt::*;
use crate::core::primitive::*;

#[derive(Debug, Default, Clone, Copy)]
struct BinInfo {
    lbounds: LBBox3f,
    count: usize,
    prims: usize,
}

impl BinInfo {
    fn add(&mut self, prim: &PrimRefMB) {
        self.lbounds.extend(&prim.lbounds);
        self.count += prim.size();
        self.prims += 1;
    }

    fn merge(&mut self, other: &BinInfo) {
        self.lbounds.extend(&other.lbounds);
        self.count += other.count;
        self.prims += other.prims;
    }

    fn sah(&self, log_block_size: usize) -> Float {
        return self.lbounds.expected_approx_half_area()
            * num_blocks(self.count, log_block_size) as Float;
    }
}

/// Binned SAH object split over the doubled centroids of the linear bounds.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicArrayBinningMB;

impl HeuristicArrayBinningMB {
    pub fn new() -> Self {
        HeuristicArrayBinningMB
    }

    /// Cheapest split position over all three axes, or `Split::invalid()`
    /// when no position leaves primitives on both sides.
    pub fn find(&self, set: &SetMB, prims: &[PrimRefMB], log_block_size: usize) -> Split {
        if prims.len() < 2 {
            return Split::invalid();
        }
        let mapping = BinMapping::new(&set.info.cent_bounds, NUM_OBJECT_BINS);
        let mut bins = [[BinInfo::default(); NUM_OBJECT_BINS]; 3];
        for prim in prims {
            let c = prim.center2();
            for dim in 0..3 {
                bins[dim][mapping.bin(&c, dim)].add(prim);
            }
        }

        let mut best = Split::invalid();
        for dim in 0..3 {
            if mapping.invalid(dim) {
                continue;
            }
            let mut right = [BinInfo::default(); NUM_OBJECT_BINS];
            let mut acc = BinInfo::default();
            for i in (1..NUM_OBJECT_BINS).rev() {
                acc.merge(&bins[dim][i]);
                right[i] = acc;
            }
            let mut left = BinInfo::default();
            for i in 1..NUM_OBJECT_BINS {
                left.merge(&bins[dim][i - 1]);
                if left.prims == 0 || right[i].prims == 0 {
                    continue;
                }
                let sah = left.sah(log_block_size) + right[i].sah(log_block_size);
                if sah < best.sah {
                    best = Split::object(sah, dim, i, mapping);
                }
            }
        }
        return best;
    }

    /// Moves the primitives that bin below `pos` on `dim` to the front of
    /// `prims` and returns the info of both halves. `None` if either half
    /// would be empty.
    pub fn split(
        &self,
        dim: usize,
        pos: usize,
        mapping: &BinMapping,
        prims: &mut [PrimRefMB],
    ) -> Option<(PrimInfoMB, PrimInfoMB)> {
        let is_left = |p: &PrimRefMB| mapping.bin(&p.center2(), dim) < pos;
        let mut l = 0;
        let mut r = prims.len();
        loop {
            while l < r && is_left(&prims[l]) {
                l += 1;
            }
            while l < r && !is_left(&prims[r - 1]) {
                r -= 1;
            }
            if l >= r {
                break;
            }
            prims.swap(l, r - 1);
            l += 1;
            r -= 1;
        }
        if l == 0 || l == prims.len() {
            return None;
        }
        let linfo = PrimInfoMB::from_prims(&prims[..l]);
        let rinfo = PrimInfoMB::from_prims(&prims[l..]);
        return Some((linfo, rinfo));
    }
}
