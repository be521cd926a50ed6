use super::prim_pool::*;
use crate::core::geometry::*;
use crate::core::pbrt::*;
use crate::core::primitive::*;

use std::ops::Range;

/// A subset of primitive references: `object_range` of one pool buffer,
/// restricted to `time_range`, plus the aggregate info of that range.
#[derive(Debug, Clone, PartialEq)]
pub struct SetMB {
    pub info: PrimInfoMB,
    pub buffer: BufferId,
    pub object_range: Range<usize>,
    pub time_range: Interval,
}

impl SetMB {
    pub fn new(
        info: &PrimInfoMB,
        buffer: BufferId,
        object_range: Range<usize>,
        time_range: &Interval,
    ) -> Self {
        assert_eq!(info.count, object_range.len());
        assert!(info.count == 0 || time_range.lower < time_range.upper);
        SetMB {
            info: *info,
            buffer,
            object_range,
            time_range: *time_range,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        return self.object_range.len();
    }

    pub fn half_area(&self) -> Float {
        return self.info.half_area();
    }

    pub fn leaf_sah(&self, log_block_size: usize) -> Float {
        return self.info.leaf_sah(log_block_size);
    }

    pub fn max_num_time_segments(&self) -> usize {
        return self.info.max_num_time_segments;
    }

    /// Snaps `t` to the time-segment grid of the most finely segmented
    /// primitive in the set.
    pub fn align_time(&self, t: Float) -> Float {
        let n = self.info.max_num_time_segments as Float;
        return (t * n).round() / n;
    }

    /// True linear bounds of the set over its own time range, evaluated from
    /// the primitives rather than from cached references.
    pub fn linear_bounds<R: RecalculatePrimRef + ?Sized>(
        &self,
        pool: &PrimRefPool<'_>,
        recalc: &R,
    ) -> LBBox3f {
        return pool.with_prims(self.buffer, &self.object_range, |prims| {
            let mut lbounds = LBBox3f::empty();
            for prim in prims {
                lbounds.extend(&recalc.linear_bounds(prim, &self.time_range));
            }
            lbounds
        });
    }
}
