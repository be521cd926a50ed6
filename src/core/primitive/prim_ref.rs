use crate::core::geometry::*;
use crate::core::pbrt::*;

use std::ops::Range;

/// One scene primitive as the builder sees it: its linear bounds over the
/// time range of the set it lives in, and how many of the primitive's time
/// segments that range touches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimRefMB {
    pub lbounds: LBBox3f,
    pub active_time_segments: u32,
    pub total_time_segments: u32,
    pub geom_id: u32,
    pub prim_id: u32,
}

impl PrimRefMB {
    pub fn new(
        lbounds: &LBBox3f,
        active_time_segments: u32,
        total_time_segments: u32,
        geom_id: u32,
        prim_id: u32,
    ) -> Self {
        PrimRefMB {
            lbounds: *lbounds,
            active_time_segments,
            total_time_segments,
            geom_id,
            prim_id,
        }
    }

    pub fn bounds(&self) -> Bounds3f {
        return self.lbounds.bounds();
    }

    pub fn center2(&self) -> Point3f {
        return self.bounds().center2();
    }

    /// Number of time segments this reference accounts for in the SAH.
    #[inline]
    pub fn size(&self) -> usize {
        return self.active_time_segments as usize;
    }

    /// Sort key of the deterministic order.
    #[inline]
    pub fn id(&self) -> u64 {
        return ((self.geom_id as u64) << 32) | self.prim_id as u64;
    }
}

/// Range of discrete time segments `[begin, end)` that `time_range` overlaps
/// when `[0, 1]` is cut into `num_time_segments` equal pieces.
pub fn time_segment_range(time_range: &Interval, num_time_segments: Float) -> Range<i32> {
    let round_up = 1.0 + 2.0 * ULP;
    let round_down = 1.0 - 2.0 * ULP;
    let lower = (round_up * time_range.lower * num_time_segments).floor() as i32;
    let upper = (round_down * time_range.upper * num_time_segments).ceil() as i32;
    return lower..upper;
}

#[inline]
pub fn num_blocks(count: usize, log_block_size: usize) -> usize {
    return (count + (1 << log_block_size) - 1) >> log_block_size;
}

/// Aggregate information over a run of `PrimRefMB`s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimInfoMB {
    pub geom_bounds: LBBox3f,
    pub cent_bounds: Bounds3f,
    pub count: usize,
    pub num_time_segments: usize,
    pub max_num_time_segments: usize,
}

impl Default for PrimInfoMB {
    fn default() -> Self {
        PrimInfoMB::empty()
    }
}

impl PrimInfoMB {
    pub fn empty() -> Self {
        PrimInfoMB {
            geom_bounds: LBBox3f::empty(),
            cent_bounds: Bounds3f::empty(),
            count: 0,
            num_time_segments: 0,
            max_num_time_segments: 0,
        }
    }

    pub fn from_prims(prims: &[PrimRefMB]) -> Self {
        let mut info = PrimInfoMB::empty();
        for prim in prims {
            info.add_primref(prim);
        }
        return info;
    }

    pub fn add_primref(&mut self, prim: &PrimRefMB) {
        self.geom_bounds.extend(&prim.lbounds);
        self.cent_bounds = self.cent_bounds.union_p(&prim.center2());
        self.count += 1;
        self.num_time_segments += prim.size();
        self.max_num_time_segments = self
            .max_num_time_segments
            .max(prim.total_time_segments as usize);
    }

    pub fn merge(&mut self, other: &PrimInfoMB) {
        self.geom_bounds.extend(&other.geom_bounds);
        self.cent_bounds.extend(&other.cent_bounds);
        self.count += other.count;
        self.num_time_segments += other.num_time_segments;
        self.max_num_time_segments = self.max_num_time_segments.max(other.max_num_time_segments);
    }

    pub fn size(&self) -> usize {
        return self.count;
    }

    pub fn half_area(&self) -> Float {
        return self.geom_bounds.expected_approx_half_area();
    }

    pub fn leaf_sah(&self, log_block_size: usize) -> Float {
        return self.half_area() * num_blocks(self.num_time_segments, log_block_size) as Float;
    }
}
