use super::prim_ref::*;
use crate::core::geometry::*;

/// Source of truth for primitive motion. The builder only ever sees
/// `PrimRefMB`s; whenever a time range narrows it asks this capability for
/// fresh bounds.
pub trait RecalculatePrimRef: Sync {
    /// `prim` re-evaluated over `time_range`, with its active segment count
    /// updated to match.
    fn recalculate(&self, prim: &PrimRefMB, time_range: &Interval) -> PrimRefMB;

    fn linear_bounds(&self, prim: &PrimRefMB, time_range: &Interval) -> LBBox3f;
}
