use crate::core::geometry::*;
use crate::core::pbrt::*;

pub const NUM_OBJECT_BINS: usize = 32;
pub const NUM_TEMPORAL_BINS: usize = 2;

/// Maps doubled centroids onto `num` bins per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinMapping {
    pub num: usize,
    pub ofs: Point3f,
    pub scale: Vector3f,
}

impl BinMapping {
    pub fn new(cent_bounds: &Bounds3f, num: usize) -> Self {
        let diag = cent_bounds.diagonal();
        let mut scale = Vector3f::splat(0.0);
        for dim in 0..3 {
            if diag[dim] > 1e-34 {
                scale[dim] = (0.99 * num as Float) / diag[dim];
            }
        }
        BinMapping {
            num,
            ofs: cent_bounds.min,
            scale,
        }
    }

    #[inline]
    pub fn bin(&self, center2: &Point3f, dim: usize) -> usize {
        let b = ((center2[dim] - self.ofs[dim]) * self.scale[dim]).floor();
        return clamp(b, 0.0, (self.num - 1) as Float) as usize;
    }

    /// All centroids fall in one bin along `dim`.
    pub fn invalid(&self, dim: usize) -> bool {
        return self.scale[dim] == 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitKind {
    /// Primitives whose centroid bin along `dim` is below `pos` go left.
    Object {
        dim: usize,
        pos: usize,
        mapping: BinMapping,
    },
    /// Every primitive goes to both sides, re-bounded over `[lower, time]`
    /// and `[time, upper]`.
    Temporal { time: Float },
    /// Median split of the deterministically ordered range.
    Fallback,
}

/// How to divide one set, with the SAH cost that division is expected to
/// have.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub sah: Float,
    pub kind: SplitKind,
}

impl Default for Split {
    fn default() -> Self {
        Split::invalid()
    }
}

impl Split {
    /// No split was found; partitioning it degenerates to the fallback.
    pub fn invalid() -> Self {
        Split {
            sah: INFINITY,
            kind: SplitKind::Fallback,
        }
    }

    pub fn object(sah: Float, dim: usize, pos: usize, mapping: BinMapping) -> Self {
        Split {
            sah,
            kind: SplitKind::Object { dim, pos, mapping },
        }
    }

    pub fn temporal(sah: Float, time: Float) -> Self {
        Split {
            sah,
            kind: SplitKind::Temporal { time },
        }
    }

    pub fn fallback() -> Self {
        Split {
            sah: 1.0,
            kind: SplitKind::Fallback,
        }
    }

    pub fn split_sah(&self) -> Float {
        return self.sah;
    }

    pub fn is_valid(&self) -> bool {
        return self.sah < INFINITY;
    }

    pub fn is_temporal(&self) -> bool {
        return matches!(self.kind, SplitKind::Temporal { .. });
    }

    pub fn is_fallback(&self) -> bool {
        return matches!(self.kind, SplitKind::Fallback);
    }
}
