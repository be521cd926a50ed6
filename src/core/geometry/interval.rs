use crate::core::pbrt::*;

/// A closed range of shutter time, `[lower, upper]`.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Interval {
    pub lower: Float,
    pub upper: Float,
}

impl Default for Interval {
    fn default() -> Self {
        Interval::new(0.0, 1.0)
    }
}

impl Interval {
    pub fn new(lower: Float, upper: Float) -> Self {
        Interval { lower, upper }
    }

    pub fn empty() -> Self {
        Interval {
            lower: INFINITY,
            upper: NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        return self.lower > self.upper;
    }

    pub fn size(&self) -> Float {
        return self.upper - self.lower;
    }

    pub fn center(&self) -> Float {
        return 0.5 * (self.lower + self.upper);
    }

    pub fn extend(&mut self, other: &Interval) {
        self.lower = Float::min(self.lower, other.lower);
        self.upper = Float::max(self.upper, other.upper);
    }

    /// Splits at `t` into `[lower, t]` and `[t, upper]`.
    pub fn split(&self, t: Float) -> (Interval, Interval) {
        assert!(self.lower < t && t < self.upper);
        return (Interval::new(self.lower, t), Interval::new(t, self.upper));
    }
}
