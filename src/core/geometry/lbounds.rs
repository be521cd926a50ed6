use super::bounds3::*;
use super::interval::*;
use crate::core::pbrt::*;

/// Linear bounds: `bounds0` at the start of a time range and `bounds1` at its
/// end. The box at any time in between is their linear interpolation.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct LBBox3f {
    pub bounds0: Bounds3f,
    pub bounds1: Bounds3f,
}

impl Default for LBBox3f {
    fn default() -> Self {
        LBBox3f::empty()
    }
}

impl LBBox3f {
    pub fn new(bounds0: &Bounds3f, bounds1: &Bounds3f) -> Self {
        LBBox3f {
            bounds0: *bounds0,
            bounds1: *bounds1,
        }
    }

    pub fn from_static(b: &Bounds3f) -> Self {
        LBBox3f::new(b, b)
    }

    pub fn empty() -> Self {
        LBBox3f::from_static(&Bounds3f::empty())
    }

    pub fn is_empty(&self) -> bool {
        return self.bounds0.is_empty() || self.bounds1.is_empty();
    }

    pub fn extend(&mut self, other: &LBBox3f) {
        self.bounds0.extend(&other.bounds0);
        self.bounds1.extend(&other.bounds1);
    }

    pub fn union(&self, other: &LBBox3f) -> LBBox3f {
        let mut r = *self;
        r.extend(other);
        return r;
    }

    /// Conservative static box over the whole range.
    pub fn bounds(&self) -> Bounds3f {
        return self.bounds0.union(&self.bounds1);
    }

    pub fn interpolate(&self, t: Float) -> Bounds3f {
        return self.bounds0.lerp(&self.bounds1, t);
    }

    pub fn expected_approx_half_area(&self) -> Float {
        return 0.5 * (self.bounds0.half_area() + self.bounds1.half_area());
    }

    /// Tightest linear bounds over `time_range` that contain a primitive
    /// whose box is keyframed at `keys.len()` evenly spaced times over
    /// `[0, 1]` and moves linearly between keys.
    pub fn from_keyframes(keys: &[Bounds3f], time_range: &Interval) -> LBBox3f {
        assert!(!keys.is_empty());
        if keys.len() == 1 {
            return LBBox3f::from_static(&keys[0]);
        }
        let segments = (keys.len() - 1) as Float;
        let mut lower = keyframe_bounds_at(keys, time_range.lower);
        let mut upper = keyframe_bounds_at(keys, time_range.upper);

        let dt = time_range.size();
        if dt > 0.0 {
            let first = (time_range.lower * segments).floor() as usize + 1;
            let last = (time_range.upper * segments).ceil() as usize;
            let mut dmin = Point3f::splat(0.0);
            let mut dmax = Point3f::splat(0.0);
            for k in first..last.min(keys.len()) {
                let tk = k as Float / segments;
                if tk <= time_range.lower || tk >= time_range.upper {
                    continue;
                }
                let b = lower.lerp(&upper, (tk - time_range.lower) / dt);
                dmin = dmin.min(&(keys[k].min - b.min));
                dmax = dmax.max(&(keys[k].max - b.max));
            }
            lower.min = lower.min + dmin;
            upper.min = upper.min + dmin;
            lower.max = lower.max + dmax;
            upper.max = upper.max + dmax;
        }
        return LBBox3f::new(&lower, &upper);
    }
}

fn keyframe_bounds_at(keys: &[Bounds3f], t: Float) -> Bounds3f {
    let segments = keys.len() - 1;
    let f = clamp(t, 0.0, 1.0) * segments as Float;
    let i = (f.floor() as usize).min(segments - 1);
    return keys[i].lerp(&keys[i + 1], f - i as Float);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_at(x: Float) -> Bounds3f {
        Bounds3f::from(((x, 0.0, 0.0), (x + 1.0, 1.0, 1.0)))
    }

    #[test]
    fn keyframes_are_contained() {
        // Moves right then comes back: the middle key is outside the chord.
        let keys = [unit_at(0.0), unit_at(4.0), unit_at(0.0)];
        let lb = LBBox3f::from_keyframes(&keys, &Interval::new(0.0, 1.0));
        let mid = lb.interpolate(0.5);
        assert!(mid.contains(&keys[1]));
        assert!(lb.bounds0.contains(&keys[0]));
        assert!(lb.bounds1.contains(&keys[2]));
    }

    #[test]
    fn sub_interval_of_linear_motion_is_exact() {
        let keys = [unit_at(0.0), unit_at(2.0)];
        let lb = LBBox3f::from_keyframes(&keys, &Interval::new(0.5, 1.0));
        assert_eq!(lb.bounds0, unit_at(1.0));
        assert_eq!(lb.bounds1, unit_at(2.0));
    }

    #[test]
    fn half_area_of_static_box() {
        let lb = LBBox3f::from_static(&unit_at(0.0));
        assert_eq!(lb.expected_approx_half_area(), 3.0);
        assert_eq!(LBBox3f::empty().expected_approx_half_area(), 0.0);
    }
}
