use super::vector3::*;
use crate::core::pbrt::*;

#[derive(Debug, PartialEq, Default, Copy, Clone)]
pub struct Bounds3<T> {
    pub min: Vector3<T>,
    pub max: Vector3<T>,
}

impl<T: Copy> Bounds3<T> {
    pub fn new(min: &Vector3<T>, max: &Vector3<T>) -> Self {
        Bounds3::<T> {
            min: *min,
            max: *max,
        }
    }
}

impl<
        T: Copy
            + PartialOrd
            + std::ops::Add<Output = T>
            + std::ops::Sub<Output = T>
            + std::ops::Mul<Output = T>,
    > Bounds3<T>
{
    pub fn diagonal(&self) -> Vector3<T> {
        return self.max - self.min;
    }

    pub fn union(&self, other: &Self) -> Self {
        return Bounds3 {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        };
    }

    pub fn union_p(&self, p: &Vector3<T>) -> Self {
        return Bounds3 {
            min: self.min.min(p),
            max: self.max.max(p),
        };
    }

    pub fn contains(&self, other: &Self) -> bool {
        return self.min.all_le(&other.min) && other.max.all_le(&self.max);
    }
}

impl Bounds3f {
    /// Inverted bounds, the identity of `union`.
    pub fn empty() -> Self {
        Bounds3f {
            min: Vector3f::splat(INFINITY),
            max: Vector3f::splat(NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        return self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z;
    }

    pub fn extend(&mut self, other: &Bounds3f) {
        *self = self.union(other);
    }

    /// Twice the centroid; binning works on this to avoid the multiply.
    pub fn center2(&self) -> Point3f {
        return self.min + self.max;
    }

    pub fn half_area(&self) -> Float {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        return d.x * (d.y + d.z) + d.y * d.z;
    }

    pub fn surface_area(&self) -> Float {
        return 2.0 * self.half_area();
    }

    pub fn lerp(&self, other: &Bounds3f, t: Float) -> Bounds3f {
        return Bounds3f {
            min: self.min * (1.0 - t) + other.min * t,
            max: self.max * (1.0 - t) + other.max * t,
        };
    }
}

impl<T: Copy> From<((T, T, T), (T, T, T))> for Bounds3<T> {
    fn from(value: ((T, T, T), (T, T, T))) -> Self {
        Bounds3::<T> {
            min: Vector3::<T>::from(value.0),
            max: Vector3::<T>::from(value.1),
        }
    }
}
