use super::types::Float;

#[cfg(not(feature = "float-as-double"))]
mod detail {
    use super::*;

    pub const MACHINE_EPSILON: Float = f32::EPSILON * 0.5;
    pub const INFINITY: Float = f32::INFINITY;
    pub const NEG_INFINITY: Float = f32::NEG_INFINITY;
}

#[cfg(feature = "float-as-double")]
mod detail {
    use super::*;

    pub const MACHINE_EPSILON: Float = f64::EPSILON * 0.5;
    pub const INFINITY: Float = f64::INFINITY;
    pub const NEG_INFINITY: Float = f64::NEG_INFINITY;
}

pub use detail::*;

/// One unit in the last place of 1.0, the rounding slack used when mapping
/// a time value onto the discrete time-segment grid.
pub const ULP: Float = MACHINE_EPSILON * 2.0;
