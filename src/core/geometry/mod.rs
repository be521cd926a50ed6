pub mod bounds3;
pub mod interval;
pub mod lbounds;
pub mod vector3;

pub use bounds3::*;
pub use interval::*;
pub use lbounds::*;
pub use vector3::*;
