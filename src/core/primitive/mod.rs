pub mod prim_ref;
pub mod recalculate;

pub use prim_ref::*;
pub use recalculate::*;
