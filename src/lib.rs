pub mod accelerators;
pub mod core;
