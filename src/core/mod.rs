pub mod error;
pub mod geometry;
pub mod misc;
pub mod pbrt;
pub mod primitive;
pub mod rng;
pub mod scene;
pub mod stats;
