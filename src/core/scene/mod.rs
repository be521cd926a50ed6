pub mod motion_scene;

pub use motion_scene::*;
