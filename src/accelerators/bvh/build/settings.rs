use crate::core::error::*;
use crate::core::pbrt::*;

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Build parameters. Every field has a default, so a settings file only
/// needs to name what it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Children per interior node, at most 8.
    pub branching_factor: usize,
    pub max_depth: usize,
    /// log2 of the number of primitives intersected together.
    pub log_block_size: usize,
    pub min_leaf_size: usize,
    pub max_leaf_size: usize,
    pub trav_cost: Float,
    pub int_cost: Float,
    /// Force every leaf primitive to span a single time segment.
    pub single_leaf_time_segment: bool,
    /// Nodes with more primitives than this recurse in parallel.
    pub single_thread_threshold: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            branching_factor: 2,
            max_depth: 32,
            log_block_size: 0,
            min_leaf_size: 1,
            max_leaf_size: 8,
            trav_cost: 1.0,
            int_cost: 1.0,
            single_leaf_time_segment: false,
            single_thread_threshold: 1024,
        }
    }
}

impl Settings {
    pub fn from_json_str(s: &str) -> Result<Self, BuildError> {
        let settings: Settings = serde_json::from_str(s)?;
        settings.check();
        return Ok(settings);
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        let s = std::fs::read_to_string(path)?;
        return Self::from_json_str(&s);
    }

    fn check(&self) {
        if self.min_leaf_size > self.max_leaf_size {
            warn!(
                "min_leaf_size ({}) exceeds max_leaf_size ({}); leaves may exceed the maximum.",
                self.min_leaf_size, self.max_leaf_size
            );
        }
        if self.max_depth < MIN_LARGE_LEAF_LEVELS {
            warn!(
                "max_depth ({}) is below the large leaf margin ({}); every node becomes a large leaf.",
                self.max_depth, MIN_LARGE_LEAF_LEVELS
            );
        }
    }
}

/// Levels kept in reserve below the cost driven recursion so the large leaf
/// builder always has room to split down to `max_leaf_size`.
pub const MIN_LARGE_LEAF_LEVELS: usize = 8;
