use thiserror::Error;

/// Every way a build can fail. None of them is recoverable: the build is
/// abandoned and the error is handed back to the caller.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("bvh_builder: branching factor too large ({requested} > {max})")]
    BranchingFactor { requested: usize, max: usize },

    #[error("depth limit reached (depth {depth} > max depth {max_depth})")]
    DepthLimit { depth: usize, max_depth: usize },

    #[error("build cancelled: {0}")]
    Cancelled(String),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BuildError {
    pub fn cancelled(msg: &str) -> Self {
        BuildError::Cancelled(msg.to_string())
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(e: serde_json::Error) -> Self {
        BuildError::Settings(e.to_string())
    }
}
