pub mod callbacks;
pub mod child_list;
pub mod heuristic_binning;
pub mod heuristic_timesplit;
pub mod msmblur;
pub mod node;
pub mod prim_pool;
pub mod record;
pub mod set;
pub mod settings;
pub mod split;

pub use callbacks::*;
pub use child_list::*;
pub use heuristic_binning::*;
pub use heuristic_timesplit::*;
pub use msmblur::*;
pub use node::*;
pub use prim_pool::*;
pub use record::*;
pub use set::*;
pub use settings::*;
pub use split::*;
