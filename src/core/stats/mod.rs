pub mod stat_counter;
pub mod stat_reporter;
pub mod stats_accumlator;

pub use stat_counter::*;
pub use stat_reporter::*;
pub use stats_accumlator::*;
