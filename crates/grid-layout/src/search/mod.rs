//! Search engines improving the row order of a prepared grid

mod genetic;
mod shuffle;

pub use genetic::GeneticSearch;
pub use shuffle::ShuffleSearch;

/// Seed used when the caller does not provide one
pub const DEFAULT_SEED: u64 = 0x5eed_1a70;
