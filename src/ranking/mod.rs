// Ranking module.
// Scores repositories and orders them by access history and usage score.

pub mod order;
pub mod score;

pub use order::{AccessTimes, rank};
pub use score::{DEFAULT_DECAY_DAYS, DEFAULT_STAR_WEIGHT, ScoreWeights};
