//! Randomized hyperparameter optimization

pub mod random_search;
pub mod search_space;

pub use random_search::{RandomSearch, SearchConfig, SearchResult, TrialOutcome};
pub use search_space::{FloatRange, ForestSearchSpace, IntRange};
