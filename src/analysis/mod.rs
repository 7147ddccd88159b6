//! Analysis modules.
//!
//! Validation, ranking and aggregation of scored review results.

pub mod aggregator;
pub mod ranker;
pub mod validator;

pub use aggregator::*;
pub use ranker::rank;
pub use validator::validate;
