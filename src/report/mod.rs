//! Report generation for analyzed reviews.

pub mod generator;

pub use generator::*;
