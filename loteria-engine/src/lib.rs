pub mod config;
pub mod engine;
pub mod error;
pub mod histogram;
pub mod permutation;
pub mod range;
pub mod redundancy;
pub mod store;
pub mod unplayed;
pub mod validator;
pub mod void;

#[cfg(test)]
mod test_support;

pub use engine::PatternEngine;
pub use error::{EngineError, EngineResult, NotFound, ValidationError};
