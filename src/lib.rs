//! Git-aware unit-test generator library
//!
//! This library detects which functions in a working tree are new or
//! modified relative to the last commit, generates unit tests for them via
//! an OpenAI-compatible API, and merges the results into the tree.
pub mod api;
pub mod apply;
pub mod classify;
pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod git;
pub mod style;
pub mod types;

// Re-export commonly used types
pub use config::TestGenConfig;
pub use error::{Result, TestGenError};
pub use types::{FileChangeReport, FunctionRecord, TestInstruction};
