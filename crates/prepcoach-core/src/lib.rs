//! prepcoach-core: answer scoring, code grading, and the question catalog.
//!
//! This crate defines the data model, the heuristic answer scorer, the
//! literal test-case grammar, and the grader that drives a [`CodeSandbox`]
//! implementation supplied by the host.
//!
//! [`CodeSandbox`]: traits::CodeSandbox

pub mod config;
pub mod error;
pub mod grader;
pub mod literal;
pub mod model;
pub mod parser;
pub mod profile;
pub mod report;
pub mod results;
pub mod scorer;
pub mod session;
pub mod statistics;
pub mod traits;
