//! Defines the data structures and models used throughout the application.
//!
//! This covers environment variable records, the ordered set produced by
//! enumerating the registry, and the per-batch report for CSV-driven operations.

mod env_var;

pub use env_var::*;
