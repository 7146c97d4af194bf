//! CLI command implementations.
//!
//! Every command returns the process exit code.

pub mod db;
pub mod migrate;
