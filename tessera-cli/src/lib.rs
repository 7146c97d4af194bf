//! Tessera CLI - Command-line interface for Tessera migrations.
//!
//! This crate provides the `tessera` binary: the `migrate` commands that
//! drive the schema engine through `tessera-migrate`, and `db pull`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod output;
pub mod project;
pub mod prompt;
