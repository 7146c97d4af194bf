//! # tessera-schema
//!
//! Schema context loading for the Tessera toolchain.
//!
//! This crate provides:
//! - A parser for the top-level blocks of `.tessera` schema files
//! - Datasource resolution (provider, connection URL, schemas)
//! - Loading of single-file and multi-file schemas into a [`SchemaContext`]
//! - Configuration parsing for `tessera.toml`
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_schema::{load_schema_context, SchemaLookup, TesseraConfig};
//!
//! let config = TesseraConfig::from_file("tessera.toml")?;
//! let context = load_schema_context(&SchemaLookup {
//!     from_arg: None,
//!     from_config: config.schema.path.as_deref().map(Into::into),
//!     cwd: std::env::current_dir()?,
//! })?;
//!
//! if let Some(datasource) = &context.primary_datasource {
//!     println!("provider: {}", datasource.provider);
//! }
//! ```

pub mod config;
pub mod context;
pub mod datasource;
pub mod error;
pub mod parser;

pub use config::TesseraConfig;
pub use context::{SchemaContext, SchemaFile, SchemaLookup, load_schema_context};
pub use datasource::{Datasource, Provider};
pub use error::{SchemaError, SchemaResult};
pub use parser::{Block, BlockKind, Expr, ParsedSchema, parse_schema};
