//! # Tessera
//!
//! A schema-driven ORM toolchain with a migration lifecycle built around an
//! external schema engine.
//!
//! Tessera provides:
//! - Schema loading from one file or a directory of `.tessera` files
//! - Project configuration in `tessera.toml`
//! - A durable migrations directory with monotonic, timestamped ids
//! - The `migrate dev` workflow: diagnose drift, catch up, evaluate data
//!   loss, create and apply migrations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera::migrate::{DevOptions, JsonRpcEngine, Migrate, MigrateDev, NoHooks, NonInteractive};
//! use tessera::schema::{SchemaLookup, TesseraConfig, load_schema_context};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cwd = std::env::current_dir()?;
//!     let (config, base) = TesseraConfig::discover(None, &cwd)?;
//!     let context = load_schema_context(&SchemaLookup { cwd: cwd.clone(), ..Default::default() })?;
//!     let migrations_dir = config.migrations_dir(&base, &context);
//!
//!     let engine = JsonRpcEngine::spawn(engine_options).await?;
//!     let mut migrate = Migrate::setup(MigrateOptions::new(context, migrations_dir), engine).await?;
//!
//!     let mut out = std::io::stdout();
//!     let outcome = MigrateDev::new(DevOptions::default(), &mut out, &mut NonInteractive, &mut NoHooks)
//!         .run(&mut migrate)
//!         .await?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema loading, datasource resolution and configuration.
pub mod schema {
    pub use tessera_schema::*;
}

/// Migration history, schema engine client and the dev workflow.
pub mod migrate {
    pub use tessera_migrate::*;
}

/// Commonly used types.
pub mod prelude {
    pub use tessera_migrate::{
        DevOptions, DevOutcome, Migrate, MigrateDev, MigrateOptions, MigrationError,
        MigrationHistoryStore, SchemaEngine,
    };
    pub use tessera_schema::{SchemaContext, SchemaError, TesseraConfig};
}
