//! # tessera-migrate
//!
//! Migration lifecycle orchestration for Tessera.
//!
//! This crate reconciles three things: the declared schema, the migrations
//! directory (the durable history) and the live database. The heavy lifting
//! of diffing schemas and executing SQL is done by the external schema
//! engine; this crate decides what to ask it and in which order.
//!
//! ## Components
//!
//! - [`MigrationHistoryStore`] reads and appends migration folders
//! - [`SchemaEngine`] is the boundary to the engine, [`JsonRpcEngine`] the
//!   process-backed implementation
//! - [`Migrate`] is one engine session bound to a schema and a directory
//! - [`MigrateDev`] runs the `migrate dev` workflow on top of it
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_migrate::{
//!     DevOptions, EngineOptions, JsonRpcEngine, Migrate, MigrateDev, MigrateOptions,
//!     NoHooks, NonInteractive,
//! };
//!
//! let engine = JsonRpcEngine::spawn(engine_options).await?;
//! let mut migrate = Migrate::setup(MigrateOptions::new(context, "tessera/migrations"), engine).await?;
//!
//! let mut out = std::io::stdout();
//! let outcome = MigrateDev::new(DevOptions::default(), &mut out, &mut NonInteractive, &mut NoHooks)
//!     .run(&mut migrate)
//!     .await?;
//! std::process::exit(outcome.exit_code());
//! ```

pub mod datasource_info;
pub mod dev;
pub mod engine;
pub mod error;
pub mod history;
pub mod interaction;
pub mod migrate;

pub use datasource_info::{DatasourceInfo, parse_datasource_info};
pub use dev::{
    Cancellation, DevOptions, DevOutcome, DevPhase, DevReport, EXIT_CANCELLED, GenerateStatus,
    MigrateDev, SeedStatus,
};
pub use engine::types::{
    AppliedMigrations, DataLossEvaluation, DevAction, DevDiagnostic, IntrospectOutput, SchemaFilter,
};
pub use engine::{EngineOptions, EngineSession, JsonRpcEngine, SchemaEngine};
pub use error::{MigrateResult, MigrationError};
pub use history::{MigrationEntry, MigrationHistoryStore};
pub use interaction::{NameInput, NoHooks, NonInteractive, PostMigrateHooks, Prompt, SeedRun};
pub use migrate::{CreateMigrationParams, CreatedMigration, Migrate, MigrateOptions, MigrationStatus};
