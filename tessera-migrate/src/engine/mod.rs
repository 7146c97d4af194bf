//! Schema engine client.
//!
//! The schema engine is an external process that diffs schemas, talks to the
//! database and replays migrations on a shadow database. This module defines
//! the operations the migration workflow needs from it ([`SchemaEngine`]),
//! their wire types ([`types`]), the JSON-RPC adapter that drives the real
//! engine binary ([`JsonRpcEngine`]) and the session guard that makes sure
//! the engine is stopped exactly once ([`EngineSession`]).

#[cfg(test)]
pub(crate) mod fake;
mod rpc;
mod session;
pub mod types;

pub use rpc::{EngineOptions, JsonRpcEngine};
pub use session::EngineSession;

use async_trait::async_trait;

use crate::error::MigrateResult;
use types::{
    AppliedMigrations, ApplyMigrationsInput, CreateMigrationInput, CreateMigrationOutput,
    DataLossEvaluation, DevDiagnostic, DevDiagnosticInput, DiagnoseMigrationHistoryInput,
    DiagnoseMigrationHistoryOutput, EnsureDatabaseOutput, EvaluateDataLossInput, IntrospectInput,
    IntrospectOutput, ResetInput, SchemasContainer,
};

/// Operations the migration workflow runs against a schema engine.
///
/// Implementations report transport failures as
/// [`MigrationError::EngineQuery`](crate::MigrationError::EngineQuery) and
/// errors the engine itself returns as
/// [`MigrationError::Engine`](crate::MigrationError::Engine).
#[async_trait]
pub trait SchemaEngine: Send {
    /// Compare the migrations directory with the database history.
    async fn dev_diagnostic(&mut self, input: DevDiagnosticInput) -> MigrateResult<DevDiagnostic>;

    /// Apply every pending migration, oldest first.
    async fn apply_migrations(
        &mut self,
        input: ApplyMigrationsInput,
    ) -> MigrateResult<AppliedMigrations>;

    /// Dry-run the next migration and report destructive or unexecutable steps.
    async fn evaluate_data_loss(
        &mut self,
        input: EvaluateDataLossInput,
    ) -> MigrateResult<DataLossEvaluation>;

    /// Generate the script of the next migration. Does not touch the directory.
    async fn create_migration(
        &mut self,
        input: CreateMigrationInput,
    ) -> MigrateResult<CreateMigrationOutput>;

    /// Relate the migrations directory to the applied history.
    async fn diagnose_migration_history(
        &mut self,
        input: DiagnoseMigrationHistoryInput,
    ) -> MigrateResult<DiagnoseMigrationHistoryOutput>;

    /// Create the database if it does not exist yet.
    async fn ensure_database(&mut self, schema: SchemasContainer)
    -> MigrateResult<EnsureDatabaseOutput>;

    /// Drop everything in the database.
    async fn reset(&mut self, input: ResetInput) -> MigrateResult<()>;

    /// Rewrite the schema from the live database.
    async fn introspect(&mut self, input: IntrospectInput) -> MigrateResult<IntrospectOutput>;

    /// Shut the engine down.
    async fn stop(&mut self) -> MigrateResult<()>;
}
