//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(tessera::io))]
    Io(#[from] std::io::Error),

    /// Schema loading error
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] tessera_schema::SchemaError),

    /// Migration error
    #[error(transparent)]
    #[diagnostic(code(tessera::migrate))]
    Migration(#[from] tessera_migrate::MigrationError),
}

impl CliError {
    /// Help shown under a migration error.
    pub fn hint(&self) -> Option<&'static str> {
        use tessera_migrate::MigrationError;

        match self {
            Self::Migration(MigrationError::EngineUnavailable(_)) => Some(
                "Install the schema engine or point TESSERA_SCHEMA_ENGINE_BINARY / [engine] binary at it.",
            ),
            Self::Migration(MigrationError::ProviderMismatch { .. }) => {
                Some("The lock file lives in the migrations directory as migration_lock.toml.")
            }
            Self::Migration(e) if e.is_transport() => {
                Some("The schema engine stopped responding. Run again with TESSERA_LOG=debug to see the exchange.")
            }
            _ => None,
        }
    }
}
