//! Error types for the migration lifecycle.

use thiserror::Error;

/// Result type alias for migration operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur during migration operations.
///
/// User cancellation is not an error; see [`crate::dev::DevOutcome`].
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The schema engine could not be started.
    #[error("Schema engine could not be started: {0}")]
    EngineUnavailable(String),

    /// Transport or protocol failure while talking to the engine.
    #[error("Schema engine request `{method}` failed: {message}")]
    EngineQuery {
        /// RPC method that failed.
        method: String,
        /// Failure description.
        message: String,
    },

    /// The engine processed the request and reported an error.
    #[error("{message}")]
    Engine {
        /// Engine error code, e.g. `P3006`.
        code: Option<String>,
        /// Message from the engine.
        message: String,
    },

    /// The schema change contains steps that cannot be expressed as SQL.
    #[error("{}", unexecutable_message(.0, true))]
    UnexecutableMigration(Vec<String>),

    /// Data loss warnings need confirmation but nobody can answer a prompt.
    #[error(
        "The migrate dev command detected a non-interactive environment, which is not supported.\n\n\
         `tessera migrate dev` is an interactive command designed to create new migrations and evolve the database in development.\n\
         To manage migrations in non-development environments, use `tessera migrate deploy`.\n\
         To accept data loss warnings without a prompt, pass --force."
    )]
    NonInteractiveConfirmationRequired,

    /// No changes to migrate.
    #[error("No schema changes detected")]
    NoChanges,

    /// `migration_lock.toml` was written for another provider.
    #[error(
        "The datasource provider `{schema}` specified in your schema does not match the one specified in migration_lock.toml, `{lock}`. \
         Remove the current migrations directory and start a new migration history with `tessera migrate dev`."
    )]
    ProviderMismatch {
        /// Provider in the schema.
        schema: String,
        /// Provider in the lock file.
        lock: String,
    },

    /// Invalid migration directory contents.
    #[error("Invalid migration: {0}")]
    InvalidMigration(String),

    /// General migration error.
    #[error("Migration error: {0}")]
    Other(String),
}

impl MigrationError {
    /// Create an engine transport error.
    pub fn engine_query(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineQuery {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Create an engine start error.
    pub fn engine_unavailable(msg: impl Into<String>) -> Self {
        Self::EngineUnavailable(msg.into())
    }

    /// Create an invalid migration error.
    pub fn invalid_migration(msg: impl Into<String>) -> Self {
        Self::InvalidMigration(msg.into())
    }

    /// Create an other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether a dev run can carry on without the migration that failed to be created.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoChanges)
    }

    /// Whether the error came from the engine transport rather than the engine itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_) | Self::EngineQuery { .. })
    }
}

/// Render unexecutable steps the way both the error and the create-only
/// warning print them.
pub fn unexecutable_message(steps: &[String], with_hint: bool) -> String {
    let mut message = String::from("We found changes that cannot be executed:\n\n");
    for step in steps {
        message.push_str(&format!("  • {step}\n"));
    }
    if with_hint {
        message.push_str(
            "\nYou can use `tessera migrate dev --create-only` to create the migration file, \
             and manually modify it to address the underlying issue(s).\n\
             Then run `tessera migrate dev` to apply it and verify it works.\n",
        );
    }
    message
}
