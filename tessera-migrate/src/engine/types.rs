//! Request and response types exchanged with the schema engine.
//!
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// One schema source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSource {
    /// File path, as given to the CLI.
    pub path: String,
    /// File content.
    pub content: String,
}

/// All schema files of a schema context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemasContainer {
    /// Source files.
    pub files: Vec<SchemaSource>,
}

/// Database objects managed outside of migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFilter {
    /// Tables the engine must ignore.
    pub external_tables: Vec<String>,
    /// Enums the engine must ignore.
    pub external_enums: Vec<String>,
}

/// One migration folder as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationDirectory {
    /// Directory name, e.g. `20240101120000_init`.
    pub id: String,
    /// Absolute directory path.
    pub path: String,
    /// Content of `migration.sql`.
    pub script: String,
}

/// Snapshot of the migrations directory sent with every history-aware call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationList {
    /// Migrations directory path.
    pub base_dir: String,
    /// Content of `migration_lock.toml`, if present.
    pub lockfile: Option<String>,
    /// SQL to run on a fresh shadow database.
    pub shadow_db_init_script: Option<String>,
    /// Entries in ascending id order.
    pub migration_directories: Vec<MigrationDirectory>,
}

/// `devDiagnostic` parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevDiagnosticInput {
    pub migrations_list: MigrationList,
    pub filters: SchemaFilter,
}

/// What `migrate dev` should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum DevAction {
    /// History and database agree; continue with apply/create.
    #[serde(rename = "createMigration", alias = "apply")]
    Apply,
    /// Drift detected; only a reset can recover.
    Reset {
        /// Why the reset is needed.
        reason: String,
    },
}

/// Result of `devDiagnostic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevDiagnostic {
    pub action: DevAction,
}

/// `applyMigrations` parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyMigrationsInput {
    pub migrations_list: MigrationList,
    pub filters: SchemaFilter,
}

/// Result of `applyMigrations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMigrations {
    /// Ids applied by this call, in order.
    pub applied_migration_names: Vec<String>,
}

/// `evaluateDataLoss` parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateDataLossInput {
    pub migrations_list: MigrationList,
    pub schema: SchemasContainer,
    pub filters: SchemaFilter,
}

/// A warning or unexecutable step attached to a migration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationFeedback {
    /// Human readable description.
    pub message: String,
    /// Index of the step it refers to.
    pub step_index: u32,
}

/// Result of `evaluateDataLoss`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataLossEvaluation {
    /// Number of steps the next migration would contain.
    pub migration_steps: u32,
    /// Potentially destructive changes.
    #[serde(default)]
    pub warnings: Vec<MigrationFeedback>,
    /// Changes that cannot be executed as SQL.
    #[serde(default)]
    pub unexecutable_steps: Vec<MigrationFeedback>,
}

/// `createMigration` parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMigrationInput {
    pub migrations_list: MigrationList,
    pub schema: SchemasContainer,
    pub migration_name: String,
    pub draft: bool,
    pub filters: SchemaFilter,
}

/// Result of `createMigration`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMigrationOutput {
    /// The generated script; `None` when there was nothing to migrate.
    pub migration_script: Option<String>,
}

/// `diagnoseMigrationHistory` parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseMigrationHistoryInput {
    pub migrations_list: MigrationList,
    pub opt_in_to_shadow_database: bool,
}

/// How the migrations directory and the database history relate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "diagnostic", rename_all = "camelCase")]
pub enum HistoryDiagnostic {
    /// Some local migrations are not applied yet.
    #[serde(rename_all = "camelCase")]
    DatabaseIsBehind { unapplied_migration_names: Vec<String> },
    /// The database has migrations the directory does not.
    #[serde(rename_all = "camelCase")]
    MigrationsDirectoryIsBehind { unpersisted_migration_names: Vec<String> },
    /// Both sides have migrations the other lacks.
    #[serde(rename_all = "camelCase")]
    HistoriesDiverge {
        last_common_migration_name: Option<String>,
        unpersisted_migration_names: Vec<String>,
        unapplied_migration_names: Vec<String>,
    },
}

/// Result of `diagnoseMigrationHistory`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseMigrationHistoryOutput {
    pub history: Option<HistoryDiagnostic>,
    #[serde(default)]
    pub failed_migration_names: Vec<String>,
    #[serde(default)]
    pub edited_migration_names: Vec<String>,
    pub has_migrations_table: bool,
}

/// Result of `ensureDatabase`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureDatabaseOutput {
    /// Whether the database had to be created.
    pub created: bool,
}

/// `reset` parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetInput {
    pub filters: SchemaFilter,
}

/// `introspect` parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectInput {
    pub schema: SchemasContainer,
    pub force: bool,
    pub composite_type_depth: i32,
}

/// Result of `introspect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectOutput {
    /// The rewritten schema files.
    pub schema: SchemasContainer,
    /// Introspection warnings.
    #[serde(default)]
    pub warnings: Vec<String>,
}
