//! The migration handle.
//!
//! [`Migrate`] pairs a started schema engine with the migrations directory and
//! the loaded schema. Every command builds one with [`Migrate::setup`], runs a
//! few operations and calls [`Migrate::stop`] on every exit path.

use std::path::PathBuf;

use chrono::Utc;
use tessera_schema::{Provider, SchemaContext};
use tracing::{debug, info, warn};

use crate::datasource_info::{DatasourceInfo, created_database_message, parse_datasource_info};
use crate::engine::types::{
    AppliedMigrations, ApplyMigrationsInput, CreateMigrationInput, DataLossEvaluation,
    DevDiagnostic, DevDiagnosticInput, DiagnoseMigrationHistoryInput, EvaluateDataLossInput,
    HistoryDiagnostic, IntrospectInput, IntrospectOutput, MigrationList, ResetInput, SchemaFilter,
    SchemaSource, SchemasContainer,
};
use crate::engine::{EngineSession, SchemaEngine};
use crate::error::{MigrateResult, MigrationError};
use crate::history::{self, MigrationEntry, MigrationHistoryStore};

/// Script of a draft migration created without schema changes.
pub const EMPTY_MIGRATION_SCRIPT: &str = "-- This is an empty migration.";

/// Everything [`Migrate::setup`] needs besides the engine.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    /// Driver adapter the engine connects through, if any.
    pub adapter: Option<String>,
    /// Path to the migrations directory.
    pub migrations_dir: PathBuf,
    /// The loaded schema.
    pub schema_context: SchemaContext,
    /// Externally managed tables and enums.
    pub schema_filter: SchemaFilter,
    /// SQL run on a fresh shadow database.
    pub shadow_db_init_script: Option<String>,
}

impl MigrateOptions {
    /// Create options with no adapter, filter or shadow script.
    pub fn new(schema_context: SchemaContext, migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            adapter: None,
            migrations_dir: migrations_dir.into(),
            schema_context,
            schema_filter: SchemaFilter::default(),
            shadow_db_init_script: None,
        }
    }

    /// Set the driver adapter.
    pub fn adapter(mut self, adapter: Option<String>) -> Self {
        self.adapter = adapter;
        self
    }

    /// Set the schema filter.
    pub fn schema_filter(mut self, filter: SchemaFilter) -> Self {
        self.schema_filter = filter;
        self
    }

    /// Set the shadow database init script.
    pub fn shadow_db_init_script(mut self, script: Option<String>) -> Self {
        self.shadow_db_init_script = script;
        self
    }
}

/// Parameters of [`Migrate::create_migration`].
#[derive(Debug, Clone, Default)]
pub struct CreateMigrationParams {
    /// Name the slug is derived from.
    pub migration_name: String,
    /// Create the entry without expecting it to be applied.
    pub draft: bool,
    /// Schema to diff against; the loaded schema when `None`.
    pub schema: Option<SchemasContainer>,
}

/// A migration written to the migrations directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMigration {
    /// Folder name.
    pub id: String,
    /// Folder path.
    pub path: PathBuf,
    /// Whether it was created as a draft.
    pub draft: bool,
    /// Script body.
    pub script: String,
}

/// Applied and pending migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Local migrations recorded in the database.
    pub applied: Vec<String>,
    /// Local migrations not applied yet.
    pub pending: Vec<String>,
    /// Migrations in the database that are missing locally.
    pub unpersisted: Vec<String>,
    /// Migrations that failed to apply.
    pub failed: Vec<String>,
    /// Migrations modified after they were applied.
    pub edited: Vec<String>,
    /// Whether the database has a migrations table at all.
    pub has_migrations_table: bool,
}

impl MigrationStatus {
    /// Whether the database history matches the directory.
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
            && self.unpersisted.is_empty()
            && self.failed.is_empty()
            && self.edited.is_empty()
    }
}

/// A migration session.
pub struct Migrate<E: SchemaEngine> {
    session: EngineSession<E>,
    store: MigrationHistoryStore,
    schema_context: SchemaContext,
    adapter: Option<String>,
    schema_filter: SchemaFilter,
    shadow_db_init_script: Option<String>,
}

impl<E: SchemaEngine> Migrate<E> {
    /// Take ownership of a started engine and prepare the migrations directory.
    ///
    /// On failure the engine is stopped before the error is returned.
    pub async fn setup(options: MigrateOptions, engine: E) -> MigrateResult<Self> {
        let mut migrate = Self {
            session: EngineSession::new(engine),
            store: MigrationHistoryStore::new(options.migrations_dir),
            schema_context: options.schema_context,
            adapter: options.adapter,
            schema_filter: options.schema_filter,
            shadow_db_init_script: options.shadow_db_init_script,
        };

        if let Err(e) = migrate.prepare().await {
            return migrate.finish(Err(e)).await;
        }

        debug!(dir = %migrate.store.migrations_dir().display(), "migrate session ready");
        Ok(migrate)
    }

    async fn prepare(&mut self) -> MigrateResult<()> {
        self.store.ensure_dir().await?;

        let (Some(datasource), Some(lock)) = (
            self.schema_context.primary_datasource.as_ref(),
            self.store.read_lock().await?,
        ) else {
            return Ok(());
        };

        if Provider::from_str(&lock.provider) != Some(datasource.provider) {
            return Err(MigrationError::ProviderMismatch {
                schema: datasource.provider.as_str().to_string(),
                lock: lock.provider,
            });
        }
        Ok(())
    }

    /// The history store.
    pub fn store(&self) -> &MigrationHistoryStore {
        &self.store
    }

    /// Display information about the target database.
    pub fn datasource_info(&self) -> DatasourceInfo {
        parse_datasource_info(self.schema_context.primary_datasource.as_ref())
    }

    /// The loaded schema as sent to the engine.
    pub fn schema(&self) -> SchemasContainer {
        SchemasContainer {
            files: self
                .schema_context
                .sources()
                .map(|(path, content)| SchemaSource {
                    path: path.display().to_string(),
                    content: content.to_string(),
                })
                .collect(),
        }
    }

    async fn migrations_list(&self) -> MigrateResult<(Vec<MigrationEntry>, MigrationList)> {
        let entries = self.store.list_entries().await?;
        let list = MigrationList {
            base_dir: self.store.migrations_dir().display().to_string(),
            lockfile: self.store.lock_contents().await?,
            shadow_db_init_script: self.shadow_db_init_script.clone(),
            migration_directories: entries.iter().map(MigrationEntry::to_directory).collect(),
        };
        Ok((entries, list))
    }

    /// Ask the engine whether the history and the database agree.
    pub async fn dev_diagnostic(&mut self) -> MigrateResult<DevDiagnostic> {
        let (_, migrations_list) = self.migrations_list().await?;
        let input = DevDiagnosticInput {
            migrations_list,
            filters: self.schema_filter.clone(),
        };
        self.session.engine()?.dev_diagnostic(input).await
    }

    /// Apply every pending migration.
    pub async fn apply_migrations(&mut self) -> MigrateResult<AppliedMigrations> {
        let (_, migrations_list) = self.migrations_list().await?;
        let input = ApplyMigrationsInput {
            migrations_list,
            filters: self.schema_filter.clone(),
        };
        let applied = self.session.engine()?.apply_migrations(input).await?;
        info!(applied = applied.applied_migration_names.len(), "migrations applied");
        Ok(applied)
    }

    /// Dry-run the next migration.
    pub async fn evaluate_data_loss(&mut self) -> MigrateResult<DataLossEvaluation> {
        let (_, migrations_list) = self.migrations_list().await?;
        let input = EvaluateDataLossInput {
            migrations_list,
            schema: self.schema(),
            filters: self.schema_filter.clone(),
        };
        self.session.engine()?.evaluate_data_loss(input).await
    }

    /// Generate the next migration and write it to the migrations directory.
    ///
    /// Returns [`MigrationError::NoChanges`] when there is nothing to migrate
    /// and `draft` is false.
    pub async fn create_migration(
        &mut self,
        params: CreateMigrationParams,
    ) -> MigrateResult<CreatedMigration> {
        let (existing, migrations_list) = self.migrations_list().await?;
        let input = CreateMigrationInput {
            migrations_list,
            schema: params.schema.unwrap_or_else(|| self.schema()),
            migration_name: params.migration_name.clone(),
            draft: params.draft,
            filters: self.schema_filter.clone(),
        };

        let output = self.session.engine()?.create_migration(input).await?;
        let script = match output.migration_script.filter(|s| !s.trim().is_empty()) {
            Some(script) => script,
            None if params.draft => EMPTY_MIGRATION_SCRIPT.to_string(),
            None => return Err(MigrationError::NoChanges),
        };

        let id = history::next_id(&existing, &params.migration_name, Utc::now());
        let entry = self.store.append(MigrationEntry::new(id, script)).await?;

        if let Some(datasource) = &self.schema_context.primary_datasource {
            self.store.write_lock(datasource.provider.as_str()).await?;
        }

        info!(migration_id = %entry.id, draft = params.draft, "migration created");
        Ok(CreatedMigration {
            id: entry.id,
            path: entry.path,
            draft: params.draft,
            script: entry.script,
        })
    }

    /// Create the database if it is missing.
    ///
    /// Returns the notice to print when a database was created. Skipped when
    /// a driver adapter is configured.
    pub async fn ensure_database_exists(&mut self) -> MigrateResult<Option<String>> {
        if self.adapter.is_some() || self.schema_context.primary_datasource.is_none() {
            return Ok(None);
        }

        let schema = self.schema();
        let output = self.session.engine()?.ensure_database(schema).await?;
        if output.created {
            let info = self.datasource_info();
            info!(database = ?info.db_name, "database created");
            Ok(Some(created_database_message(&info)))
        } else {
            Ok(None)
        }
    }

    /// Compare the migrations directory with the applied history.
    pub async fn migration_status(&mut self) -> MigrateResult<MigrationStatus> {
        let (entries, migrations_list) = self.migrations_list().await?;
        let input = DiagnoseMigrationHistoryInput {
            migrations_list,
            opt_in_to_shadow_database: false,
        };
        let output = self.session.engine()?.diagnose_migration_history(input).await?;

        let (pending, unpersisted) = match output.history {
            None => (Vec::new(), Vec::new()),
            Some(HistoryDiagnostic::DatabaseIsBehind {
                unapplied_migration_names,
            }) => (unapplied_migration_names, Vec::new()),
            Some(HistoryDiagnostic::MigrationsDirectoryIsBehind {
                unpersisted_migration_names,
            }) => (Vec::new(), unpersisted_migration_names),
            Some(HistoryDiagnostic::HistoriesDiverge {
                unapplied_migration_names,
                unpersisted_migration_names,
                ..
            }) => (unapplied_migration_names, unpersisted_migration_names),
        };

        let applied = entries
            .into_iter()
            .map(|e| e.id)
            .filter(|id| !pending.contains(id))
            .collect();

        Ok(MigrationStatus {
            applied,
            pending,
            unpersisted,
            failed: output.failed_migration_names,
            edited: output.edited_migration_names,
            has_migrations_table: output.has_migrations_table,
        })
    }

    /// Drop everything in the development database.
    pub async fn reset(&mut self) -> MigrateResult<()> {
        let input = ResetInput {
            filters: self.schema_filter.clone(),
        };
        self.session.engine()?.reset(input).await?;
        info!("database reset");
        Ok(())
    }

    /// Rewrite the schema from the live database.
    pub async fn introspect(&mut self, force: bool) -> MigrateResult<IntrospectOutput> {
        let input = IntrospectInput {
            schema: self.schema(),
            force,
            composite_type_depth: -1,
        };
        self.session.engine()?.introspect(input).await
    }

    /// Release the engine. Safe to call more than once.
    pub async fn stop(&mut self) -> MigrateResult<()> {
        self.session.stop().await
    }

    /// Release the engine after an operation and hand back its result.
    ///
    /// A failure to stop is logged and never replaces the operation's own
    /// outcome: an error stays that error, and applied work stays reported.
    pub async fn finish<T>(&mut self, result: MigrateResult<T>) -> MigrateResult<T> {
        if let Err(e) = self.stop().await {
            warn!(error = %e, "failed to stop schema engine");
        }
        result
    }
}
