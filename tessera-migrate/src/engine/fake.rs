//! In-memory engine for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::SchemaEngine;
use super::types::*;
use crate::error::{MigrateResult, MigrationError};

/// Applies whatever the directory contains and returns a canned script.
#[derive(Default)]
pub(crate) struct FakeEngine {
    pub action: Option<DevAction>,
    pub evaluation: DataLossEvaluation,
    pub script: Option<String>,
    pub database_history: Vec<String>,
    pub created_database: bool,
    pub fail_stop: bool,
    pub stops: Arc<AtomicUsize>,
}

impl FakeEngine {
    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaEngine for FakeEngine {
    async fn dev_diagnostic(&mut self, _input: DevDiagnosticInput) -> MigrateResult<DevDiagnostic> {
        Ok(DevDiagnostic {
            action: self.action.clone().unwrap_or(DevAction::Apply),
        })
    }

    async fn apply_migrations(
        &mut self,
        input: ApplyMigrationsInput,
    ) -> MigrateResult<AppliedMigrations> {
        let mut applied = Vec::new();
        for dir in input.migrations_list.migration_directories {
            if !self.database_history.contains(&dir.id) {
                self.database_history.push(dir.id.clone());
                applied.push(dir.id);
            }
        }
        Ok(AppliedMigrations {
            applied_migration_names: applied,
        })
    }

    async fn evaluate_data_loss(
        &mut self,
        _input: EvaluateDataLossInput,
    ) -> MigrateResult<DataLossEvaluation> {
        Ok(self.evaluation.clone())
    }

    async fn create_migration(
        &mut self,
        _input: CreateMigrationInput,
    ) -> MigrateResult<CreateMigrationOutput> {
        Ok(CreateMigrationOutput {
            migration_script: self.script.clone(),
        })
    }

    async fn diagnose_migration_history(
        &mut self,
        input: DiagnoseMigrationHistoryInput,
    ) -> MigrateResult<DiagnoseMigrationHistoryOutput> {
        let unapplied: Vec<String> = input
            .migrations_list
            .migration_directories
            .into_iter()
            .map(|d| d.id)
            .filter(|id| !self.database_history.contains(id))
            .collect();
        Ok(DiagnoseMigrationHistoryOutput {
            history: (!unapplied.is_empty()).then(|| HistoryDiagnostic::DatabaseIsBehind {
                unapplied_migration_names: unapplied,
            }),
            has_migrations_table: !self.database_history.is_empty(),
            ..Default::default()
        })
    }

    async fn ensure_database(
        &mut self,
        _schema: SchemasContainer,
    ) -> MigrateResult<EnsureDatabaseOutput> {
        Ok(EnsureDatabaseOutput {
            created: self.created_database,
        })
    }

    async fn reset(&mut self, _input: ResetInput) -> MigrateResult<()> {
        self.database_history.clear();
        Ok(())
    }

    async fn introspect(&mut self, input: IntrospectInput) -> MigrateResult<IntrospectOutput> {
        Ok(IntrospectOutput {
            schema: input.schema,
            warnings: vec![],
        })
    }

    async fn stop(&mut self) -> MigrateResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            return Err(MigrationError::engine_query("stop", "engine did not exit"));
        }
        Ok(())
    }
}
