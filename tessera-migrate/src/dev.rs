//! The `migrate dev` workflow.
//!
//! [`MigrateDev::run`] drives a [`Migrate`] session through the development
//! loop:
//!
//! 1. create the database if it is missing, then diagnose drift; drift ends
//!    the run with [`Cancellation::ResetRequired`]
//! 2. apply migrations that exist locally but not in the database
//! 3. evaluate data loss of the pending schema change
//! 4. refuse unexecutable steps unless only a draft is created
//! 5. confirm destructive warnings
//! 6. resolve a migration name
//! 7. create the migration and, unless it is a draft, apply it
//! 8. print a summary
//! 9. regenerate the client and seed a freshly created database
//!
//! The engine session is stopped exactly once, after step 7 or as soon as the
//! run fails or is cancelled. A failure to stop is logged and never replaces
//! the outcome of the run. User cancellation is a [`DevOutcome`], not an
//! error.

use std::fmt;
use std::io::Write;

use tracing::{debug, info, warn};

use crate::datasource_info::{format_migration_tree, reset_message};
use crate::engine::SchemaEngine;
use crate::engine::types::DevAction;
use crate::error::{MigrateResult, MigrationError, unexecutable_message};
use crate::interaction::{NameInput, PostMigrateHooks, Prompt, SeedRun};
use crate::migrate::{CreateMigrationParams, CreatedMigration, Migrate};

/// Exit code of cancelled runs.
pub const EXIT_CANCELLED: i32 = 130;

/// Exit code when the seed command failed.
pub const EXIT_SEED_FAILED: i32 = 1;

/// Flags of `migrate dev`.
///
/// Environment overrides are resolved by the caller; the workflow never reads
/// the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevOptions {
    /// Migration name; prompted for when missing.
    pub name: Option<String>,
    /// Create a draft migration without applying it.
    pub create_only: bool,
    /// Accept data loss warnings without asking.
    pub force: bool,
    /// Do not regenerate the client.
    pub skip_generate: bool,
    /// Do not run the seed command.
    pub skip_seed: bool,
}

/// States of a dev run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevPhase {
    Initialized,
    Diagnosed,
    Resetting,
    Applying,
    DataLossEvaluated,
    AwaitingConfirmation,
    Creating,
    DraftReturned,
    Applied,
    Stopped,
    GeneratorTriggered,
    Cancelled,
}

impl DevPhase {
    /// Phase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Diagnosed => "diagnosed",
            Self::Resetting => "resetting",
            Self::Applying => "applying",
            Self::DataLossEvaluated => "data_loss_evaluated",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Creating => "creating",
            Self::DraftReturned => "draft_returned",
            Self::Applied => "applied",
            Self::Stopped => "stopped",
            Self::GeneratorTriggered => "generator_triggered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DevPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run stopped early without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cancellation {
    /// The database drifted from the history; a reset is needed.
    ResetRequired {
        /// Engine explanation.
        reason: String,
    },
    /// The user declined the data loss confirmation.
    ConfirmationDeclined,
    /// The user aborted the migration name prompt.
    NamePromptCancelled,
}

/// Result of the generate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateStatus {
    Skipped,
    Succeeded,
    Failed(String),
}

/// Result of the seed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedStatus {
    /// Skipped by flag, or no database was created.
    Skipped,
    /// No seed command is configured.
    NotConfigured,
    Succeeded,
    Failed(String),
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevReport {
    /// Existing migrations applied before the schema was diffed.
    pub applied_before: Vec<String>,
    /// The migration created by this run.
    pub created: Option<CreatedMigration>,
    /// Migrations applied after creation.
    pub applied: Vec<String>,
    /// Whether the database was created by this run.
    pub database_created: bool,
    pub generate: GenerateStatus,
    pub seed: SeedStatus,
}

/// Outcome of a dev run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevOutcome {
    Completed(DevReport),
    Cancelled(Cancellation),
}

impl DevOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled(_) => EXIT_CANCELLED,
            Self::Completed(report) if matches!(report.seed, SeedStatus::Failed(_)) => {
                EXIT_SEED_FAILED
            }
            Self::Completed(_) => 0,
        }
    }
}

/// Where the session-holding part of the run ended.
enum Flow {
    Cancelled(Cancellation),
    Draft {
        created: Option<CreatedMigration>,
        applied_before: Vec<String>,
        database_created: bool,
    },
    Applied {
        created: Option<CreatedMigration>,
        applied_before: Vec<String>,
        applied: Vec<String>,
        database_created: bool,
    },
}

/// One `migrate dev` run.
pub struct MigrateDev<'a> {
    options: DevOptions,
    out: &'a mut dyn Write,
    prompt: &'a mut dyn Prompt,
    hooks: &'a mut dyn PostMigrateHooks,
    migrations_label: String,
    phase: DevPhase,
}

impl<'a> MigrateDev<'a> {
    /// Create a run writing user-facing output to `out`.
    pub fn new(
        options: DevOptions,
        out: &'a mut dyn Write,
        prompt: &'a mut dyn Prompt,
        hooks: &'a mut dyn PostMigrateHooks,
    ) -> Self {
        Self {
            options,
            out,
            prompt,
            hooks,
            migrations_label: "migrations".to_string(),
            phase: DevPhase::Initialized,
        }
    }

    /// How the migrations directory is named in the summary tree.
    pub fn migrations_label(mut self, label: impl Into<String>) -> Self {
        self.migrations_label = label.into();
        self
    }

    fn transition(&mut self, next: DevPhase) {
        debug!(from = %self.phase, phase = %next, "migrate dev");
        self.phase = next;
    }

    /// Run the workflow. The session is stopped on every path.
    pub async fn run<E: SchemaEngine>(
        mut self,
        migrate: &mut Migrate<E>,
    ) -> MigrateResult<DevOutcome> {
        let result = self.drive(migrate).await;
        let flow = migrate.finish(result).await?;
        self.transition(DevPhase::Stopped);

        match flow {
            Flow::Cancelled(cancellation) => {
                self.transition(DevPhase::Cancelled);
                info!(?cancellation, "migrate dev cancelled");
                Ok(DevOutcome::Cancelled(cancellation))
            }
            Flow::Draft {
                created,
                applied_before,
                database_created,
            } => {
                if let Some(created) = &created {
                    write!(
                        self.out,
                        "Tessera Migrate created the following migration without applying it {}\n\n\
                         You can now edit it and apply it by running tessera migrate dev.\n",
                        created.id
                    )?;
                }
                Ok(DevOutcome::Completed(DevReport {
                    applied_before,
                    created,
                    applied: Vec::new(),
                    database_created,
                    generate: GenerateStatus::Skipped,
                    seed: SeedStatus::Skipped,
                }))
            }
            Flow::Applied {
                created,
                applied_before,
                applied,
                database_created,
            } => {
                self.print_summary(&applied_before, &applied)?;
                let generate = self.generate(migrate).await?;
                let seed = self.seed(database_created).await?;
                Ok(DevOutcome::Completed(DevReport {
                    applied_before,
                    created,
                    applied,
                    database_created,
                    generate,
                    seed,
                }))
            }
        }
    }

    async fn drive<E: SchemaEngine>(&mut self, migrate: &mut Migrate<E>) -> MigrateResult<Flow> {
        self.transition(DevPhase::Initialized);

        let database_created = match migrate.ensure_database_exists().await? {
            Some(notice) => {
                write!(self.out, "{notice}\n\n")?;
                true
            }
            None => false,
        };

        let diagnostic = migrate.dev_diagnostic().await?;
        self.transition(DevPhase::Diagnosed);
        debug!(?diagnostic, "dev diagnostic");

        if let DevAction::Reset { reason } = diagnostic.action {
            self.transition(DevPhase::Resetting);
            let info = migrate.datasource_info();
            writeln!(self.out, "{reason}")?;
            writeln!(self.out, "{}", reset_message(&info))?;
            write!(
                self.out,
                "\nYou may use tessera migrate reset to drop the development database.\n\
                 All data will be lost.\n"
            )?;
            return Ok(Flow::Cancelled(Cancellation::ResetRequired { reason }));
        }

        self.transition(DevPhase::Applying);
        let applied_before = migrate.apply_migrations().await?.applied_migration_names;
        if !applied_before.is_empty() {
            write!(
                self.out,
                "\nThe following migration(s) have been applied:\n\n{}\n",
                format_migration_tree(&self.migrations_label, &applied_before)
            )?;
        }

        let evaluation = migrate.evaluate_data_loss().await?;
        self.transition(DevPhase::DataLossEvaluated);
        debug!(
            steps = evaluation.migration_steps,
            warnings = evaluation.warnings.len(),
            unexecutable = evaluation.unexecutable_steps.len(),
            "data loss evaluated"
        );

        if !evaluation.unexecutable_steps.is_empty() {
            let steps: Vec<String> = evaluation
                .unexecutable_steps
                .iter()
                .map(|step| step.message.clone())
                .collect();
            if !self.options.create_only {
                return Err(MigrationError::UnexecutableMigration(steps));
            }
            write!(self.out, "\n{}", unexecutable_message(&steps, false))?;
        }

        if !evaluation.warnings.is_empty() {
            write!(self.out, "\n⚠️  Warnings for the current datasource:\n\n")?;
            for warning in &evaluation.warnings {
                writeln!(self.out, "  • {}", warning.message)?;
            }
            writeln!(self.out)?;

            if !self.options.force {
                if !self.prompt.can_prompt() {
                    return Err(MigrationError::NonInteractiveConfirmationRequired);
                }

                self.transition(DevPhase::AwaitingConfirmation);
                let message = if self.options.create_only {
                    "Are you sure you want to create this migration?"
                } else {
                    "Are you sure you want to create and apply this migration?"
                };
                if !self.prompt.confirm(message)? {
                    writeln!(self.out, "Migration cancelled.")?;
                    return Ok(Flow::Cancelled(Cancellation::ConfirmationDeclined));
                }
            }
        }

        let mut migration_name = String::new();
        if evaluation.migration_steps > 0 || self.options.create_only {
            match self.resolve_name()? {
                NameInput::Name(name) => migration_name = name,
                NameInput::Cancelled => {
                    writeln!(self.out, "Migration name prompt cancelled.")?;
                    return Ok(Flow::Cancelled(Cancellation::NamePromptCancelled));
                }
            }
        }

        self.transition(DevPhase::Creating);
        let created = match migrate
            .create_migration(CreateMigrationParams {
                migration_name,
                draft: self.options.create_only,
                schema: None,
            })
            .await
        {
            Ok(created) => Some(created),
            Err(e) if e.is_recoverable() => {
                debug!(reason = %e, "no migration created");
                None
            }
            Err(e) => return Err(e),
        };

        if self.options.create_only {
            self.transition(DevPhase::DraftReturned);
            return Ok(Flow::Draft {
                created,
                applied_before,
                database_created,
            });
        }

        let applied = match &created {
            Some(_) => migrate.apply_migrations().await?.applied_migration_names,
            None => Vec::new(),
        };
        self.transition(DevPhase::Applied);

        Ok(Flow::Applied {
            created,
            applied_before,
            applied,
            database_created,
        })
    }

    fn resolve_name(&mut self) -> MigrateResult<NameInput> {
        if let Some(name) = &self.options.name {
            return Ok(NameInput::Name(name.clone()));
        }
        if !self.prompt.can_prompt() {
            return Ok(NameInput::Name(String::new()));
        }
        self.prompt.migration_name()
    }

    fn print_summary(&mut self, applied_before: &[String], applied: &[String]) -> MigrateResult<()> {
        if !applied_before.is_empty() {
            writeln!(self.out)?;
        }

        if applied.is_empty() {
            if applied_before.is_empty() {
                writeln!(
                    self.out,
                    "Already in sync, no schema change or pending migration was found."
                )?;
            } else {
                writeln!(self.out, "Your database is now in sync with your schema.")?;
            }
        } else {
            write!(
                self.out,
                "\nThe following migration(s) have been created and applied from new schema changes:\n\n{}\n\
                 Your database is now in sync with your schema.\n",
                format_migration_tree(&self.migrations_label, applied)
            )?;
        }
        Ok(())
    }

    async fn generate<E: SchemaEngine>(
        &mut self,
        migrate: &Migrate<E>,
    ) -> MigrateResult<GenerateStatus> {
        if self.options.skip_generate {
            return Ok(GenerateStatus::Skipped);
        }

        self.transition(DevPhase::GeneratorTriggered);
        let info = migrate.datasource_info();
        let status = match self.hooks.generate(&info).await {
            Ok(()) => GenerateStatus::Succeeded,
            Err(e) => {
                warn!(error = %e, "client generation failed");
                writeln!(self.out, "{e}")?;
                GenerateStatus::Failed(e.to_string())
            }
        };
        writeln!(self.out)?;
        Ok(status)
    }

    async fn seed(&mut self, database_created: bool) -> MigrateResult<SeedStatus> {
        if !database_created || self.options.skip_seed {
            return Ok(SeedStatus::Skipped);
        }

        let message = match self.hooks.seed().await {
            Ok(SeedRun::NotConfigured) => return Ok(SeedStatus::NotConfigured),
            Ok(SeedRun::Succeeded) => {
                write!(self.out, "\n🌱  The seed command has been executed.\n")?;
                return Ok(SeedStatus::Succeeded);
            }
            Ok(SeedRun::Failed(message)) => message,
            Err(e) => e.to_string(),
        };

        warn!(error = %message, "seed command failed");
        writeln!(self.out, "\nAn error occurred while running the seed command:\n{message}")?;
        Ok(SeedStatus::Failed(message))
    }
}
