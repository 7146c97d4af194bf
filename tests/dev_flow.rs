//! End-to-end tests of the `migrate dev` workflow against an in-memory engine.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use tessera::migrate::engine::types::*;
use tessera::migrate::{
    Cancellation, DatasourceInfo, DevOptions, DevOutcome, GenerateStatus, Migrate, MigrateDev,
    MigrateOptions, MigrateResult, MigrationError, MigrationHistoryStore, NameInput,
    PostMigrateHooks, Prompt, SchemaEngine, SeedRun, SeedStatus,
};
use tessera::schema::SchemaContext;
use tempfile::TempDir;

const SCHEMA: &str = r#"
datasource db {
  provider = "postgresql"
  url      = "postgresql://localhost:5432/app"
}

model User {
  id    Int    @id @default(autoincrement())
  email String @unique
}
"#;

/// What the engine has done so far, shared with the test.
#[derive(Default)]
struct EngineState {
    applied: Vec<String>,
    stops: usize,
    created_scripts: usize,
}

#[derive(Default, Clone)]
struct TestEngine {
    action: Option<DevAction>,
    evaluation: DataLossEvaluation,
    script: Option<String>,
    created_database: bool,
    /// Engine method that fails with a transport error.
    broken_method: Option<&'static str>,
    fail_stop: bool,
    state: Arc<Mutex<EngineState>>,
}

impl TestEngine {
    fn with_script(script: &str) -> Self {
        Self {
            evaluation: DataLossEvaluation {
                migration_steps: 1,
                ..Default::default()
            },
            script: Some(script.to_string()),
            ..Default::default()
        }
    }

    fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    fn applied(&self) -> Vec<String> {
        self.state.lock().unwrap().applied.clone()
    }

    fn check(&self, method: &str) -> MigrateResult<()> {
        if self.broken_method == Some(method) {
            return Err(MigrationError::engine_query(method, "engine closed its output"));
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaEngine for TestEngine {
    async fn dev_diagnostic(&mut self, _input: DevDiagnosticInput) -> MigrateResult<DevDiagnostic> {
        self.check("devDiagnostic")?;
        Ok(DevDiagnostic {
            action: self.action.clone().unwrap_or(DevAction::Apply),
        })
    }

    async fn apply_migrations(
        &mut self,
        input: ApplyMigrationsInput,
    ) -> MigrateResult<AppliedMigrations> {
        let mut state = self.state.lock().unwrap();
        let mut applied = Vec::new();
        for dir in input.migrations_list.migration_directories {
            if !state.applied.contains(&dir.id) {
                state.applied.push(dir.id.clone());
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
        self.check("evaluateDataLoss")?;
        Ok(self.evaluation.clone())
    }

    async fn create_migration(
        &mut self,
        _input: CreateMigrationInput,
    ) -> MigrateResult<CreateMigrationOutput> {
        self.state.lock().unwrap().created_scripts += 1;
        Ok(CreateMigrationOutput {
            migration_script: self.script.clone(),
        })
    }

    async fn diagnose_migration_history(
        &mut self,
        _input: DiagnoseMigrationHistoryInput,
    ) -> MigrateResult<DiagnoseMigrationHistoryOutput> {
        Ok(DiagnoseMigrationHistoryOutput::default())
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
        self.state.lock().unwrap().applied.clear();
        Ok(())
    }

    async fn introspect(&mut self, input: IntrospectInput) -> MigrateResult<IntrospectOutput> {
        Ok(IntrospectOutput {
            schema: input.schema,
            warnings: vec![],
        })
    }

    async fn stop(&mut self) -> MigrateResult<()> {
        self.state.lock().unwrap().stops += 1;
        if self.fail_stop {
            return Err(MigrationError::engine_query("stop", "engine did not exit"));
        }
        Ok(())
    }
}

struct ScriptedPrompt {
    interactive: bool,
    confirm: bool,
    name: NameInput,
    questions: Vec<String>,
}

impl ScriptedPrompt {
    fn non_interactive() -> Self {
        Self {
            interactive: false,
            confirm: false,
            name: NameInput::Name(String::new()),
            questions: Vec::new(),
        }
    }

    fn answering(confirm: bool, name: NameInput) -> Self {
        Self {
            interactive: true,
            confirm,
            name,
            questions: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn can_prompt(&self) -> bool {
        self.interactive
    }

    fn confirm(&mut self, message: &str) -> MigrateResult<bool> {
        self.questions.push(message.to_string());
        Ok(self.confirm)
    }

    fn migration_name(&mut self) -> MigrateResult<NameInput> {
        self.questions.push("name".to_string());
        Ok(self.name.clone())
    }
}

struct RecordingHooks {
    seed: SeedRun,
    generated: usize,
    seeded: usize,
}

impl RecordingHooks {
    fn seeding(seed: SeedRun) -> Self {
        Self {
            seed,
            generated: 0,
            seeded: 0,
        }
    }
}

#[async_trait]
impl PostMigrateHooks for RecordingHooks {
    async fn generate(&mut self, datasource: &DatasourceInfo) -> MigrateResult<()> {
        assert_eq!(datasource.name.as_deref(), Some("db"));
        self.generated += 1;
        Ok(())
    }

    async fn seed(&mut self) -> MigrateResult<SeedRun> {
        self.seeded += 1;
        Ok(self.seed.clone())
    }
}

fn context() -> SchemaContext {
    SchemaContext::from_files(
        "schema.tessera",
        vec![(PathBuf::from("schema.tessera"), SCHEMA.to_string())],
        |_| None,
    )
    .unwrap()
}

fn migrations_dir(dir: &Path) -> PathBuf {
    dir.join("migrations")
}

async fn setup(dir: &Path, engine: TestEngine) -> Migrate<TestEngine> {
    Migrate::setup(MigrateOptions::new(context(), migrations_dir(dir)), engine)
        .await
        .unwrap()
}

/// Run `migrate dev` once and return the outcome with everything printed.
async fn run_dev(
    dir: &Path,
    engine: TestEngine,
    options: DevOptions,
    prompt: &mut ScriptedPrompt,
    hooks: &mut RecordingHooks,
) -> (MigrateResult<DevOutcome>, String) {
    let mut migrate = setup(dir, engine).await;
    let mut out = Vec::new();
    let outcome = MigrateDev::new(options, &mut out, prompt, hooks)
        .run(&mut migrate)
        .await;
    (outcome, String::from_utf8(out).unwrap())
}

fn named(name: &str) -> DevOptions {
    DevOptions {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

async fn entry_ids(dir: &Path) -> Vec<String> {
    MigrationHistoryStore::new(migrations_dir(dir))
        .list_entries()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect()
}

#[tokio::test]
async fn test_fresh_schema_is_created_and_applied() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine::with_script("CREATE TABLE \"User\" (\"id\" SERIAL);");
    let mut prompt = ScriptedPrompt::non_interactive();
    let mut hooks = RecordingHooks::seeding(SeedRun::NotConfigured);

    let (outcome, out) =
        run_dev(dir.path(), engine.clone(), named("init"), &mut prompt, &mut hooks).await;

    let DevOutcome::Completed(report) = outcome.unwrap() else {
        panic!("expected a completed run");
    };
    let created = report.created.expect("a migration is created");
    assert!(created.id.ends_with("_init"));
    assert_eq!(report.applied, vec![created.id.clone()]);
    assert_eq!(report.generate, GenerateStatus::Succeeded);
    assert_eq!(report.seed, SeedStatus::Skipped);

    assert!(out.contains("have been created and applied from new schema changes"));
    assert!(out.contains(&created.id));
    assert!(out.contains("Your database is now in sync with your schema."));

    assert_eq!(engine.applied(), vec![created.id.clone()]);
    assert_eq!(entry_ids(dir.path()).await, vec![created.id]);
    assert_eq!(engine.stops(), 1);
    assert_eq!(hooks.generated, 1);
    assert_eq!(hooks.seeded, 0);
}

#[tokio::test]
async fn test_reset_required_cancels_without_applying() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        action: Some(DevAction::Reset {
            reason: "Drift detected: the database schema is not in sync.".into(),
        }),
        ..TestEngine::with_script("SELECT 1;")
    };
    let mut prompt = ScriptedPrompt::answering(true, NameInput::Name("x".into()));
    let mut hooks = RecordingHooks::seeding(SeedRun::Succeeded);

    let (outcome, out) =
        run_dev(dir.path(), engine.clone(), named("x"), &mut prompt, &mut hooks).await;

    let outcome = outcome.unwrap();
    assert_eq!(outcome.exit_code(), 130);
    assert!(matches!(
        outcome,
        DevOutcome::Cancelled(Cancellation::ResetRequired { ref reason }) if reason.starts_with("Drift")
    ));
    assert!(out.contains("Drift detected"));
    assert!(out.contains("tessera migrate reset"));
    assert!(out.contains("All data will be lost."));

    assert!(engine.applied().is_empty());
    assert!(entry_ids(dir.path()).await.is_empty());
    assert_eq!(engine.stops(), 1);
    assert!(prompt.questions.is_empty());
    assert_eq!(hooks.generated, 0);
}

#[tokio::test]
async fn test_rerun_without_changes_is_in_sync() {
    let dir = TempDir::new().unwrap();
    let state = Arc::new(Mutex::new(EngineState::default()));
    let first = TestEngine {
        state: state.clone(),
        ..TestEngine::with_script("CREATE TABLE a (id INT);")
    };
    let mut hooks = RecordingHooks::seeding(SeedRun::NotConfigured);

    let (outcome, _) = run_dev(
        dir.path(),
        first,
        named("a"),
        &mut ScriptedPrompt::non_interactive(),
        &mut hooks,
    )
    .await;
    assert_eq!(outcome.unwrap().exit_code(), 0);

    let second = TestEngine {
        state: state.clone(),
        ..Default::default()
    };
    let (outcome, out) = run_dev(
        dir.path(),
        second,
        DevOptions::default(),
        &mut ScriptedPrompt::non_interactive(),
        &mut hooks,
    )
    .await;

    let DevOutcome::Completed(report) = outcome.unwrap() else {
        panic!("expected a completed run");
    };
    assert!(report.created.is_none());
    assert!(report.applied_before.is_empty());
    assert!(report.applied.is_empty());
    assert!(out.contains("Already in sync, no schema change or pending migration was found."));

    let state = state.lock().unwrap();
    assert_eq!(state.applied.len(), 1);
    assert_eq!(state.stops, 2);
}

#[tokio::test]
async fn test_pending_migrations_are_applied_first() {
    let dir = TempDir::new().unwrap();
    let store = MigrationHistoryStore::new(migrations_dir(dir.path()));
    store
        .append(tessera::migrate::MigrationEntry::new(
            "20240101000000_init",
            "CREATE TABLE a (id INT);",
        ))
        .await
        .unwrap();

    let engine = TestEngine::default();
    let (outcome, out) = run_dev(
        dir.path(),
        engine.clone(),
        DevOptions::default(),
        &mut ScriptedPrompt::non_interactive(),
        &mut RecordingHooks::seeding(SeedRun::NotConfigured),
    )
    .await;

    let DevOutcome::Completed(report) = outcome.unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(report.applied_before, vec!["20240101000000_init"]);
    assert!(report.created.is_none());
    assert!(out.contains("The following migration(s) have been applied:"));
    assert!(out.contains("Your database is now in sync with your schema."));
    assert_eq!(engine.applied(), vec!["20240101000000_init"]);
}

#[tokio::test]
async fn test_create_only_writes_draft_without_applying() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine::with_script("ALTER TABLE a ADD COLUMN b INT;");
    let mut hooks = RecordingHooks::seeding(SeedRun::Succeeded);
    let options = DevOptions {
        name: Some("add b".into()),
        create_only: true,
        ..Default::default()
    };

    let (outcome, out) = run_dev(
        dir.path(),
        engine.clone(),
        options,
        &mut ScriptedPrompt::non_interactive(),
        &mut hooks,
    )
    .await;

    let DevOutcome::Completed(report) = outcome.unwrap() else {
        panic!("expected a completed run");
    };
    let created = report.created.expect("a draft is created");
    assert!(created.draft);
    assert!(created.id.ends_with("_add_b"));
    assert!(report.applied.is_empty());
    assert!(out.contains("created the following migration without applying it"));
    assert!(out.contains(&created.id));

    assert!(engine.applied().is_empty());
    assert_eq!(entry_ids(dir.path()).await, vec![created.id]);
    assert_eq!(engine.stops(), 1);
    assert_eq!(hooks.generated, 0);
    assert_eq!(hooks.seeded, 0);
}

#[tokio::test]
async fn test_ids_increase_within_the_same_second() {
    let dir = TempDir::new().unwrap();
    let state = Arc::new(Mutex::new(EngineState::default()));

    for name in ["first", "second", "third"] {
        let engine = TestEngine {
            state: state.clone(),
            ..TestEngine::with_script("SELECT 1;")
        };
        let options = DevOptions {
            name: Some(name.into()),
            create_only: true,
            ..Default::default()
        };
        let (outcome, _) = run_dev(
            dir.path(),
            engine,
            options,
            &mut ScriptedPrompt::non_interactive(),
            &mut RecordingHooks::seeding(SeedRun::NotConfigured),
        )
        .await;
        outcome.unwrap();
    }

    let ids = entry_ids(dir.path()).await;
    assert_eq!(ids.len(), 3);
    assert!(ids[0].ends_with("_first"));
    assert!(ids[1].ends_with("_second"));
    assert!(ids[2].ends_with("_third"));
    let stamps: Vec<&str> = ids.iter().map(|id| &id[..14]).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_unexecutable_steps_fail_without_writing() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        evaluation: DataLossEvaluation {
            migration_steps: 1,
            unexecutable_steps: vec![MigrationFeedback {
                message: "Added the required column `role` to the `User` table without a default value."
                    .into(),
                step_index: 0,
            }],
            ..Default::default()
        },
        ..TestEngine::with_script("ALTER TABLE \"User\" ADD COLUMN \"role\" TEXT NOT NULL;")
    };

    let (outcome, _) = run_dev(
        dir.path(),
        engine.clone(),
        named("role"),
        &mut ScriptedPrompt::non_interactive(),
        &mut RecordingHooks::seeding(SeedRun::NotConfigured),
    )
    .await;

    match outcome.unwrap_err() {
        MigrationError::UnexecutableMigration(steps) => {
            assert_eq!(steps.len(), 1);
            assert!(steps[0].contains("`role`"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(entry_ids(dir.path()).await.is_empty());
    assert_eq!(engine.state.lock().unwrap().created_scripts, 0);
    assert_eq!(engine.stops(), 1);
}

#[tokio::test]
async fn test_unexecutable_steps_allowed_for_drafts() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        evaluation: DataLossEvaluation {
            migration_steps: 1,
            unexecutable_steps: vec![MigrationFeedback {
                message: "Made the column `email` required.".into(),
                step_index: 0,
            }],
            ..Default::default()
        },
        ..TestEngine::with_script("ALTER TABLE \"User\" ALTER COLUMN \"email\" SET NOT NULL;")
    };
    let options = DevOptions {
        name: Some("email".into()),
        create_only: true,
        ..Default::default()
    };

    let (outcome, out) = run_dev(
        dir.path(),
        engine,
        options,
        &mut ScriptedPrompt::non_interactive(),
        &mut RecordingHooks::seeding(SeedRun::NotConfigured),
    )
    .await;

    assert_eq!(outcome.unwrap().exit_code(), 0);
    assert!(out.contains("Made the column `email` required."));
    assert_eq!(entry_ids(dir.path()).await.len(), 1);
}

#[tokio::test]
async fn test_warnings_need_a_terminal_or_force() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        evaluation: DataLossEvaluation {
            migration_steps: 1,
            warnings: vec![MigrationFeedback {
                message: "You are about to drop the `Post` table, which is not empty (3 rows)."
                    .into(),
                step_index: 0,
            }],
            ..Default::default()
        },
        ..TestEngine::with_script("DROP TABLE \"Post\";")
    };

    let (outcome, out) = run_dev(
        dir.path(),
        engine.clone(),
        named("drop posts"),
        &mut ScriptedPrompt::non_interactive(),
        &mut RecordingHooks::seeding(SeedRun::NotConfigured),
    )
    .await;

    assert!(matches!(
        outcome,
        Err(MigrationError::NonInteractiveConfirmationRequired)
    ));
    assert!(out.contains("Warnings for the current datasource"));
    assert!(out.contains("  • You are about to drop the `Post` table"));
    assert!(entry_ids(dir.path()).await.is_empty());
    assert_eq!(engine.stops(), 1);

    let forced = DevOptions {
        force: true,
        ..named("drop posts")
    };
    let (outcome, _) = run_dev(
        dir.path(),
        TestEngine {
            state: Arc::default(),
            ..engine
        },
        forced,
        &mut ScriptedPrompt::non_interactive(),
        &mut RecordingHooks::seeding(SeedRun::NotConfigured),
    )
    .await;
    assert_eq!(outcome.unwrap().exit_code(), 0);
    assert_eq!(entry_ids(dir.path()).await.len(), 1);
}

#[tokio::test]
async fn test_declined_confirmation_cancels() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        evaluation: DataLossEvaluation {
            migration_steps: 1,
            warnings: vec![MigrationFeedback {
                message: "You are about to drop the column `bio`.".into(),
                step_index: 0,
            }],
            ..Default::default()
        },
        ..TestEngine::with_script("ALTER TABLE \"User\" DROP COLUMN \"bio\";")
    };
    let mut prompt = ScriptedPrompt::answering(false, NameInput::Name("unused".into()));

    let (outcome, out) = run_dev(
        dir.path(),
        engine.clone(),
        DevOptions::default(),
        &mut prompt,
        &mut RecordingHooks::seeding(SeedRun::NotConfigured),
    )
    .await;

    let outcome = outcome.unwrap();
    assert_eq!(
        outcome,
        DevOutcome::Cancelled(Cancellation::ConfirmationDeclined)
    );
    assert_eq!(outcome.exit_code(), 130);
    assert_eq!(
        prompt.questions,
        vec!["Are you sure you want to create and apply this migration?"]
    );
    assert!(out.contains("Migration cancelled."));
    assert!(entry_ids(dir.path()).await.is_empty());
    assert_eq!(engine.stops(), 1);
}

#[tokio::test]
async fn test_cancelled_name_prompt() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine::with_script("CREATE TABLE a (id INT);");
    let mut prompt = ScriptedPrompt::answering(true, NameInput::Cancelled);

    let (outcome, out) = run_dev(
        dir.path(),
        engine.clone(),
        DevOptions::default(),
        &mut prompt,
        &mut RecordingHooks::seeding(SeedRun::NotConfigured),
    )
    .await;

    let outcome = outcome.unwrap();
    assert_eq!(outcome, DevOutcome::Cancelled(Cancellation::NamePromptCancelled));
    assert_eq!(outcome.exit_code(), 130);
    assert!(out.contains("Migration name prompt cancelled."));
    assert!(entry_ids(dir.path()).await.is_empty());
    assert_eq!(engine.stops(), 1);
}

#[tokio::test]
async fn test_prompted_name_is_used() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine::with_script("CREATE TABLE a (id INT);");
    let mut prompt = ScriptedPrompt::answering(true, NameInput::Name("Add Accounts".into()));

    let (outcome, _) = run_dev(
        dir.path(),
        engine,
        DevOptions::default(),
        &mut prompt,
        &mut RecordingHooks::seeding(SeedRun::NotConfigured),
    )
    .await;

    outcome.unwrap();
    assert_eq!(prompt.questions, vec!["name"]);
    let ids = entry_ids(dir.path()).await;
    assert_eq!(ids.len(), 1);
    assert!(ids[0].ends_with("_add_accounts"));
}

#[tokio::test]
async fn test_seed_failure_after_database_creation() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        created_database: true,
        ..TestEngine::with_script("CREATE TABLE a (id INT);")
    };
    let mut hooks = RecordingHooks::seeding(SeedRun::Failed("exit status: 1".into()));

    let (outcome, out) = run_dev(
        dir.path(),
        engine.clone(),
        named("init"),
        &mut ScriptedPrompt::non_interactive(),
        &mut hooks,
    )
    .await;

    let outcome = outcome.unwrap();
    assert_eq!(outcome.exit_code(), 1);
    let DevOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert!(report.database_created);
    assert_eq!(report.seed, SeedStatus::Failed("exit status: 1".into()));
    assert!(out.contains("PostgreSQL database app created at localhost:5432"));
    assert!(out.contains("An error occurred while running the seed command"));
    assert_eq!(hooks.seeded, 1);
    assert_eq!(engine.applied().len(), 1);
    assert_eq!(engine.stops(), 1);
}

#[tokio::test]
async fn test_seed_skipped_by_flag() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        created_database: true,
        ..TestEngine::with_script("CREATE TABLE a (id INT);")
    };
    let mut hooks = RecordingHooks::seeding(SeedRun::Succeeded);
    let options = DevOptions {
        skip_seed: true,
        skip_generate: true,
        ..named("init")
    };

    let (outcome, _) = run_dev(
        dir.path(),
        engine,
        options,
        &mut ScriptedPrompt::non_interactive(),
        &mut hooks,
    )
    .await;

    let DevOutcome::Completed(report) = outcome.unwrap() else {
        panic!("expected a completed run");
    };
    assert_eq!(report.generate, GenerateStatus::Skipped);
    assert_eq!(report.seed, SeedStatus::Skipped);
    assert_eq!(hooks.generated, 0);
    assert_eq!(hooks.seeded, 0);
}

async fn assert_transport_failure(method: &'static str) {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        broken_method: Some(method),
        created_database: true,
        ..TestEngine::with_script("CREATE TABLE a (id INT);")
    };
    let mut hooks = RecordingHooks::seeding(SeedRun::Succeeded);

    let (outcome, _) = run_dev(
        dir.path(),
        engine.clone(),
        named("init"),
        &mut ScriptedPrompt::non_interactive(),
        &mut hooks,
    )
    .await;

    match outcome.unwrap_err() {
        MigrationError::EngineQuery { method: failed, .. } => assert_eq!(failed, method),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(engine.stops(), 1);
    assert!(entry_ids(dir.path()).await.is_empty());
    assert_eq!(engine.state.lock().unwrap().created_scripts, 0);
    assert_eq!(hooks.generated, 0);
    assert_eq!(hooks.seeded, 0);
}

#[tokio::test]
async fn test_diagnostic_transport_failure_stops_once() {
    assert_transport_failure("devDiagnostic").await;
}

#[tokio::test]
async fn test_data_loss_transport_failure_stops_once() {
    assert_transport_failure("evaluateDataLoss").await;
}

#[tokio::test]
async fn test_stop_failure_keeps_completed_run() {
    let dir = TempDir::new().unwrap();
    let engine = TestEngine {
        fail_stop: true,
        ..TestEngine::with_script("CREATE TABLE a (id INT);")
    };
    let mut hooks = RecordingHooks::seeding(SeedRun::NotConfigured);

    let (outcome, out) = run_dev(
        dir.path(),
        engine.clone(),
        named("init"),
        &mut ScriptedPrompt::non_interactive(),
        &mut hooks,
    )
    .await;

    let outcome = outcome.unwrap();
    assert_eq!(outcome.exit_code(), 0);
    let DevOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    assert_eq!(report.applied.len(), 1);
    assert!(out.contains("have been created and applied from new schema changes"));
    assert_eq!(hooks.generated, 1);
    assert_eq!(engine.stops(), 1);
}
