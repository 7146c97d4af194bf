//! `tessera migrate` commands - Database migration management.

use tessera_migrate::datasource_info::{
    format_datasource, format_migration_tree, parse_datasource_info, reset_message,
};
use tessera_migrate::dev::EXIT_CANCELLED;
use tessera_migrate::{
    AppliedMigrations, DevOptions, JsonRpcEngine, Migrate, MigrateDev, MigrateResult,
    MigrationError, PostMigrateHooks, SeedRun,
};

use crate::cli::{
    MigrateArgs, MigrateDeployArgs, MigrateDevArgs, MigrateResetArgs, MigrateStatusArgs,
    MigrateSubcommand,
};
use crate::error::CliResult;
use crate::output::{self, success, warn};
use crate::project::Project;
use crate::prompt::{TerminalPrompt, can_prompt};

/// Run the migrate command
pub async fn run(args: MigrateArgs) -> CliResult<i32> {
    match args.command {
        MigrateSubcommand::Dev(dev_args) => run_dev(dev_args).await,
        MigrateSubcommand::Deploy(deploy_args) => run_deploy(deploy_args).await,
        MigrateSubcommand::Reset(reset_args) => run_reset(reset_args).await,
        MigrateSubcommand::Status(status_args) => run_status(status_args).await,
    }
}

fn print_target(project: &Project) {
    output::dim(&format!(
        "Schema loaded from {}",
        project.context.schema_path.display()
    ));
    let info = parse_datasource_info(project.context.primary_datasource.as_ref());
    if let Some(line) = format_datasource(&info, project.config.engine.adapter.as_deref()) {
        println!("{line}");
    }
    output::newline();
}

/// Run `tessera migrate dev` - development migration workflow
async fn run_dev(args: MigrateDevArgs) -> CliResult<i32> {
    let project = Project::load(&args.project)?;
    print_target(&project);

    let options = DevOptions::from(args);
    let mut migrate = project.start().await?;
    let mut prompt = TerminalPrompt::detect();
    let mut hooks = project.hooks();
    let mut stdout = std::io::stdout();

    let outcome = MigrateDev::new(options, &mut stdout, &mut prompt, &mut hooks)
        .migrations_label(project.migrations_label())
        .run(&mut migrate)
        .await?;

    Ok(outcome.exit_code())
}

/// Run `tessera migrate deploy` - apply pending migrations
async fn run_deploy(args: MigrateDeployArgs) -> CliResult<i32> {
    let project = Project::load(&args.project)?;
    print_target(&project);

    let mut migrate = project.start().await?;
    let result = deploy(&mut migrate, &project).await;
    let applied = migrate.finish(result).await?;

    if applied.applied_migration_names.is_empty() {
        output::info("No pending migrations to apply.");
    } else {
        println!(
            "The following migration(s) have been applied:\n\n{}",
            format_migration_tree(&project.migrations_label(), &applied.applied_migration_names)
        );
        success("All migrations have been successfully applied.");
    }
    Ok(0)
}

async fn deploy(
    migrate: &mut Migrate<JsonRpcEngine>,
    project: &Project,
) -> MigrateResult<AppliedMigrations> {
    let entries = migrate.store().list_entries().await?;
    println!(
        "{} migration{} found in {}",
        entries.len(),
        if entries.len() == 1 { "" } else { "s" },
        project.migrations_label()
    );
    output::newline();
    migrate.apply_migrations().await
}

/// Run `tessera migrate reset` - drop the development database and re-apply migrations
async fn run_reset(args: MigrateResetArgs) -> CliResult<i32> {
    let project = Project::load(&args.project)?;
    print_target(&project);

    if !args.force {
        if !can_prompt() {
            return Err(MigrationError::NonInteractiveConfirmationRequired.into());
        }
        let info = parse_datasource_info(project.context.primary_datasource.as_ref());
        println!("{}", reset_message(&info));
        let confirmed = output::confirm("Are you sure you want to reset your database? All data will be lost.")
            .unwrap_or(false);
        if !confirmed {
            println!("Reset cancelled.");
            return Ok(EXIT_CANCELLED);
        }
    }

    let mut migrate = project.start().await?;
    let result = reset(&mut migrate).await;
    let applied = migrate.finish(result).await?;

    output::newline();
    success("Database reset successful");
    if !applied.applied_migration_names.is_empty() {
        println!(
            "\nThe following migration(s) have been applied:\n\n{}",
            format_migration_tree(&project.migrations_label(), &applied.applied_migration_names)
        );
    }

    let mut hooks = project.hooks();
    if !args.skip_generate {
        let info = migrate.datasource_info();
        if let Err(e) = hooks.generate(&info).await {
            warn(&e.to_string());
        }
    }

    if !args.skip_seed {
        match hooks.seed().await? {
            SeedRun::NotConfigured => {}
            SeedRun::Succeeded => println!("\n🌱  The seed command has been executed."),
            SeedRun::Failed(message) => {
                output::error(&format!("An error occurred while running the seed command:\n{message}"));
                return Ok(1);
            }
        }
    }

    Ok(0)
}

async fn reset(migrate: &mut Migrate<JsonRpcEngine>) -> MigrateResult<AppliedMigrations> {
    migrate.reset().await?;
    migrate.apply_migrations().await
}

/// Run `tessera migrate status` - compare the migrations directory with the database
async fn run_status(args: MigrateStatusArgs) -> CliResult<i32> {
    let project = Project::load(&args.project)?;
    print_target(&project);

    let mut migrate = project.start().await?;
    let result = migrate.migration_status().await;
    let status = migrate.finish(result).await?;

    let total = status.applied.len() + status.pending.len();
    println!(
        "{} migration{} found in {}",
        total,
        if total == 1 { "" } else { "s" },
        project.migrations_label()
    );
    output::newline();

    for id in &status.applied {
        println!("  {} {}", output::style_success("applied"), id);
    }
    for id in &status.pending {
        println!("  {} {}", output::style_pending("pending"), id);
    }

    if !status.unpersisted.is_empty() {
        output::newline();
        warn("The following migrations are applied to the database but missing locally:");
        for id in &status.unpersisted {
            output::list_item(id);
        }
    }
    if !status.failed.is_empty() {
        output::newline();
        warn("The following migrations failed to apply:");
        for id in &status.failed {
            output::list_item(&output::style_error(id));
        }
    }
    if !status.edited.is_empty() {
        output::newline();
        warn("The following migrations were modified after they were applied:");
        for id in &status.edited {
            output::list_item(id);
        }
    }

    output::newline();
    if status.is_up_to_date() {
        success("Database schema is up to date!");
        Ok(0)
    } else {
        if !status.pending.is_empty() {
            output::info("Run `tessera migrate deploy` to apply pending migrations.");
        }
        Ok(1)
    }
}
