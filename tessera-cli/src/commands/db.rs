//! `tessera db` commands - Direct database operations.

use crate::cli::{DbArgs, DbPullArgs, DbSubcommand};
use crate::error::CliResult;
use crate::output::{self, success, warn};
use crate::project::Project;

/// Run the db command
pub async fn run(args: DbArgs) -> CliResult<i32> {
    match args.command {
        DbSubcommand::Pull(pull_args) => run_pull(pull_args).await,
    }
}

/// Run `tessera db pull` - introspect the database into the schema
async fn run_pull(args: DbPullArgs) -> CliResult<i32> {
    let project = Project::load(&args.project)?;
    if !args.print {
        output::dim(&format!(
            "Schema loaded from {}",
            project.context.schema_path.display()
        ));
        output::info("Introspecting based on datasource defined in the schema");
    }

    let mut migrate = project.start().await?;
    let result = migrate.introspect(args.force).await;
    let introspected = migrate.finish(result).await?;

    if !introspected.warnings.is_empty() {
        output::newline();
        for warning in &introspected.warnings {
            warn(warning);
        }
    }

    if args.print {
        for file in &introspected.schema.files {
            if introspected.schema.files.len() > 1 {
                println!("// {}", file.path);
            }
            println!("{}", file.content);
        }
        return Ok(0);
    }

    for file in &introspected.schema.files {
        let path = project.cwd.join(&file.path);
        tokio::fs::write(&path, &file.content).await?;
        output::kv("Wrote", &path.display().to_string());
    }

    output::newline();
    success("Introspected the database and updated the schema");
    Ok(0)
}
