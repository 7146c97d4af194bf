//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tessera_migrate::DevOptions;

/// Tessera CLI - schema-driven migrations
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(version)]
#[command(about = "Tessera CLI - schema-driven migrations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Database migration commands
    Migrate(MigrateArgs),

    /// Direct database operations
    Db(DbArgs),
}

/// Options shared by every command that loads the project.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Path to the schema file or directory
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Path to tessera.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

// =============================================================================
// Migrate Command
// =============================================================================

/// Arguments for the `migrate` command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateSubcommand,
}

/// Migrate subcommands
#[derive(Subcommand, Debug)]
pub enum MigrateSubcommand {
    /// Create a migration from schema changes, apply it to the development database
    Dev(MigrateDevArgs),

    /// Apply pending migrations to the database
    Deploy(MigrateDeployArgs),

    /// Reset the development database and re-apply all migrations
    Reset(MigrateResetArgs),

    /// Show which migrations are applied and which are pending
    Status(MigrateStatusArgs),
}

/// Arguments for `migrate dev`
#[derive(Args, Debug)]
pub struct MigrateDevArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Name the migration
    #[arg(short, long)]
    pub name: Option<String>,

    /// Create a new migration but do not apply it
    #[arg(long)]
    pub create_only: bool,

    /// Skip confirmation of data loss warnings
    #[arg(short, long)]
    pub force: bool,

    /// Skip triggering generators
    #[arg(long, env = "TESSERA_MIGRATE_SKIP_GENERATE", value_parser = clap::builder::FalseyValueParser::new())]
    pub skip_generate: bool,

    /// Skip triggering seed
    #[arg(long, env = "TESSERA_MIGRATE_SKIP_SEED", value_parser = clap::builder::FalseyValueParser::new())]
    pub skip_seed: bool,
}

impl From<MigrateDevArgs> for DevOptions {
    fn from(args: MigrateDevArgs) -> Self {
        Self {
            name: args.name,
            create_only: args.create_only,
            force: args.force,
            skip_generate: args.skip_generate,
            skip_seed: args.skip_seed,
        }
    }
}

/// Arguments for `migrate deploy`
#[derive(Args, Debug)]
pub struct MigrateDeployArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

/// Arguments for `migrate reset`
#[derive(Args, Debug)]
pub struct MigrateResetArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Skip triggering generators
    #[arg(long, env = "TESSERA_MIGRATE_SKIP_GENERATE", value_parser = clap::builder::FalseyValueParser::new())]
    pub skip_generate: bool,

    /// Skip triggering seed
    #[arg(long, env = "TESSERA_MIGRATE_SKIP_SEED", value_parser = clap::builder::FalseyValueParser::new())]
    pub skip_seed: bool,
}

/// Arguments for `migrate status`
#[derive(Args, Debug)]
pub struct MigrateStatusArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

// =============================================================================
// Db Command
// =============================================================================

/// Arguments for the `db` command
#[derive(Args, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbSubcommand,
}

/// Db subcommands
#[derive(Subcommand, Debug)]
pub enum DbSubcommand {
    /// Introspect the database and update the schema
    Pull(DbPullArgs),
}

/// Arguments for `db pull`
#[derive(Args, Debug)]
pub struct DbPullArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Print the schema instead of writing it
    #[arg(long)]
    pub print: bool,

    /// Overwrite the schema without keeping manual changes
    #[arg(short, long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_migrate_dev() {
        let cli = Cli::try_parse_from([
            "tessera",
            "migrate",
            "dev",
            "-n",
            "add users",
            "--create-only",
            "--schema",
            "db/schema.tessera",
        ])
        .unwrap();

        let Command::Migrate(MigrateArgs {
            command: MigrateSubcommand::Dev(args),
        }) = cli.command
        else {
            panic!("expected migrate dev");
        };
        assert_eq!(args.name.as_deref(), Some("add users"));
        assert!(args.create_only);
        assert!(!args.force);
        assert_eq!(
            args.project.schema,
            Some(PathBuf::from("db/schema.tessera"))
        );
    }

    #[test]
    fn test_dev_args_into_options() {
        let cli = Cli::try_parse_from([
            "tessera",
            "migrate",
            "dev",
            "--name",
            "init",
            "-f",
            "--skip-generate",
            "--skip-seed",
        ])
        .unwrap();

        let Command::Migrate(MigrateArgs {
            command: MigrateSubcommand::Dev(args),
        }) = cli.command
        else {
            panic!("expected migrate dev");
        };
        assert_eq!(
            DevOptions::from(args),
            DevOptions {
                name: Some("init".into()),
                create_only: false,
                force: true,
                skip_generate: true,
                skip_seed: true,
            }
        );
    }
}
