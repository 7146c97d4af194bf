//! Project loading shared by all commands.

use std::path::{Path, PathBuf};

use tessera_migrate::{EngineOptions, JsonRpcEngine, Migrate, MigrateOptions, SchemaFilter};
use tessera_schema::{SchemaContext, SchemaLookup, TesseraConfig, load_schema_context};
use tracing::debug;

use crate::cli::ProjectArgs;
use crate::error::CliResult;
use crate::hooks::CommandHooks;

/// Environment variable overriding the engine binary.
pub const ENGINE_BINARY_ENV: &str = "TESSERA_SCHEMA_ENGINE_BINARY";

/// Engine binary used when nothing else is configured.
pub const DEFAULT_ENGINE_BINARY: &str = "tessera-schema-engine";

/// A loaded project: config, schema and migrations directory.
#[derive(Debug)]
pub struct Project {
    /// Working directory.
    pub cwd: PathBuf,
    /// Directory `tessera.toml` paths are relative to.
    pub base_dir: PathBuf,
    /// Parsed configuration.
    pub config: TesseraConfig,
    /// Loaded schema.
    pub context: SchemaContext,
    /// Resolved migrations directory.
    pub migrations_dir: PathBuf,
}

impl Project {
    /// Load `.env`, the config and the schema.
    pub fn load(args: &ProjectArgs) -> CliResult<Self> {
        let cwd = std::env::current_dir()?;
        load_env_file(&cwd.join(".env"));

        let (config, base_dir) = TesseraConfig::discover(args.config.as_deref(), &cwd)?;
        let from_arg = args.schema.clone();
        let from_config = config.schema.path.as_ref().map(|p| base_dir.join(p));

        if let Some(schema_dir) = from_arg
            .as_ref()
            .map(|p| cwd.join(p))
            .or_else(|| from_config.clone())
            .and_then(|p| p.parent().map(Path::to_path_buf))
        {
            load_env_file(&schema_dir.join(".env"));
        }

        let context = load_schema_context(&SchemaLookup {
            from_arg,
            from_config,
            cwd: cwd.clone(),
        })?;
        let migrations_dir = config.migrations_dir(&base_dir, &context);

        debug!(
            schema = %context.schema_path.display(),
            migrations = %migrations_dir.display(),
            "project loaded"
        );

        Ok(Self {
            cwd,
            base_dir,
            config,
            context,
            migrations_dir,
        })
    }

    /// How to start the schema engine.
    pub fn engine_options(&self) -> EngineOptions {
        let binary = match &self.config.engine.binary {
            Some(binary) => self.base_dir.join(binary),
            None => std::env::var_os(ENGINE_BINARY_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE_BINARY)),
        };

        EngineOptions {
            binary,
            schema_paths: self
                .context
                .schema_files
                .iter()
                .map(|f| f.path.clone())
                .collect(),
            adapter: self.config.engine.adapter.clone(),
            working_dir: Some(self.cwd.clone()),
        }
    }

    /// Options for [`Migrate::setup`].
    pub fn migrate_options(&self) -> MigrateOptions {
        MigrateOptions::new(self.context.clone(), &self.migrations_dir)
            .adapter(self.config.engine.adapter.clone())
            .schema_filter(SchemaFilter {
                external_tables: self.config.tables.external.clone(),
                external_enums: self.config.enums.external.clone(),
            })
            .shadow_db_init_script(self.config.migrations.init_shadow_db.clone())
    }

    /// Start the engine and set up a migration session.
    pub async fn start(&self) -> CliResult<Migrate<JsonRpcEngine>> {
        let engine = JsonRpcEngine::spawn(self.engine_options()).await?;
        Ok(Migrate::setup(self.migrate_options(), engine).await?)
    }

    /// Generator and seed hooks from the config.
    pub fn hooks(&self) -> CommandHooks {
        CommandHooks::new(
            self.config.generator.command.clone(),
            self.config.seed.command.clone(),
            &self.cwd,
        )
    }

    /// Migrations directory relative to the working directory, for display.
    pub fn migrations_label(&self) -> String {
        self.migrations_dir
            .strip_prefix(&self.cwd)
            .unwrap_or(&self.migrations_dir)
            .display()
            .to_string()
    }
}

fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not load environment file"),
    }
}
