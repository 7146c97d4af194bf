//! Configuration file parsing for `tessera.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::SchemaContext;
use crate::error::{SchemaError, SchemaResult};

/// Default config file name (lives in project root).
pub const CONFIG_FILE_NAME: &str = "tessera.toml";

/// Main configuration structure for `tessera.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TesseraConfig {
    /// Schema location.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Migration settings.
    #[serde(default)]
    pub migrations: MigrationsConfig,

    /// Schema engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Tables managed outside of migrations.
    #[serde(default)]
    pub tables: ExternalConfig,

    /// Enums managed outside of migrations.
    #[serde(default)]
    pub enums: ExternalConfig,

    /// Generator settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Seeding settings.
    #[serde(default)]
    pub seed: SeedConfig,
}

impl TesseraConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::io(path.display().to_string(), e))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);

        toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })
    }

    /// Load `tessera.toml` from an explicit path, or from `cwd` if present.
    ///
    /// Returns the loaded config and the directory relative paths resolve
    /// against.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> SchemaResult<(Self, PathBuf)> {
        if let Some(path) = explicit {
            let path = cwd.join(path);
            let base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.to_path_buf());
            tracing::debug!(config = %path.display(), "loading explicit config");
            return Ok((Self::from_file(&path)?, base));
        }

        let default_path = cwd.join(CONFIG_FILE_NAME);
        if default_path.exists() {
            tracing::debug!(config = %default_path.display(), "loading config");
            Ok((Self::from_file(&default_path)?, cwd.to_path_buf()))
        } else {
            Ok((Self::default(), cwd.to_path_buf()))
        }
    }

    /// Resolve the migrations directory.
    ///
    /// An explicit `migrations.directory` wins; otherwise migrations live in
    /// a `migrations` folder next to the schema.
    pub fn migrations_dir(&self, base: &Path, context: &SchemaContext) -> PathBuf {
        match &self.migrations.directory {
            Some(dir) => base.join(dir),
            None => context.schema_root_dir.join("migrations"),
        }
    }
}

/// Schema file configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Path to the schema file or directory.
    pub path: Option<String>,
}

/// Migration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Migration files directory.
    pub directory: Option<String>,

    /// SQL run against a fresh shadow database before migrations replay.
    pub init_shadow_db: Option<String>,
}

/// Schema engine configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Path to the schema engine binary.
    pub binary: Option<String>,

    /// Driver adapter the engine should connect through.
    pub adapter: Option<String>,
}

/// Externally managed objects.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalConfig {
    /// Names the engine must neither create nor drop.
    #[serde(default)]
    pub external: Vec<String>,
}

/// Generator configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Shell command that regenerates the client.
    pub command: Option<String>,
}

/// Seed configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    /// Shell command that seeds a freshly created database.
    pub command: Option<String>,
}

/// Expand environment variables in the format `${VAR_NAME}`.
fn expand_env_vars(content: &str) -> String {
    static ENV_VAR: std::sync::OnceLock<regex_lite::Regex> = std::sync::OnceLock::new();
    let re = ENV_VAR.get_or_init(|| {
        regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
    });

    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TesseraConfig::default();
        assert!(config.schema.path.is_none());
        assert!(config.migrations.directory.is_none());
        assert!(config.tables.external.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [schema]
            path = "db/schema.tessera"

            [migrations]
            directory = "db/migrations"
            init_shadow_db = "CREATE EXTENSION IF NOT EXISTS citext;"

            [engine]
            binary = "./bin/tessera-schema-engine"

            [tables]
            external = ["audit_log"]

            [enums]
            external = ["mood"]

            [generator]
            command = "cargo run -p client-gen"

            [seed]
            command = "cargo run --bin seed"
        "#;

        let config = TesseraConfig::from_str(toml).unwrap();
        assert_eq!(config.schema.path.as_deref(), Some("db/schema.tessera"));
        assert_eq!(config.migrations.directory.as_deref(), Some("db/migrations"));
        assert_eq!(config.tables.external, vec!["audit_log"]);
        assert_eq!(config.enums.external, vec!["mood"]);
        assert_eq!(config.seed.command.as_deref(), Some("cargo run --bin seed"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = TesseraConfig::from_str("[migrations]\ntable = \"x\"").unwrap_err();
        assert!(matches!(err, SchemaError::TomlError { .. }));
    }

    #[test]
    fn test_unset_env_var_is_left_alone() {
        let expanded = expand_env_vars("command = \"${TESSERA_TEST_SURELY_UNSET}\"");
        assert_eq!(expanded, "command = \"${TESSERA_TEST_SURELY_UNSET}\"");
    }

    #[test]
    fn test_discover_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, base) = TesseraConfig::discover(None, dir.path()).unwrap();
        assert!(config.engine.binary.is_none());
        assert_eq!(base, dir.path());
    }
}
