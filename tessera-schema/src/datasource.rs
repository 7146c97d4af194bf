//! Datasource resolution.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::parser::{Block, Expr};

/// Database provider of a datasource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// PostgreSQL.
    #[serde(alias = "postgres")]
    PostgreSql,
    /// CockroachDB.
    CockroachDb,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server.
    SqlServer,
    /// MongoDB.
    MongoDb,
}

impl Provider {
    /// Parse a provider from its schema name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Some(Self::PostgreSql),
            "cockroachdb" => Some(Self::CockroachDb),
            "mysql" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            "sqlserver" => Some(Self::SqlServer),
            "mongodb" => Some(Self::MongoDb),
            _ => None,
        }
    }

    /// Get the provider as written in schema files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::CockroachDb => "cockroachdb",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::SqlServer => "sqlserver",
            Self::MongoDb => "mongodb",
        }
    }

    /// Display name used in user-facing messages.
    pub fn pretty_name(&self) -> &'static str {
        match self {
            Self::PostgreSql => "PostgreSQL",
            Self::CockroachDb => "CockroachDB",
            Self::MySql => "MySQL",
            Self::Sqlite => "SQLite",
            Self::SqlServer => "SQL Server",
            Self::MongoDb => "MongoDB",
        }
    }

    /// Whether the provider groups tables into named schemas.
    pub fn has_schemas(&self) -> bool {
        matches!(self, Self::PostgreSql | Self::CockroachDb | Self::SqlServer)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved datasource block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasource {
    /// Block name, e.g. `db`.
    pub name: String,
    /// Database provider.
    pub provider: Provider,
    /// Connection URL, with `env("...")` resolved.
    pub url: Option<String>,
    /// Direct connection URL, bypassing poolers.
    pub direct_url: Option<String>,
    /// Shadow database URL used for diffing.
    pub shadow_database_url: Option<String>,
    /// Explicit list of database schemas.
    pub schemas: Vec<String>,
    /// File the block was declared in.
    pub source_file: PathBuf,
}

impl Datasource {
    /// Resolve a datasource from its parsed block.
    ///
    /// `lookup_env` resolves `env("...")` references.
    pub fn from_block(
        block: &Block,
        source_file: impl Into<PathBuf>,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> SchemaResult<Self> {
        let label = block.label();

        let provider_raw = block
            .property("provider")
            .ok_or_else(|| SchemaError::invalid_property(&label, "provider", "is required"))?
            .as_str()
            .ok_or_else(|| {
                SchemaError::invalid_property(&label, "provider", "expected a string literal")
            })?;
        let provider = Provider::from_str(provider_raw).ok_or_else(|| SchemaError::UnknownProvider {
            provider: provider_raw.to_string(),
        })?;

        let resolve = |key: &str| -> SchemaResult<Option<String>> {
            match block.property(key) {
                None => Ok(None),
                Some(Expr::String(s)) => Ok(Some(s.clone())),
                Some(expr) => match expr.as_env_var() {
                    Some(var) => lookup_env(var)
                        .map(Some)
                        .ok_or_else(|| SchemaError::EnvVarNotFound {
                            name: var.to_string(),
                        }),
                    None => Err(SchemaError::invalid_property(
                        &label,
                        key,
                        "expected a string or env(\"...\")",
                    )),
                },
            }
        };

        let url = resolve("url")?;
        let direct_url = resolve("directUrl")?;
        let shadow_database_url = resolve("shadowDatabaseUrl")?;

        let schemas = match block.property("schemas") {
            None => Vec::new(),
            Some(Expr::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        SchemaError::invalid_property(&label, "schemas", "expected string items")
                    })
                })
                .collect::<SchemaResult<Vec<_>>>()?,
            Some(_) => {
                return Err(SchemaError::invalid_property(
                    &label,
                    "schemas",
                    "expected an array",
                ));
            }
        };

        Ok(Self {
            name: block.name.clone(),
            provider,
            url,
            direct_url,
            shadow_database_url,
            schemas,
            source_file: source_file.into(),
        })
    }

    /// The URL migrations should connect with.
    pub fn effective_url(&self) -> Option<&str> {
        self.direct_url.as_deref().or(self.url.as_deref())
    }
}
