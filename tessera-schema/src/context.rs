//! Schema context loading.
//!
//! A [`SchemaContext`] is everything a command needs to know about the
//! schema: the source files, the directory they live in, and the resolved
//! primary datasource. It is loaded once per command and never mutated.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::datasource::Datasource;
use crate::error::{SchemaError, SchemaResult};
use crate::parser::{BlockKind, ParsedSchema, parse_schema};

/// Schema file extension.
pub const SCHEMA_EXTENSION: &str = "tessera";

/// Default schema locations, relative to the working directory.
pub const DEFAULT_SCHEMA_PATHS: &[&str] = &["tessera/schema.tessera", "schema.tessera", "tessera/schema"];

/// A single schema source file.
#[derive(Debug, Clone)]
pub struct SchemaFile {
    /// Path of the file.
    pub path: PathBuf,
    /// Raw file content.
    pub content: String,
    /// Parsed top-level blocks.
    pub parsed: ParsedSchema,
}

/// Where to look for the schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaLookup {
    /// `--schema` argument.
    pub from_arg: Option<PathBuf>,
    /// `schema.path` from `tessera.toml`, already resolved against the config directory.
    pub from_config: Option<PathBuf>,
    /// Working directory.
    pub cwd: PathBuf,
}

/// The loaded schema of a command invocation.
#[derive(Debug, Clone)]
pub struct SchemaContext {
    /// All schema source files, sorted by path.
    pub schema_files: Vec<SchemaFile>,
    /// Path the schema was loaded from (file or directory).
    pub schema_path: PathBuf,
    /// Directory containing the schema; migrations default to a sibling folder.
    pub schema_root_dir: PathBuf,
    /// The datasource declared by the schema, if any.
    pub primary_datasource: Option<Datasource>,
}

impl SchemaContext {
    /// Build a context from already-read files.
    pub fn from_files(
        schema_path: impl Into<PathBuf>,
        files: Vec<(PathBuf, String)>,
        lookup_env: impl Fn(&str) -> Option<String>,
    ) -> SchemaResult<Self> {
        let schema_path = schema_path.into();
        let mut schema_files = Vec::with_capacity(files.len());
        for (path, content) in files {
            let parsed = parse_schema(&path.display().to_string(), &content)?;
            schema_files.push(SchemaFile {
                path,
                content,
                parsed,
            });
        }
        schema_files.sort_by(|a, b| a.path.cmp(&b.path));

        validate(&schema_files)?;

        let mut datasource = None;
        for file in &schema_files {
            if let Some(block) = file.parsed.blocks_of(BlockKind::Datasource).next() {
                datasource = Some(Datasource::from_block(block, &file.path, &lookup_env)?);
            }
        }

        let schema_root_dir = if schema_path.is_dir() {
            schema_path.clone()
        } else {
            schema_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default()
        };

        Ok(Self {
            schema_files,
            schema_path,
            schema_root_dir,
            primary_datasource: datasource,
        })
    }

    /// The primary datasource, or an error if the schema has none.
    pub fn require_datasource(&self) -> SchemaResult<&Datasource> {
        self.primary_datasource
            .as_ref()
            .ok_or(SchemaError::MissingDatasource)
    }

    /// `(path, content)` pairs for every schema file.
    pub fn sources(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.schema_files
            .iter()
            .map(|f| (f.path.as_path(), f.content.as_str()))
    }
}

/// Locate, read, parse and validate the schema.
pub fn load_schema_context(lookup: &SchemaLookup) -> SchemaResult<SchemaContext> {
    let schema_path = resolve_schema_path(lookup)?;
    debug!(schema = %schema_path.display(), "loading schema");

    let files = if schema_path.is_dir() {
        read_schema_dir(&schema_path)?
    } else {
        let content = std::fs::read_to_string(&schema_path)
            .map_err(|e| SchemaError::io(schema_path.display().to_string(), e))?;
        vec![(schema_path.clone(), content)]
    };

    SchemaContext::from_files(schema_path, files, |name| std::env::var(name).ok())
}

fn resolve_schema_path(lookup: &SchemaLookup) -> SchemaResult<PathBuf> {
    if let Some(path) = &lookup.from_arg {
        let path = lookup.cwd.join(path);
        return if path.exists() {
            Ok(path)
        } else {
            Err(SchemaError::SchemaNotFound {
                searched: vec![path.display().to_string()],
            })
        };
    }

    if let Some(path) = &lookup.from_config {
        return if path.exists() {
            Ok(path.clone())
        } else {
            Err(SchemaError::SchemaNotFound {
                searched: vec![path.display().to_string()],
            })
        };
    }

    DEFAULT_SCHEMA_PATHS
        .iter()
        .map(|p| lookup.cwd.join(p))
        .find(|p| p.exists())
        .ok_or_else(|| SchemaError::SchemaNotFound {
            searched: DEFAULT_SCHEMA_PATHS.iter().map(|p| p.to_string()).collect(),
        })
}

fn read_schema_dir(dir: &Path) -> SchemaResult<Vec<(PathBuf, String)>> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| SchemaError::io(dir.display().to_string(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| SchemaError::io(dir.display().to_string(), e))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SCHEMA_EXTENSION) {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| SchemaError::io(path.display().to_string(), e))?;
            files.push((path, content));
        }
    }

    if files.is_empty() {
        return Err(SchemaError::SchemaNotFound {
            searched: vec![format!("{}/*.{}", dir.display(), SCHEMA_EXTENSION)],
        });
    }

    Ok(files)
}

/// Cross-file validation: one datasource at most, unique block names.
fn validate(files: &[SchemaFile]) -> SchemaResult<()> {
    let mut errors = Vec::new();

    let datasource_count = files
        .iter()
        .map(|f| f.parsed.blocks_of(BlockKind::Datasource).count())
        .sum::<usize>();
    if datasource_count > 1 {
        errors.push(SchemaError::MultipleDatasources {
            count: datasource_count,
        });
    }

    let mut seen = HashSet::new();
    for block in files.iter().flat_map(|f| f.parsed.blocks.iter()) {
        // Models, enums, views and types share one namespace.
        let namespace = match block.kind {
            BlockKind::Datasource | BlockKind::Generator => block.kind.as_str(),
            _ => "definition",
        };
        if !seen.insert((namespace, block.name.as_str())) {
            errors.push(SchemaError::duplicate(block.kind.as_str(), &block.name));
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        count => Err(SchemaError::ValidationFailed { count, errors }),
    }
}
