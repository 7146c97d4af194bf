//! Error types for schema loading and configuration.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while loading a schema context.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(tessera::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Syntax error in a schema file.
    #[error("syntax error in {path}: {message}")]
    #[diagnostic(code(tessera::schema::syntax_error))]
    SyntaxError {
        path: String,
        #[source_code]
        src: String,
        #[label("error here")]
        span: miette::SourceSpan,
        message: String,
    },

    /// No schema file could be found.
    #[error("could not find a schema file, checked: {}", searched.join(", "))]
    #[diagnostic(
        code(tessera::schema::not_found),
        help("pass --schema <path> or set `schema.path` in tessera.toml")
    )]
    SchemaNotFound { searched: Vec<String> },

    /// The schema declares no datasource.
    #[error("the schema does not declare a datasource")]
    #[diagnostic(code(tessera::schema::missing_datasource))]
    MissingDatasource,

    /// More than one datasource block.
    #[error("only one datasource is allowed, found {count}")]
    #[diagnostic(code(tessera::schema::multiple_datasources))]
    MultipleDatasources { count: usize },

    /// Unsupported datasource provider.
    #[error("unknown datasource provider `{provider}`")]
    #[diagnostic(
        code(tessera::schema::unknown_provider),
        help("supported providers: postgresql, mysql, sqlite, sqlserver, cockroachdb, mongodb")
    )]
    UnknownProvider { provider: String },

    /// An `env("...")` reference could not be resolved.
    #[error("environment variable not found: {name}")]
    #[diagnostic(code(tessera::schema::env_var_not_found))]
    EnvVarNotFound { name: String },

    /// A block property has the wrong shape.
    #[error("invalid property `{property}` in {block}: {message}")]
    #[diagnostic(code(tessera::schema::invalid_property))]
    InvalidProperty {
        block: String,
        property: String,
        message: String,
    },

    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(tessera::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(tessera::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Validation error with multiple issues.
    #[error("schema validation failed with {count} error(s)")]
    #[diagnostic(code(tessera::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create a syntax error with source location.
    pub fn syntax(
        path: impl Into<String>,
        src: impl Into<String>,
        offset: usize,
        len: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::SyntaxError {
            path: path.into(),
            src: src.into(),
            span: (offset, len).into(),
            message: message.into(),
        }
    }

    /// Create an invalid property error.
    pub fn invalid_property(
        block: impl Into<String>,
        property: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidProperty {
            block: block.into(),
            property: property.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an I/O error for a path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}
