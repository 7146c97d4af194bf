//! Parser for `.tessera` schema files.
//!
//! Only the shape of the top-level blocks is parsed here. Datasource and
//! generator properties are exposed as [`Expr`] values; model and enum
//! bodies are kept as raw text for the schema engine.

mod grammar;

use indexmap::IndexMap;
use pest::Parser;
use pest::iterators::Pair;

use crate::error::{SchemaError, SchemaResult};

pub use grammar::{Rule, TesseraParser};

/// Kind of a top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `datasource <name> { ... }`
    Datasource,
    /// `generator <name> { ... }`
    Generator,
    /// `model <Name> { ... }`
    Model,
    /// `enum <Name> { ... }`
    Enum,
    /// `view <Name> { ... }`
    View,
    /// `type <Name> { ... }`
    Type,
}

impl BlockKind {
    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "datasource" => Self::Datasource,
            "generator" => Self::Generator,
            "model" => Self::Model,
            "enum" => Self::Enum,
            "view" => Self::View,
            _ => Self::Type,
        }
    }

    /// Get the keyword for this block kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Datasource => "datasource",
            Self::Generator => "generator",
            Self::Model => "model",
            Self::Enum => "enum",
            Self::View => "view",
            Self::Type => "type",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value inside a datasource or generator block.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A string literal.
    String(String),
    /// A numeric literal, kept as written.
    Number(String),
    /// `true` / `false`.
    Boolean(bool),
    /// A bare identifier.
    Ident(String),
    /// `[a, b, c]`
    Array(Vec<Expr>),
    /// `name(args...)`, e.g. `env("DATABASE_URL")`.
    Function(String, Vec<Expr>),
}

impl Expr {
    /// Get the value as a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the argument of an `env("...")` call.
    pub fn as_env_var(&self) -> Option<&str> {
        match self {
            Self::Function(name, args) if name == "env" => args.first().and_then(Expr::as_str),
            _ => None,
        }
    }
}

/// A parsed top-level block.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block kind.
    pub kind: BlockKind,
    /// Block name.
    pub name: String,
    /// Properties of config blocks, in declaration order.
    pub properties: IndexMap<String, Expr>,
    /// Raw body of definition blocks.
    pub body: Option<String>,
    /// Byte offset of the block in its file.
    pub offset: usize,
}

impl Block {
    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&Expr> {
        self.properties.get(name)
    }

    /// Human readable label, e.g. `datasource db`.
    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.name)
    }
}

/// The blocks of one schema file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSchema {
    /// Blocks in declaration order.
    pub blocks: Vec<Block>,
}

impl ParsedSchema {
    /// Iterate over blocks of a given kind.
    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }
}

/// Parse a schema file.
///
/// `path` is only used for error reporting.
pub fn parse_schema(path: &str, input: &str) -> SchemaResult<ParsedSchema> {
    let mut pairs = TesseraParser::parse(Rule::schema, input).map_err(|e| {
        let (offset, len) = match e.location {
            pest::error::InputLocation::Pos(pos) => (pos, 0),
            pest::error::InputLocation::Span((start, end)) => (start, end - start),
        };
        SchemaError::syntax(path, input, offset, len, e.variant.message().to_string())
    })?;

    let mut schema = ParsedSchema::default();
    let Some(root) = pairs.next() else {
        return Ok(schema);
    };

    for pair in root.into_inner() {
        match pair.as_rule() {
            Rule::config_block => schema.blocks.push(parse_config_block(pair)?),
            Rule::definition_block => schema.blocks.push(parse_definition_block(pair)),
            _ => {}
        }
    }

    Ok(schema)
}

fn parse_config_block(pair: Pair<'_, Rule>) -> SchemaResult<Block> {
    let offset = pair.as_span().start();
    let mut inner = pair.into_inner();

    let kind = inner
        .next()
        .map(|p| BlockKind::from_keyword(p.as_str()))
        .unwrap_or(BlockKind::Datasource);
    let name = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();

    let mut properties = IndexMap::new();
    for property in inner {
        let mut parts = property.into_inner();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let key = key.as_str().to_string();
        if properties.contains_key(&key) {
            return Err(SchemaError::duplicate(
                format!("property in {kind} {name}"),
                key,
            ));
        }
        properties.insert(key, parse_expr(value));
    }

    Ok(Block {
        kind,
        name,
        properties,
        body: None,
        offset,
    })
}

fn parse_definition_block(pair: Pair<'_, Rule>) -> Block {
    let offset = pair.as_span().start();
    let mut inner = pair.into_inner();

    let kind = inner
        .next()
        .map(|p| BlockKind::from_keyword(p.as_str()))
        .unwrap_or(BlockKind::Model);
    let name = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();
    let body = inner
        .next()
        .and_then(|b| b.into_inner().next())
        .map(|c| c.as_str().trim().to_string());

    Block {
        kind,
        name,
        properties: IndexMap::new(),
        body,
        offset,
    }
}

fn parse_expr(pair: Pair<'_, Rule>) -> Expr {
    match pair.as_rule() {
        Rule::string_literal => Expr::String(unescape(
            pair.into_inner().next().map(|p| p.as_str()).unwrap_or(""),
        )),
        Rule::number => Expr::Number(pair.as_str().to_string()),
        Rule::boolean => Expr::Boolean(pair.as_str() == "true"),
        Rule::array => Expr::Array(pair.into_inner().map(parse_expr).collect()),
        Rule::function_call => {
            let mut inner = pair.into_inner();
            let name = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();
            Expr::Function(name, inner.map(parse_expr).collect())
        }
        _ => Expr::Ident(pair.as_str().to_string()),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
