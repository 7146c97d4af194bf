//! Pest grammar for Tessera schema files.

use pest_derive::Parser;

/// The Tessera schema parser.
#[derive(Parser)]
#[grammar = "parser/schema.pest"]
pub struct TesseraParser;
