//! rolekit core
//!
//! Document model and parsers for agent and tool definition files.
//!
//! The built-in parser reads a YAML subset: `key: value` mappings, `- `
//! sequences, typed scalars and `#` line comments, with indentation as the
//! only structural signal. When the `yaml-library` feature is enabled a
//! `serde_yaml` backend is available behind the same [`DocumentParser`]
//! interface.

pub mod backend;
pub mod emit;
pub mod error;
pub mod node;
pub mod parser;
pub mod scalar;
pub mod token;

pub use backend::{BuiltinParser, DocumentParser, ParserKind};
#[cfg(feature = "yaml-library")]
pub use backend::LibraryParser;
pub use emit::emit;
pub use error::{EmitError, ParseError, Result};
pub use node::{Mapping, Node, Scalar};
pub use parser::{parse_document, parse_mapping, parse_sequence, Parser, MAX_DEPTH};
pub use scalar::interpret_scalar;
pub use token::{tokenize, Token, TokenCursor};
