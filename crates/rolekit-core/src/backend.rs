//! Parser backends
//!
//! Definition files are read either by the built-in subset parser or by
//! `serde_yaml` when the `yaml-library` feature is compiled in. The choice is
//! made once through [`ParserKind`] and used uniformly afterwards.

use crate::error::Result;
use crate::node::Mapping;
use crate::parser::parse_document;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Strategy for turning definition text into a document
pub trait DocumentParser: Send + Sync {
    /// Backend actually in use
    fn kind(&self) -> ParserKind;

    /// Parse text into the root mapping of a document
    fn parse(&self, text: &str) -> Result<Mapping>;
}

/// Capability flag selecting a parser backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// Library-backed when available, built-in otherwise
    #[default]
    Auto,
    Builtin,
    Library,
}

impl ParserKind {
    /// Whether the library-backed parser was compiled in
    pub const fn library_available() -> bool {
        cfg!(feature = "yaml-library")
    }

    /// Resolve `Auto` and unavailable backends to a concrete one
    pub fn resolve(self) -> ParserKind {
        match self {
            ParserKind::Auto if Self::library_available() => ParserKind::Library,
            ParserKind::Auto => ParserKind::Builtin,
            ParserKind::Library if !Self::library_available() => {
                warn!("YAML library support not compiled in, falling back to built-in parser");
                ParserKind::Builtin
            }
            kind => kind,
        }
    }

    /// Build the parser for this kind
    pub fn parser(self) -> Arc<dyn DocumentParser> {
        let resolved = self.resolve();
        debug!("Using {} parser", resolved);
        match resolved {
            #[cfg(feature = "yaml-library")]
            ParserKind::Library => Arc::new(LibraryParser),
            _ => Arc::new(BuiltinParser),
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParserKind::Auto => "auto",
            ParserKind::Builtin => "builtin",
            ParserKind::Library => "library",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ParserKind::Auto),
            "builtin" | "built-in" => Ok(ParserKind::Builtin),
            "library" | "yaml" => Ok(ParserKind::Library),
            _ => Err(format!("Unknown parser: {}", s)),
        }
    }
}

/// Self-contained subset parser
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinParser;

impl DocumentParser for BuiltinParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Builtin
    }

    fn parse(&self, text: &str) -> Result<Mapping> {
        parse_document(text)
    }
}

#[cfg(feature = "yaml-library")]
pub use library::LibraryParser;

#[cfg(feature = "yaml-library")]
mod library {
    use super::{DocumentParser, ParserKind};
    use crate::error::{ParseError, Result};
    use crate::node::{Mapping, Node, Scalar};
    use serde_yaml::Value;

    /// Parser backed by `serde_yaml`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LibraryParser;

    impl DocumentParser for LibraryParser {
        fn kind(&self) -> ParserKind {
            ParserKind::Library
        }

        fn parse(&self, text: &str) -> Result<Mapping> {
            let value: Value =
                serde_yaml::from_str(text).map_err(|e| ParseError::Library(e.to_string()))?;

            // Empty documents and non-mapping roots read as an empty mapping
            match convert(value) {
                Node::Mapping(mapping) => Ok(mapping),
                _ => Ok(Mapping::new()),
            }
        }
    }

    fn convert(value: Value) -> Node {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Scalar(Scalar::Integer(i)),
                None => Node::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Sequence(items) => Node::Sequence(items.into_iter().map(convert).collect()),
            Value::Mapping(map) => Node::Mapping(
                map.into_iter()
                    .map(|(k, v)| (key_text(k), convert(v)))
                    .collect(),
            ),
            Value::Tagged(tagged) => convert(tagged.value),
        }
    }

    fn key_text(key: Value) -> String {
        match convert(key) {
            Node::Scalar(Scalar::String(s)) => s,
            Node::Scalar(scalar) => scalar.to_string(),
            other => serde_json::to_string(&other).unwrap_or_default(),
        }
    }
}
