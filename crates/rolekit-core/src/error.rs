use thiserror::Error;

/// Errors raised while turning definition text into a document tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: indentation error: {message}")]
    Indentation { line: usize, message: String },

    #[error("line {line}: structure error: {message}")]
    Structure { line: usize, message: String },

    #[error("line {line}: syntax error: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: nesting deeper than {limit} levels")]
    TooDeep { line: usize, limit: usize },

    #[error("YAML parse error: {0}")]
    Library(String),
}

impl ParseError {
    pub(crate) fn indentation(line: usize, message: impl Into<String>) -> Self {
        ParseError::Indentation {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn structure(line: usize, message: impl Into<String>) -> Self {
        ParseError::Structure {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        ParseError::Syntax {
            line,
            message: message.into(),
        }
    }

    /// Line the error was detected on, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Indentation { line, .. }
            | ParseError::Structure { line, .. }
            | ParseError::Syntax { line, .. }
            | ParseError::TooDeep { line, .. } => Some(*line),
            ParseError::Library(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Document shapes the definition grammar cannot hold
///
/// `path` locates the offending node, e.g. `tools[2].name`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmitError {
    #[error("{path}: key {key:?} cannot be written as a mapping key")]
    Key { path: String, key: String },

    #[error("{path}: strings with line breaks cannot be written")]
    MultilineString { path: String },

    #[error("{path}: empty sequences cannot be written")]
    EmptySequence { path: String },

    #[error("{path}: nesting deeper than {limit} levels cannot be read back")]
    TooDeep { path: String, limit: usize },
}
