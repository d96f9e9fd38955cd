//! Recursive document parser
//!
//! Indentation is the only structural signal. Each mapping frame knows the
//! indent its keys must sit at; a key with an empty value opens a child
//! block whose indent is taken from the next token, so block widths only
//! need to be consistent within a block.

use crate::error::{ParseError, Result};
use crate::node::{Mapping, Node};
use crate::scalar::interpret_scalar;
use crate::token::{is_list_item, tokenize, Token, TokenCursor};
use tracing::debug;

/// Maximum number of nested blocks below the document root
pub const MAX_DEPTH: usize = 128;

/// Parse a whole document into its root mapping
pub fn parse_document(text: &str) -> Result<Mapping> {
    let tokens = tokenize(text)?;
    let mut cursor = TokenCursor::new(&tokens);
    parse_mapping(&mut cursor, 0)
}

/// Parse the mapping whose keys sit at `expected_indent`
pub fn parse_mapping(cursor: &mut TokenCursor<'_>, expected_indent: usize) -> Result<Mapping> {
    Parser::new(cursor).parse_mapping(expected_indent)
}

/// Parse the sequence whose items sit at `base_indent` or deeper
pub fn parse_sequence(cursor: &mut TokenCursor<'_>, base_indent: usize) -> Result<Vec<Node>> {
    Parser::new(cursor).parse_sequence(base_indent)
}

/// Mapping/sequence parser over a shared token cursor
pub struct Parser<'c, 'a> {
    cursor: &'c mut TokenCursor<'a>,
    depth: usize,
    max_depth: usize,
}

impl<'c, 'a> Parser<'c, 'a> {
    pub fn new(cursor: &'c mut TokenCursor<'a>) -> Self {
        Parser {
            cursor,
            depth: 0,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn parse_mapping(&mut self, expected_indent: usize) -> Result<Mapping> {
        let mut mapping = Mapping::new();
        self.mapping_entries(&mut mapping, expected_indent)?;
        Ok(mapping)
    }

    pub fn parse_sequence(&mut self, base_indent: usize) -> Result<Vec<Node>> {
        let mut items = Vec::new();

        while let Some(token) = self.cursor.peek() {
            if token.indent < base_indent || !token.is_list_item() {
                break;
            }
            self.cursor.pop();

            let (column, body) = item_body(token);
            let item = if body.is_empty() {
                self.nested_block(token, token.indent, None)?
            } else if is_list_item(body) {
                return Err(ParseError::structure(
                    token.line,
                    "nested list items on a single line are not supported",
                ));
            } else if is_inline_entry(body) {
                // `- key: value` opens a mapping aligned with `key`
                self.descend(token.line)?;
                let mut mapping = Mapping::new();
                self.entry(&mut mapping, token, column, body)?;
                self.mapping_entries(&mut mapping, column)?;
                self.depth -= 1;
                Node::Mapping(mapping)
            } else {
                Node::Scalar(interpret_scalar(body))
            };
            items.push(item);
        }

        Ok(items)
    }

    fn mapping_entries(&mut self, mapping: &mut Mapping, expected_indent: usize) -> Result<()> {
        while let Some(token) = self.cursor.peek() {
            if token.indent < expected_indent {
                break;
            }
            if token.indent > expected_indent {
                return Err(ParseError::indentation(
                    token.line,
                    format!(
                        "unexpected indent of {} spaces, expected {}",
                        token.indent, expected_indent
                    ),
                ));
            }
            if token.is_list_item() {
                return Err(ParseError::structure(
                    token.line,
                    "list item where mapping key expected",
                ));
            }

            self.cursor.pop();
            self.entry(mapping, token, token.indent, &token.content)?;
        }

        Ok(())
    }

    /// Parse one `key: value` entry whose text starts at `indent`
    fn entry(
        &mut self,
        mapping: &mut Mapping,
        token: &Token,
        indent: usize,
        content: &str,
    ) -> Result<()> {
        let (key, rest) = split_entry(content).ok_or_else(|| {
            ParseError::syntax(token.line, format!("expected `key: value`, found `{}`", content))
        })?;
        if key.is_empty() {
            return Err(ParseError::syntax(token.line, "empty mapping key"));
        }

        let value = if rest.is_empty() {
            self.nested_block(token, indent, Some(indent + 2))?
        } else {
            Node::Scalar(interpret_scalar(rest))
        };

        if mapping.insert(key, value).is_some() {
            debug!(line = token.line, key, "Duplicate key overwrites earlier value");
        }
        Ok(())
    }

    /// Value of an entry or item with nothing after its marker
    ///
    /// Anything not indented past `indent` means the value is an empty
    /// mapping. A nested sequence starts at `sequence_indent` when given,
    /// otherwise at the next token's own indent.
    fn nested_block(
        &mut self,
        token: &Token,
        indent: usize,
        sequence_indent: Option<usize>,
    ) -> Result<Node> {
        let next = match self.cursor.peek() {
            Some(next) if next.indent > indent => next,
            _ => return Ok(Node::Mapping(Mapping::new())),
        };

        self.descend(token.line)?;
        let node = if next.is_list_item() {
            self.parse_sequence(sequence_indent.unwrap_or(next.indent))
                .map(Node::Sequence)
        } else {
            self.parse_mapping(next.indent).map(Node::Mapping)
        };
        self.depth -= 1;
        node
    }

    fn descend(&mut self, line: usize) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::TooDeep {
                line,
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }
}

/// Split on the first `:` into trimmed key and remainder
fn split_entry(content: &str) -> Option<(&str, &str)> {
    content
        .split_once(':')
        .map(|(key, rest)| (key.trim(), rest.trim()))
}

/// Column and text of a list item body, after the `-` marker
fn item_body(token: &Token) -> (usize, &str) {
    let rest = &token.content[1..];
    let body = rest.trim_start();
    let gap = rest[..rest.len() - body.len()].chars().count();
    (token.indent + 1 + gap, body)
}

/// Whether a list item body reads as a mapping entry rather than a scalar
pub(crate) fn is_inline_entry(body: &str) -> bool {
    if body.starts_with('"') || body.starts_with('\'') {
        return false;
    }
    match body.split_once(':') {
        Some((key, rest)) => {
            !key.trim().is_empty() && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        }
        None => false,
    }
}
