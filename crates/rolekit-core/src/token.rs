//! Line tokenizer
//!
//! Splits definition text into `(line, indent, content)` tokens. Blank lines
//! and whole-line `#` comments produce no token.

use crate::error::{ParseError, Result};

/// One significant line of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// 1-based line number
    pub line: usize,
    /// Number of leading spaces
    pub indent: usize,
    /// Line content with surrounding whitespace removed
    pub content: String,
}

impl Token {
    pub fn new(line: usize, indent: usize, content: impl Into<String>) -> Self {
        Token {
            line,
            indent,
            content: content.into(),
        }
    }

    /// Whether the content starts a sequence item (`- x` or a bare `-`)
    pub fn is_list_item(&self) -> bool {
        is_list_item(&self.content)
    }
}

pub(crate) fn is_list_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Tokenize definition text
///
/// Fails when the leading whitespace of a line contains anything but spaces.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end();
        let content = line.trim_start();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let leading = &line[..line.len() - content.len()];
        if leading.contains('\t') {
            return Err(ParseError::indentation(idx + 1, "tabs are not supported"));
        }
        if leading.chars().any(|c| c != ' ') {
            return Err(ParseError::indentation(
                idx + 1,
                "only spaces may be used for indentation",
            ));
        }

        tokens.push(Token::new(idx + 1, leading.len(), content));
    }

    Ok(tokens)
}

/// Index-based cursor over a token slice
#[derive(Debug, Clone)]
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        TokenCursor { tokens, index: 0 }
    }

    /// Next token without advancing
    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.index)
    }

    /// Next token, advancing past it
    pub fn pop(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(token)
    }

    pub fn position(&self) -> usize {
        self.index
    }

    pub fn is_exhausted(&self) -> bool {
        self.index >= self.tokens.len()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
