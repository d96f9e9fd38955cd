//! Subset emitter
//!
//! Renders a document back into the grammar the built-in parser reads, with
//! two-space indentation. Trees the grammar cannot hold are rejected with an
//! [`EmitError`] instead of being written in a form that reads back
//! differently:
//! - keys that are empty, padded, contain `:` or a line break, start with `#`
//!   or read as a list item
//! - strings containing line breaks
//! - empty sequences
//! - nesting deeper than [`MAX_DEPTH`]

use crate::error::EmitError;
use crate::node::{Mapping, Node, Scalar};
use crate::parser::{is_inline_entry, MAX_DEPTH};
use crate::scalar::interpret_scalar;
use crate::token::is_list_item;

type Result<T> = std::result::Result<T, EmitError>;

/// Render a document
pub fn emit(mapping: &Mapping) -> Result<String> {
    let mut emitter = Emitter::default();
    emitter.mapping(mapping, 0, 0, "")?;
    Ok(emitter.out)
}

#[derive(Default)]
struct Emitter {
    out: String,
}

impl Emitter {
    fn mapping(&mut self, mapping: &Mapping, indent: usize, depth: usize, path: &str) -> Result<()> {
        for (key, value) in mapping.iter() {
            self.pad(indent);
            self.entry(key, value, indent, depth, path)?;
        }
        Ok(())
    }

    fn entry(
        &mut self,
        key: &str,
        value: &Node,
        indent: usize,
        depth: usize,
        path: &str,
    ) -> Result<()> {
        if !is_writable_key(key) {
            return Err(EmitError::Key {
                path: location(path),
                key: key.to_string(),
            });
        }

        self.out.push_str(key);
        self.out.push(':');
        let path = if path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", path, key)
        };
        self.value(value, indent, depth, &path)
    }

    /// Write what follows a `key:` or `-` marker
    ///
    /// `depth` is the nesting level of the mapping or sequence holding the
    /// value; a non-empty child block sits one level deeper.
    fn value(&mut self, value: &Node, indent: usize, depth: usize, path: &str) -> Result<()> {
        match value {
            Node::Scalar(scalar) => {
                if matches!(scalar, Scalar::String(s) if s.contains(['\n', '\r'])) {
                    return Err(EmitError::MultilineString {
                        path: location(path),
                    });
                }
                self.out.push(' ');
                self.out.push_str(&render_scalar(scalar));
                self.out.push('\n');
            }
            Node::Mapping(mapping) => {
                if !mapping.is_empty() {
                    check_depth(depth + 1, path)?;
                }
                self.out.push('\n');
                self.mapping(mapping, indent + 2, depth + 1, path)?;
            }
            Node::Sequence(items) => {
                if items.is_empty() {
                    return Err(EmitError::EmptySequence {
                        path: location(path),
                    });
                }
                check_depth(depth + 1, path)?;
                self.out.push('\n');
                self.sequence(items, indent + 2, depth + 1, path)?;
            }
        }
        Ok(())
    }

    fn sequence(&mut self, items: &[Node], indent: usize, depth: usize, path: &str) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            let path = format!("{}[{}]", path, i);
            self.pad(indent);
            self.out.push('-');

            match item {
                // `- key: value` only when the first key reads back as an entry
                Node::Mapping(mapping) if opens_inline(mapping) => {
                    check_depth(depth + 1, &path)?;
                    let column = indent + 2;
                    for (n, (key, value)) in mapping.iter().enumerate() {
                        if n == 0 {
                            self.out.push(' ');
                        } else {
                            self.pad(column);
                        }
                        self.entry(key, value, column, depth + 1, &path)?;
                    }
                }
                other => self.value(other, indent, depth, &path)?,
            }
        }
        Ok(())
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }
}

fn opens_inline(mapping: &Mapping) -> bool {
    mapping
        .keys()
        .next()
        .map_or(false, |key| is_inline_entry(&format!("{}:", key)))
}

/// Whether `key: value` reads back with exactly this key
pub fn is_writable_key(key: &str) -> bool {
    !key.is_empty()
        && key.trim() == key
        && !key.contains(':')
        && !key.contains(['\n', '\r'])
        && !key.starts_with('#')
        && !is_list_item(key)
}

fn check_depth(depth: usize, path: &str) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(EmitError::TooDeep {
            path: location(path),
            limit: MAX_DEPTH,
        });
    }
    Ok(())
}

fn location(path: &str) -> String {
    if path.is_empty() {
        "document root".to_string()
    } else {
        path.to_string()
    }
}

/// Text of a scalar that reads back as the same scalar
pub fn render_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Integer(i) => i.to_string(),
        // Debug keeps a fractional part or exponent on every finite value
        Scalar::Float(x) => format!("{:?}", x),
        Scalar::String(s) if needs_quotes(s) => format!("\"{}\"", s),
        Scalar::String(s) => s.clone(),
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.trim() != s
        || s.starts_with('"')
        || s.starts_with('\'')
        || s.starts_with('#')
        || is_list_item(s)
        || is_inline_entry(s)
        || interpret_scalar(s) != Scalar::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn sample() -> Mapping {
        let tool: Mapping = [
            ("name", Node::from(Scalar::from("find_symbol"))),
            ("timeout", Node::from(Scalar::Float(2.0))),
            (
                "args",
                Node::Sequence(vec![
                    Node::from(Scalar::from("--depth")),
                    Node::from(Scalar::from("3")),
                ]),
            ),
        ]
        .into_iter()
        .collect();

        let quoted_first_key: Mapping = [
            ("\"a\"", Scalar::Integer(1)),
            ("b", Scalar::Integer(2)),
        ]
        .into_iter()
        .collect();

        let limits: Mapping = [
            ("tokens", Scalar::Integer(4096)),
            ("ratio", Scalar::Float(0.75)),
        ]
        .into_iter()
        .collect();

        let mut doc = Mapping::new();
        doc.insert("name", Scalar::from("serena-agent"));
        doc.insert("description", Scalar::from("Plans: then acts"));
        doc.insert("version", Scalar::from("42"));
        doc.insert("enabled", Scalar::Bool(false));
        doc.insert("owner", Scalar::Null);
        doc.insert("empty_text", Scalar::from(""));
        doc.insert("bullet", Scalar::from("- not a list"));
        doc.insert("tag", Scalar::from("#hash"));
        doc.insert("limits", limits);
        doc.insert(
            "tools",
            vec![
                Node::from(tool),
                Node::from(Scalar::from("key: value")),
                Node::Sequence(vec![Node::from(Scalar::Integer(1))]),
                Node::Mapping(Mapping::new()),
                Node::from(quoted_first_key),
            ],
        );
        doc.insert("settings", Mapping::new());
        doc
    }

    #[test]
    fn test_round_trip() {
        let doc = sample();
        let text = emit(&doc).unwrap();
        let reparsed = parse_document(&text).unwrap();
        assert_eq!(reparsed, doc, "emitted:\n{}", text);
    }

    #[test]
    fn test_layout() {
        let doc = parse_document("a: 1\nitems:\n  - name: x\n    tags:\n      - t\n").unwrap();
        assert_eq!(
            emit(&doc).unwrap(),
            "a: 1\nitems:\n  - name: x\n    tags:\n      - t\n"
        );
    }

    #[test]
    fn test_item_with_quoted_first_key_uses_block() {
        let text = "items:\n  -\n    \"a\": 1\n    b: 2\n";
        let doc = parse_document(text).unwrap();

        let emitted = emit(&doc).unwrap();
        assert_eq!(emitted, text);
        assert_eq!(parse_document(&emitted).unwrap(), doc);
    }

    #[test]
    fn test_unwritable_keys_are_rejected() {
        for key in ["#k", "a: b", "- k", "-", "", " padded", "two\nlines", "cr\rkey"] {
            let mut doc = Mapping::new();
            doc.insert(key, Scalar::Integer(1));
            assert_eq!(
                emit(&doc),
                Err(EmitError::Key {
                    path: "document root".to_string(),
                    key: key.to_string()
                }),
                "key {:?}",
                key
            );
        }

        let nested: Mapping = [("ok", Node::from(vec![Node::from(
            [("#bad", Scalar::Null)].into_iter().collect::<Mapping>(),
        )]))]
        .into_iter()
        .collect();
        assert!(matches!(
            emit(&nested),
            Err(EmitError::Key { ref path, .. }) if path == "ok[0]"
        ));
    }

    #[test]
    fn test_unwritable_values_are_rejected() {
        let mut doc = Mapping::new();
        doc.insert("text", Scalar::from("first\nsecond"));
        assert_eq!(
            emit(&doc),
            Err(EmitError::MultilineString {
                path: "text".to_string()
            })
        );

        let mut doc = Mapping::new();
        doc.insert("items", vec![Node::from(Scalar::from("carriage\rreturn"))]);
        assert_eq!(
            emit(&doc),
            Err(EmitError::MultilineString {
                path: "items[0]".to_string()
            })
        );

        let mut doc = Mapping::new();
        doc.insert("model", [("tags", Node::Sequence(vec![]))].into_iter().collect::<Mapping>());
        assert_eq!(
            emit(&doc),
            Err(EmitError::EmptySequence {
                path: "model.tags".to_string()
            })
        );
    }

    #[test]
    fn test_nesting_limit() {
        fn nested(levels: usize) -> Mapping {
            let mut doc: Mapping = [("leaf", Scalar::Integer(1))].into_iter().collect();
            for _ in 0..levels {
                doc = [("k", doc)].into_iter().collect();
            }
            doc
        }

        let deepest = nested(MAX_DEPTH);
        let text = emit(&deepest).unwrap();
        assert_eq!(parse_document(&text).unwrap(), deepest);

        assert!(matches!(
            emit(&nested(MAX_DEPTH + 1)),
            Err(EmitError::TooDeep { limit: MAX_DEPTH, .. })
        ));
    }

    #[test]
    fn test_writable_keys() {
        for key in ["name", "\"quoted\"", "-flag", "with space", "x#y"] {
            assert!(is_writable_key(key), "{:?}", key);
        }
    }

    #[test]
    fn test_render_scalar_quotes_ambiguous_strings() {
        assert_eq!(render_scalar(&Scalar::from("42")), "\"42\"");
        assert_eq!(render_scalar(&Scalar::from("TRUE")), "\"TRUE\"");
        assert_eq!(render_scalar(&Scalar::from("~")), "\"~\"");
        assert_eq!(render_scalar(&Scalar::from(" padded")), "\" padded\"");
        assert_eq!(render_scalar(&Scalar::from("plain words")), "plain words");
        assert_eq!(render_scalar(&Scalar::Float(1.0)), "1.0");
        assert_eq!(render_scalar(&Scalar::Integer(-3)), "-3");
    }
}
