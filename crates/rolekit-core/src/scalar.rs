//! Scalar typing
//!
//! Rules apply in order: quoted string, boolean, null, integer, float,
//! plain string. A quoted numeral therefore stays a string while the bare
//! numeral becomes a number.

use crate::node::Scalar;

/// Interpret a bare text fragment as a typed scalar
pub fn interpret_scalar(text: &str) -> Scalar {
    if let Some(inner) = strip_quotes(text) {
        return Scalar::String(inner.to_string());
    }

    if text.eq_ignore_ascii_case("true") {
        return Scalar::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Scalar::Bool(false);
    }
    if text == "~" || text.eq_ignore_ascii_case("null") {
        return Scalar::Null;
    }

    if let Ok(i) = text.parse::<i64>() {
        return Scalar::Integer(i);
    }
    if let Ok(x) = text.parse::<f64>() {
        return Scalar::Float(x);
    }

    Scalar::String(text.to_string())
}

/// Inner text of a fragment wrapped in matching single or double quotes
pub(crate) fn strip_quotes(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let first = bytes[0];
    if (first == b'"' || first == b'\'') && bytes[bytes.len() - 1] == first {
        Some(&text[1..text.len() - 1])
    } else {
        None
    }
}
