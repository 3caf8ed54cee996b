//! Test-case input grammar.
//!
//! A test case's `input` is turned into positional arguments:
//!
//! ```text
//! input  := literal                  whole input is one [..] or {..} JSON value
//!         | piece ("," piece)*       commas outside brackets and quotes
//! piece  := '"' chars '"'            string, quotes stripped, no escapes
//!         | '[' .. | '{' ..          JSON array / object
//!         | number                   finite decimal number
//!         | anything else            string, taken verbatim
//! ```
//!
//! `true`, `false`, `null`, and identifiers are *not* special: they are
//! passed through as strings.

use serde_json::{Number, Value};

use crate::error::LiteralError;

/// Parse a test-case input into positional argument values.
pub fn parse_arguments(input: &str) -> Result<Vec<Value>, LiteralError> {
    let trimmed = input.trim();

    if is_structured(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return Ok(vec![value]);
        }
    }

    split_top_level(trimmed)?
        .into_iter()
        .map(parse_piece)
        .collect()
}

/// Parse a single comma-free piece.
pub fn parse_piece(piece: &str) -> Result<Value, LiteralError> {
    let piece = piece.trim();

    if piece.len() >= 2 && piece.starts_with('"') && piece.ends_with('"') {
        return Ok(Value::String(piece[1..piece.len() - 1].to_string()));
    }

    if is_structured(piece) {
        return serde_json::from_str(piece).map_err(|source| LiteralError::Malformed {
            text: piece.to_string(),
            source,
        });
    }

    if let Some(number) = parse_number(piece) {
        return Ok(Value::Number(number));
    }

    Ok(Value::String(piece.to_string()))
}

fn is_structured(text: &str) -> bool {
    text.starts_with('[') || text.starts_with('{')
}

fn parse_number(text: &str) -> Option<Number> {
    if text.is_empty() {
        return None;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Number::from(int));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

/// Split on commas that sit outside brackets and double-quoted strings.
fn split_top_level(text: &str) -> Result<Vec<&str>, LiteralError> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| LiteralError::Unbalanced(text.to_string()))?;
            }
            ',' if depth == 0 => {
                pieces.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 || in_string {
        return Err(LiteralError::Unbalanced(text.to_string()));
    }
    pieces.push(text[start..].trim());
    Ok(pieces)
}
