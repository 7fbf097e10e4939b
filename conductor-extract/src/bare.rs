//! Bare `name(key=value, ...)` call recognition in free text.

use std::sync::LazyLock;

use conductor_primitives::ToolCall;
use regex::Regex;
use serde_json::{Map, Value};

static CALL_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\(").expect("call-head regex"));

/// Scans free text for call syntax naming an already-known tool.
///
/// Returns one entry per call with the byte offset where it was found.
/// Anything that does not look like a call to a known name is left alone.
pub(crate) fn find_calls(text: &str, known: &[String]) -> Vec<(usize, ToolCall)> {
    let mut calls = Vec::new();
    for caps in CALL_HEAD.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if !known.iter().any(|k| k == name.as_str()) {
            continue;
        }
        let Some(close) = find_closing(text, whole.end()) else {
            continue;
        };
        let params = parse_args(&text[whole.end()..close]);
        calls.push((whole.start(), ToolCall::from_parts(name.as_str(), params)));
    }
    calls
}

/// Finds the parenthesis closing the call opened just before `open`,
/// skipping quoted stretches so `", )"` inside a value does not end the
/// argument list early.
fn find_closing(text: &str, open: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_args(args: &str) -> Map<String, Value> {
    let mut params = Map::new();
    for piece in split_top_level(args) {
        let Some((key, value)) = piece.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            continue;
        }
        params.insert(key.to_owned(), coerce(value));
    }
    params
}

fn split_top_level(args: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;
    for (i, ch) in args.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < args.len() {
        pieces.push(&args[start..]);
    }
    pieces
}

/// Sniffs a literal: quoted text verbatim, then boolean, then integer,
/// falling back to the trimmed text itself.
fn coerce(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        let quoted = (bytes[0] == b'"' && bytes[trimmed.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[trimmed.len() - 1] == b'\'');
        if quoted {
            return Value::String(trimmed[1..trimmed.len() - 1].to_owned());
        }
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(number) = trimmed.parse::<i64>() {
        return Value::from(number);
    }
    Value::String(trimmed.to_owned())
}
