//! Input sanitizer
//!
//! Strips HTML-like tags and surrounding whitespace from every string in a
//! parameter tree, keeping its shape.

use serde_json::{Map, Value};

/// Sanitized parameter tree
pub type CleanedInput = Value;

/// Characters removed from both ends of every string leaf
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Depth-first sanitize.
///
/// Objects are rebuilt with the same keys, arrays with the same order.
/// Numbers, booleans and null pass through untouched.
pub fn sanitize(input: &Value) -> CleanedInput {
    match input {
        Value::String(s) => Value::String(clean_str(s)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}

fn clean_str(s: &str) -> String {
    strip_tags(s).trim_matches(TRIM_CHARS).to_string()
}

#[derive(Clone, Copy)]
enum State {
    Text,
    Tag { quote: Option<char> },
    Comment { start: usize },
}

/// Remove `<...>` tags and `<!-- ... -->` comments.
///
/// A `<` followed by whitespace or at the end of input is literal text.
/// Quoted attribute values may contain `>`. An unterminated tag swallows the
/// rest of the input.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = State::Text;
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        state = match state {
            State::Text if c == '<' => match chars.peek() {
                None => {
                    out.push(c);
                    State::Text
                }
                Some(&(_, next)) if next.is_whitespace() => {
                    out.push(c);
                    State::Text
                }
                Some(_) if input[i + 1..].starts_with("!--") => {
                    chars.nth(2);
                    State::Comment { start: i + 4 }
                }
                Some(_) => State::Tag { quote: None },
            },
            State::Text => {
                out.push(c);
                State::Text
            }
            State::Tag { quote: Some(q) } => State::Tag {
                quote: if c == q { None } else { Some(q) },
            },
            State::Tag { quote: None } => match c {
                '>' => State::Text,
                '"' | '\'' => State::Tag { quote: Some(c) },
                _ => State::Tag { quote: None },
            },
            // The closing "--" must follow the opening "<!--"
            State::Comment { start } if c == '>' && input[start..i].ends_with("--") => {
                State::Text
            }
            State::Comment { start } => State::Comment { start },
        };
    }

    out
}
