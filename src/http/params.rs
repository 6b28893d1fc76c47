//! Query string and form body decoding
//!
//! `application/x-www-form-urlencoded` pairs become a JSON object. Bracketed
//! keys nest: `a[b]=1` gives `{"a": {"b": "1"}}`, `a[]=1&a[]=2` gives
//! `{"a": ["1", "2"]}`. Repeated plain keys keep the last value.
//!
//! At most [`MAX_INPUT_VARS`] pairs are decoded and keys nesting deeper than
//! [`MAX_NESTING_DEPTH`] brackets are dropped.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::logger;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Pairs decoded from one input; the rest are ignored
pub const MAX_INPUT_VARS: usize = 1000;

/// Deepest bracket nesting accepted in a key
pub const MAX_NESTING_DEPTH: usize = 64;

/// Decode url-encoded pairs into a parameter object
pub fn parse_params(input: &[u8]) -> Value {
    let mut decoder = Decoder::default();
    let mut pairs = form_urlencoded::parse(input);
    for (key, value) in pairs.by_ref().take(MAX_INPUT_VARS) {
        match split_key(&key) {
            Some(path) => decoder.insert(&path, value.into_owned()),
            None => logger::log_warning(&format!(
                "Parameter dropped, nesting deeper than {MAX_NESTING_DEPTH}"
            )),
        }
    }
    if pairs.next().is_some() {
        logger::log_warning(&format!(
            "Input truncated to {MAX_INPUT_VARS} parameters"
        ));
    }

    // The top level always stays an object, even for keys like `0=a&1=b`
    Value::Object(
        decoder
            .root
            .into_iter()
            .map(|(k, v)| (k, collapse_lists(v)))
            .collect(),
    )
}

/// Whether a `Content-Type` value denotes a url-encoded form
pub fn is_form_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// `a[b][]` → `["a", "b", ""]`. A key without a well-formed bracket suffix
/// is used whole. `None` when the key nests too deep.
fn split_key(key: &str) -> Option<Vec<String>> {
    if key.is_empty() {
        return Some(Vec::new());
    }
    let Some(open) = key.find('[').filter(|&i| i > 0) else {
        return Some(vec![key.to_string()]);
    };

    let mut path = vec![key[..open].to_string()];
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            break;
        };
        if path.len() > MAX_NESTING_DEPTH {
            return None;
        }
        path.push(inner[..close].to_string());
        rest = &inner[close + 1..];
    }

    if path.len() == 1 {
        return Some(vec![key.to_string()]);
    }
    Some(path)
}

/// Parameter tree under construction
#[derive(Default)]
struct Decoder {
    root: Map<String, Value>,
    /// Next index for `[]` per container, keyed by resolved path.
    /// `None` once the index space is exhausted.
    next_free: HashMap<Vec<String>, Option<usize>>,
}

impl Decoder {
    fn insert(&mut self, path: &[String], value: String) {
        let Some((name, nested)) = path.split_first() else {
            return;
        };

        let mut resolved = vec![name.clone()];
        let mut slot = self.root.entry(name.clone()).or_insert(Value::Null);
        for segment in nested {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
                self.next_free.remove(&resolved);
            }
            let Some(map) = slot.as_object_mut() else {
                return;
            };

            let key = if segment.is_empty() {
                match self.next_free.get(&resolved) {
                    None => String::from("0"),
                    Some(Some(index)) => index.to_string(),
                    Some(None) => {
                        logger::log_warning("Parameter dropped, list index space exhausted");
                        return;
                    }
                }
            } else {
                segment.clone()
            };

            if let Some(index) = list_index(&key) {
                let next = self.next_free.entry(resolved.clone()).or_insert(Some(0));
                if next.is_some_and(|n| index >= n) {
                    *next = index.checked_add(1);
                }
            }

            resolved.push(key.clone());
            slot = map.entry(key).or_insert(Value::Null);
        }
        *slot = Value::String(value);
    }
}

/// Keys in canonical decimal form count as list indexes
fn list_index(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|index| key == index.to_string())
}

/// Objects keyed exactly `0..n` become arrays, ordered by index
fn collapse_lists(value: Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };

    let len = map.len();
    let sequential = len > 0
        && map
            .keys()
            .all(|key| list_index(key).is_some_and(|index| index < len));

    if sequential {
        let mut items: Vec<(usize, Value)> = map
            .into_iter()
            .filter_map(|(k, v)| list_index(&k).map(|index| (index, collapse_lists(v))))
            .collect();
        items.sort_unstable_by_key(|(index, _)| *index);
        return Value::Array(items.into_iter().map(|(_, v)| v).collect());
    }
    Value::Object(
        map.into_iter()
            .map(|(k, v)| (k, collapse_lists(v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_pairs() {
        assert_eq!(
            parse_params(b"name=report&size=3"),
            json!({"name": "report", "size": "3"})
        );
    }

    #[test]
    fn test_percent_and_plus_decoding() {
        assert_eq!(
            parse_params(b"q=hello+world&tag=%3Cb%3E"),
            json!({"q": "hello world", "tag": "<b>"})
        );
    }

    #[test]
    fn test_last_value_wins() {
        assert_eq!(parse_params(b"a=1&a=2"), json!({"a": "2"}));
    }

    #[test]
    fn test_nested_keys() {
        assert_eq!(
            parse_params(b"user[name]=ann&user[role]=admin"),
            json!({"user": {"name": "ann", "role": "admin"}})
        );
        assert_eq!(
            parse_params(b"a[b][c]=1"),
            json!({"a": {"b": {"c": "1"}}})
        );
    }

    #[test]
    fn test_list_keys() {
        assert_eq!(
            parse_params(b"ids[]=3&ids[]=1&ids[]=2"),
            json!({"ids": ["3", "1", "2"]})
        );
        let many: String = (0..12).map(|i| format!("n[]={i}&")).collect();
        let parsed = parse_params(many.as_bytes());
        assert_eq!(parsed["n"].as_array().map(Vec::len), Some(12));
        assert_eq!(parsed["n"][10], json!("10"));
    }

    #[test]
    fn test_sparse_indexes_stay_object() {
        assert_eq!(
            parse_params(b"a[0]=x&a[2]=y"),
            json!({"a": {"0": "x", "2": "y"}})
        );
    }

    #[test]
    fn test_malformed_brackets_used_whole() {
        assert_eq!(parse_params(b"a[b=1"), json!({"a[b": "1"}));
        assert_eq!(parse_params(b"[x]=1"), json!({"[x]": "1"}));
    }

    #[test]
    fn test_numeric_top_level_keys() {
        assert_eq!(parse_params(b"0=a&1=b"), json!({"0": "a", "1": "b"}));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_params(b""), json!({}));
        assert_eq!(parse_params(b"=orphan"), json!({}));
    }

    #[test]
    fn test_list_continues_after_explicit_index() {
        assert_eq!(
            parse_params(b"a[5]=x&a[]=y"),
            json!({"a": {"5": "x", "6": "y"}})
        );
        assert_eq!(
            parse_params(b"a[1]=y&a[0]=x&a[]=z"),
            json!({"a": ["x", "y", "z"]})
        );
    }

    #[test]
    fn test_list_restarts_after_overwrite() {
        assert_eq!(parse_params(b"a[]=1&a[]=2&a=x&a[]=3"), json!({"a": ["3"]}));
    }

    #[test]
    fn test_max_index_does_not_overflow() {
        let input = format!("a[{}]=x&a[]=y&b=ok", usize::MAX);
        let mut expected = Map::new();
        expected.insert(usize::MAX.to_string(), json!("x"));
        assert_eq!(
            parse_params(input.as_bytes()),
            json!({"a": Value::Object(expected), "b": "ok"})
        );
    }

    #[test]
    fn test_nesting_depth_limit() {
        let kept = format!("a{}=1", "[x]".repeat(MAX_NESTING_DEPTH));
        let parsed = parse_params(kept.as_bytes());
        let mut leaf = &parsed["a"];
        for _ in 0..MAX_NESTING_DEPTH {
            leaf = &leaf["x"];
        }
        assert_eq!(leaf, &json!("1"));

        let dropped = format!("a{}=1&b=2", "[x]".repeat(MAX_NESTING_DEPTH + 1));
        assert_eq!(parse_params(dropped.as_bytes()), json!({"b": "2"}));
    }

    #[test]
    fn test_very_deep_key_is_dropped() {
        let input = format!("a{}=1&b=2", "[x]".repeat(100_000));
        assert_eq!(parse_params(input.as_bytes()), json!({"b": "2"}));
    }

    #[test]
    fn test_input_vars_capped() {
        let input = "a[]=&".repeat(40_000);
        let parsed = parse_params(input.as_bytes());
        assert_eq!(parsed["a"].as_array().map(Vec::len), Some(MAX_INPUT_VARS));

        let input = format!("{}late=1", "x=&".repeat(MAX_INPUT_VARS));
        assert!(parse_params(input.as_bytes()).get("late").is_none());
    }

    #[test]
    fn test_form_content_type() {
        assert!(is_form_content_type("application/x-www-form-urlencoded"));
        assert!(is_form_content_type(
            "Application/X-WWW-Form-Urlencoded; charset=UTF-8"
        ));
        assert!(!is_form_content_type("application/json"));
    }
}
