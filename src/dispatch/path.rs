//! Request path tokenizer
//!
//! Splits `/<endpoint>/<verb>/<arg0>/<arg1>` (or `/<endpoint>/<arg0>`) into its parts.

/// Tokenized request path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Resource name, always the first segment
    pub endpoint: String,
    /// Optional descriptor for non-CRUD operations; empty when absent
    pub verb: String,
    /// Remaining segments, order preserved
    pub args: Vec<String>,
}

/// Parse a request path.
///
/// Empty segments are dropped, so leading, doubled and trailing slashes are
/// all ignored. The second segment is taken as the verb only when it is not
/// numeric.
pub fn parse(path: &str) -> ParsedRequest {
    let mut segments = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_segment);

    let endpoint = segments.next().unwrap_or_default();
    let mut args: Vec<String> = segments.collect();

    let verb = if args.first().is_some_and(|s| !is_numeric(s)) {
        args.remove(0)
    } else {
        String::new()
    };

    ParsedRequest {
        endpoint,
        verb,
        args,
    }
}

/// Percent-decode a segment, keeping it raw when it is not valid UTF-8
fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned())
}

/// Whitespace tolerated around a numeric string, vertical tab included
const NUMERIC_WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\x0B', '\x0C'];

/// Numeric string check: optional sign, digits with an optional fraction,
/// optional exponent. Surrounding whitespace is tolerated.
pub fn is_numeric(s: &str) -> bool {
    let s = s.trim_matches(NUMERIC_WHITESPACE);
    let s = s.strip_prefix(&['+', '-'][..]).unwrap_or(s);

    let (mantissa, exponent) = match s.find(&['e', 'E'][..]) {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(&['+', '-'][..]).unwrap_or(exp);
            !exp.is_empty() && all_digits(exp)
        }
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_endpoint_verb_args() {
        let parsed = parse("files/process/12/34");
        assert_eq!(parsed.endpoint, "files");
        assert_eq!(parsed.verb, "process");
        assert_eq!(parsed.args, args(&["12", "34"]));
    }

    #[test]
    fn test_numeric_second_segment_stays_in_args() {
        let parsed = parse("files/12");
        assert_eq!(parsed.endpoint, "files");
        assert_eq!(parsed.verb, "");
        assert_eq!(parsed.args, args(&["12"]));
    }

    #[test]
    fn test_trailing_slash_insensitive() {
        for path in ["files", "files/12", "files/process/1/2", "", "a/b/c"] {
            assert_eq!(parse(path), parse(&format!("{path}/")), "path: {path}");
            assert_eq!(parse(path), parse(&format!("{path}///")), "path: {path}");
        }
    }

    #[test]
    fn test_leading_and_empty_segments() {
        let parsed = parse("/files//process/7");
        assert_eq!(parsed.endpoint, "files");
        assert_eq!(parsed.verb, "process");
        assert_eq!(parsed.args, args(&["7"]));
    }

    #[test]
    fn test_empty_path() {
        let parsed = parse("");
        assert_eq!(parsed, ParsedRequest::default());
        assert_eq!(parse("/"), ParsedRequest::default());
    }

    #[test]
    fn test_only_second_segment_can_be_verb() {
        let parsed = parse("files/12/process");
        assert_eq!(parsed.verb, "");
        assert_eq!(parsed.args, args(&["12", "process"]));
    }

    #[test]
    fn test_percent_decoding() {
        let parsed = parse("files/my%20report/a%2Fb");
        assert_eq!(parsed.verb, "my report");
        assert_eq!(parsed.args, args(&["a/b"]));

        // Invalid UTF-8 after decoding is kept raw
        let parsed = parse("files/%FF");
        assert_eq!(parsed.verb, "%FF");
    }

    #[test]
    fn test_is_numeric() {
        for s in ["12", "0", "-3", "+4", "1.5", ".5", "5.", "1e5", "2E-3", " 42 "] {
            assert!(is_numeric(s), "expected numeric: {s:?}");
        }
        for s in ["", "abc", "12a", "1e", "e5", ".", "-", "0x1A", "1.2.3", "1e+"] {
            assert!(!is_numeric(s), "expected non-numeric: {s:?}");
        }
    }

    #[test]
    fn test_is_numeric_vertical_tab_and_form_feed() {
        assert!(is_numeric(" 12\x0B"));
        assert!(is_numeric("\x0C7\t"));
        assert!(!is_numeric("\x0B"));
    }

    #[test]
    fn test_decimal_second_segment_is_arg() {
        let parsed = parse("prices/-1.25");
        assert_eq!(parsed.verb, "");
        assert_eq!(parsed.args, args(&["-1.25"]));
    }
}
