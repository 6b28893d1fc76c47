//! Status table
//!
//! Reason phrases for the codes this server emits. Any other code is sent
//! with the 500 phrase while keeping its own number.

pub const STATUS_TABLE: [(u16, &str); 6] = [
    (200, "OK"),
    (400, "Bad Request"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (500, "Internal Server Error"),
];

const FALLBACK_REASON: &str = "Internal Server Error";

pub fn is_known(code: u16) -> bool {
    STATUS_TABLE.iter().any(|&(c, _)| c == code)
}

/// Reason phrase for `code`, falling back to the 500 entry
pub fn reason_phrase(code: u16) -> &'static str {
    STATUS_TABLE
        .iter()
        .find(|&&(c, _)| c == code)
        .map_or(FALLBACK_REASON, |&(_, reason)| reason)
}
