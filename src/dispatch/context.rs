//! Ambient request context
//!
//! Everything the dispatcher needs from the surrounding server, passed in
//! explicitly instead of read from process-wide state.

use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::Method;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub headers: HeaderMap,
    /// Decoded query string parameters (an object)
    pub query: Value,
    /// Decoded form body parameters (an object)
    pub body: Value,
    /// Unparsed request body
    pub raw_body: Bytes,
}

impl RequestContext {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            query: Value::Object(Map::new()),
            body: Value::Object(Map::new()),
            raw_body: Bytes::new(),
        }
    }

    /// Add a header; invalid names or values are ignored
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body_params(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_raw_body(mut self, raw: impl Into<Bytes>) -> Self {
        self.raw_body = raw.into();
        self
    }

    /// Header value as text, lossily decoded
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }
}
