//! Request dispatcher
//!
//! Turns one request into a `(body, status)` pair: tokenize the path,
//! resolve the effective method, sanitize the matching input, then run the
//! operation registered under the synthesized method name.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

use super::context::RequestContext;
use super::error::DispatchError;
use super::method::{resolve_method, EffectiveMethod, DEFAULT_OVERRIDE_HEADER};
use super::path::{parse, ParsedRequest};
use super::resource::{build_method_name, Call, Lookup, Registry};
use super::sanitize::{sanitize, CleanedInput};
use crate::logger;

/// Per-deployment dispatch settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Header a POST may use to emulate PUT or DELETE
    pub override_header: String,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            override_header: DEFAULT_OVERRIDE_HEADER.to_string(),
        }
    }
}

/// JSON body plus numeric status
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub body: Value,
    pub status: u16,
}

impl Reply {
    pub const fn new(body: Value, status: u16) -> Self {
        Self { body, status }
    }

    pub const fn ok(body: Value) -> Self {
        Self::new(body, 200)
    }
}

impl From<DispatchError> for Reply {
    fn from(err: DispatchError) -> Self {
        Self::new(err.body(), err.status())
    }
}

/// One request, ready to dispatch
#[derive(Debug)]
pub struct RequestDispatcher<'a> {
    parsed: ParsedRequest,
    method: EffectiveMethod,
    input: CleanedInput,
    raw_body: &'a [u8],
}

impl<'a> RequestDispatcher<'a> {
    /// Fails with `InvalidOverrideHeader` or `MethodNotAllowed`; both are
    /// final for this request.
    pub fn new(
        path: &str,
        ctx: &'a RequestContext,
        options: &DispatchOptions,
    ) -> Result<Self, DispatchError> {
        let parsed = parse(path);
        let method = resolve_method(ctx, &options.override_header)?;
        let source = if method.reads_query() {
            &ctx.query
        } else {
            &ctx.body
        };

        Ok(Self {
            parsed,
            method,
            input: sanitize(source),
            raw_body: &ctx.raw_body,
        })
    }

    pub const fn parsed(&self) -> &ParsedRequest {
        &self.parsed
    }

    pub const fn method(&self) -> EffectiveMethod {
        self.method
    }

    pub const fn input(&self) -> &CleanedInput {
        &self.input
    }

    pub fn method_name(&self) -> String {
        build_method_name(&self.parsed.endpoint, &self.parsed.verb)
    }

    pub fn read_raw_body(&self) -> Option<Value> {
        read_raw_body(self.raw_body)
    }

    /// Run the matching operation.
    ///
    /// Unknown names give 404 `No Endpoint: <endpoint>`; a known name that
    /// does not accept the effective method gives 405. A panicking handler
    /// gives 500.
    pub fn dispatch(&self, registry: &Registry) -> Reply {
        let name = self.method_name();

        let operation = match registry.lookup(&name, self.method) {
            Lookup::Found(op) => op,
            Lookup::MethodNotAccepted => {
                return DispatchError::MethodNotAllowed(self.method.to_string()).into();
            }
            Lookup::Missing => {
                return DispatchError::EndpointNotFound(self.parsed.endpoint.clone()).into();
            }
        };

        let call = Call {
            method: self.method,
            endpoint: &self.parsed.endpoint,
            verb: &self.parsed.verb,
            args: &self.parsed.args,
            input: &self.input,
            raw_body: self.raw_body,
        };

        match catch_unwind(AssertUnwindSafe(|| operation.call(&call))) {
            Ok(Ok(body)) => Reply::ok(body),
            Ok(Err(err)) => {
                logger::log_debug(&format!("{name} returned {err}"));
                Reply::new(Value::String(err.message), err.status)
            }
            Err(payload) => {
                logger::log_error(&format!(
                    "Handler {name} panicked: {}",
                    panic_message(payload.as_ref())
                ));
                Reply::new(Value::String("Internal Server Error".to_string()), 500)
            }
        }
    }
}

/// Text of a panic payload raised by `panic!` with a message
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}

/// Parse a raw body as JSON; `None` when empty, malformed or `null`
pub fn read_raw_body(raw: &[u8]) -> Option<Value> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice::<Value>(raw)
        .ok()
        .filter(|v| !v.is_null())
}
