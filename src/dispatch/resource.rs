//! Resources and the operation registry
//!
//! A resource declares its operations once, at mount time. Each operation is
//! keyed by the method name synthesized from its endpoint and verb
//! (`files` + `process` → `filesProcess`) and restricted to a set of
//! effective methods.

use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use serde_json::Value;

use super::dispatcher::read_raw_body;
use super::method::EffectiveMethod;
use crate::logger;

pub type HandlerResult = Result<Value, HandlerError>;

type HandlerFn = dyn Fn(&Call<'_>) -> HandlerResult + Send + Sync;

/// Error returned by a handler, carried to the client as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    pub status: u16,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for HandlerError {}

/// Set of effective methods an operation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodFilter(u8);

impl MethodFilter {
    pub const GET: Self = Self(1);
    pub const POST: Self = Self(1 << 1);
    pub const PUT: Self = Self(1 << 2);
    pub const DELETE: Self = Self(1 << 3);
    pub const ANY: Self = Self(0b1111);

    pub const fn contains(self, method: EffectiveMethod) -> bool {
        self.0 & Self::of(method).0 != 0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    const fn of(method: EffectiveMethod) -> Self {
        match method {
            EffectiveMethod::Get => Self::GET,
            EffectiveMethod::Post => Self::POST,
            EffectiveMethod::Put => Self::PUT,
            EffectiveMethod::Delete => Self::DELETE,
        }
    }
}

impl BitOr for MethodFilter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<EffectiveMethod> for MethodFilter {
    fn from(method: EffectiveMethod) -> Self {
        Self::of(method)
    }
}

/// Everything a handler sees of the request
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub method: EffectiveMethod,
    pub endpoint: &'a str,
    pub verb: &'a str,
    pub args: &'a [String],
    /// Sanitized query (GET/PUT) or body (POST/DELETE) parameters
    pub input: &'a Value,
    pub(crate) raw_body: &'a [u8],
}

impl<'a> Call<'a> {
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn param(&self, key: &str) -> Option<&'a Value> {
        self.input.get(key)
    }

    pub fn param_str(&self, key: &str) -> Option<&'a str> {
        self.param(key).and_then(Value::as_str)
    }

    /// Raw body parsed as JSON, `None` when empty or malformed
    pub fn read_raw_body(&self) -> Option<Value> {
        read_raw_body(self.raw_body)
    }
}

/// A named handler operation of a resource
pub struct Operation {
    verb: String,
    methods: MethodFilter,
    handler: Box<HandlerFn>,
}

impl Operation {
    pub fn new<F>(verb: &str, methods: MethodFilter, handler: F) -> Self
    where
        F: Fn(&Call<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            verb: verb.to_string(),
            methods,
            handler: Box::new(handler),
        }
    }

    /// Operation accepting every effective method
    pub fn any<F>(verb: &str, handler: F) -> Self
    where
        F: Fn(&Call<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(verb, MethodFilter::ANY, handler)
    }

    pub fn call(&self, call: &Call<'_>) -> HandlerResult {
        (self.handler)(call)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("verb", &self.verb)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// A resource answering to one endpoint
pub trait Resource: Send + Sync + 'static {
    fn endpoint(&self) -> &str;

    /// Operations exposed by this resource. Called once when mounted.
    fn operations(self: Arc<Self>) -> Vec<Operation>;
}

/// `endpoint` followed by `verb` with its first letter upper-cased
pub fn build_method_name(endpoint: &str, verb: &str) -> String {
    let mut name = String::with_capacity(endpoint.len() + verb.len());
    name.push_str(endpoint);

    let mut chars = verb.chars();
    if let Some(first) = chars.next() {
        name.push(first.to_ascii_uppercase());
        name.push_str(chars.as_str());
    }
    name
}

/// Result of a registry lookup
#[derive(Debug)]
pub enum Lookup<'a> {
    Found(&'a Operation),
    /// Name is registered but no operation accepts the method
    MethodNotAccepted,
    Missing,
}

/// Operations of every mounted resource, keyed by method name
#[derive(Debug, Default)]
pub struct Registry {
    operations: HashMap<String, Vec<Operation>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount all operations of a resource under its endpoint
    pub fn mount<R: Resource>(&mut self, resource: Arc<R>) -> &mut Self {
        let endpoint = resource.endpoint().to_string();
        for operation in resource.operations() {
            self.insert(&endpoint, operation);
        }
        self
    }

    /// Register a single operation.
    ///
    /// When methods overlap with an operation already registered under the
    /// same name, the later one wins for those methods.
    pub fn insert(&mut self, endpoint: &str, operation: Operation) {
        let name = build_method_name(endpoint, &operation.verb);
        let slot = self.operations.entry(name).or_default();

        if let Some(prev) = slot
            .iter()
            .find(|op| op.methods.intersects(operation.methods))
        {
            logger::log_warning(&format!(
                "Operation {} overrides earlier registration ({:?})",
                build_method_name(endpoint, &operation.verb),
                prev.methods
            ));
        }
        slot.push(operation);
    }

    pub fn lookup(&self, name: &str, method: EffectiveMethod) -> Lookup<'_> {
        let Some(slot) = self.operations.get(name) else {
            return Lookup::Missing;
        };

        slot.iter()
            .rev()
            .find(|op| op.methods.contains(method))
            .map_or(Lookup::MethodNotAccepted, Lookup::Found)
    }

    /// Registered method names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
