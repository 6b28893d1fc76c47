//! Effective method resolution
//!
//! A POST may emulate PUT or DELETE through an override header, for clients
//! that cannot send those methods natively.

use std::fmt;

use hyper::Method;

use super::context::RequestContext;
use super::error::DispatchError;

/// Default name of the method override header
pub const DEFAULT_OVERRIDE_HEADER: &str = "X-HTTP-Method";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectiveMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl EffectiveMethod {
    pub const ALL: [Self; 4] = [Self::Get, Self::Post, Self::Put, Self::Delete];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// GET and PUT take their input from the query string, POST and DELETE from the body
    pub const fn reads_query(self) -> bool {
        matches!(self, Self::Get | Self::Put)
    }

    fn from_method(method: &Method) -> Option<Self> {
        match *method {
            Method::GET => Some(Self::Get),
            Method::POST => Some(Self::Post),
            Method::PUT => Some(Self::Put),
            Method::DELETE => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for EffectiveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the method a request should be treated as.
///
/// The override header is only consulted for POST, and only the literal
/// values `PUT` and `DELETE` are accepted.
pub fn resolve_method(
    ctx: &RequestContext,
    override_header: &str,
) -> Result<EffectiveMethod, DispatchError> {
    let method = EffectiveMethod::from_method(&ctx.method)
        .ok_or_else(|| DispatchError::MethodNotAllowed(ctx.method.to_string()))?;

    if method != EffectiveMethod::Post {
        return Ok(method);
    }

    match ctx.header(override_header).as_deref() {
        None => Ok(method),
        Some("DELETE") => Ok(EffectiveMethod::Delete),
        Some("PUT") => Ok(EffectiveMethod::Put),
        Some(other) => Err(DispatchError::InvalidOverrideHeader(other.to_string())),
    }
}
