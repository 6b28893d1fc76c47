//! Dispatch error taxonomy
//!
//! Every variant maps to exactly one HTTP status and JSON body.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// POST carried an override header whose value is neither `PUT` nor `DELETE`
    #[error("Unexpected Header: {0}")]
    InvalidOverrideHeader(String),

    /// Ambient method outside GET/POST/PUT/DELETE, or not accepted by the operation
    #[error("Invalid Method")]
    MethodNotAllowed(String),

    /// No operation registered under the synthesized method name
    #[error("No Endpoint: {0}")]
    EndpointNotFound(String),
}

impl DispatchError {
    pub const fn status(&self) -> u16 {
        match self {
            Self::InvalidOverrideHeader(_) => 400,
            Self::MethodNotAllowed(_) => 405,
            Self::EndpointNotFound(_) => 404,
        }
    }

    /// JSON payload sent to the client
    pub fn body(&self) -> Value {
        Value::String(self.to_string())
    }
}
