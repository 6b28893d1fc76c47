//! `echo` resource
//!
//! Reflects what the dispatcher saw. Handy for checking override headers and
//! sanitizing from a client.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::dispatch::{Call, HandlerError, HandlerResult, MethodFilter, Operation, Resource};

pub struct EchoResource;

impl EchoResource {
    fn describe(call: &Call<'_>) -> Value {
        json!({
            "method": call.method.as_str(),
            "endpoint": call.endpoint,
            "verb": call.verb,
            "args": call.args,
            "input": call.input,
        })
    }

    fn echo(call: &Call<'_>) -> HandlerResult {
        Ok(Self::describe(call))
    }

    /// `echo/body`: the raw JSON body, 400 when missing or malformed
    fn body(call: &Call<'_>) -> HandlerResult {
        call.read_raw_body()
            .ok_or_else(|| HandlerError::bad_request("Body must be valid JSON"))
    }
}

impl Resource for EchoResource {
    fn endpoint(&self) -> &str {
        "echo"
    }

    fn operations(self: Arc<Self>) -> Vec<Operation> {
        vec![
            Operation::any("", Self::echo),
            Operation::new("body", MethodFilter::POST | MethodFilter::PUT, Self::body),
        ]
    }
}
