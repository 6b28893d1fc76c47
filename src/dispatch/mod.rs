//! Request dispatch
//!
//! Path tokenizing, method resolution, input sanitizing and the typed
//! resource registry. Independent of the HTTP server; the `handler` module
//! feeds it a `RequestContext` built from each hyper request.

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod method;
pub mod path;
pub mod resource;
pub mod sanitize;

pub use context::RequestContext;
pub use dispatcher::{read_raw_body, DispatchOptions, Reply, RequestDispatcher};
pub use error::DispatchError;
pub use method::{resolve_method, EffectiveMethod, DEFAULT_OVERRIDE_HEADER};
pub use path::{parse, ParsedRequest};
pub use resource::{
    build_method_name, Call, HandlerError, HandlerResult, Lookup, MethodFilter, Operation,
    Registry, Resource,
};
pub use sanitize::{sanitize, strip_tags, CleanedInput};
