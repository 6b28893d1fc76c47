//! restgate: a small REST-style request dispatcher.
//!
//! Paths of the form `/<endpoint>/<verb>/<arg0>/<arg1>` are tokenized,
//! the effective method is resolved (a POST may emulate PUT or DELETE via
//! an override header), input is sanitized and the operation registered for
//! `endpoint + Verb` runs. Every reply is JSON.

pub mod config;
pub mod dispatch;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resources;
pub mod server;
