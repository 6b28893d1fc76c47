//! Request entry point
//!
//! Turns a hyper request into a `RequestContext`, runs the dispatcher and
//! writes the access log.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, REFERER, USER_AGENT};
use hyper::{Request, Response, Version};
use serde_json::Value;

use crate::config::AppState;
use crate::dispatch::{build_method_name, parse, Reply, RequestContext, RequestDispatcher};
use crate::http;
use crate::logger::{self, AccessLogEntry};

const PAYLOAD_TOO_LARGE: u16 = 413;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    state.record_request();

    let (parts, body) = req.into_parts();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = version_label(parts.version).to_string();
    entry.referer = header_string(&parts.headers, REFERER.as_str());
    entry.user_agent = header_string(&parts.headers, USER_AGENT.as_str());

    logger::log_headers_count(parts.headers.len(), state.config.logging.show_headers);

    let max_body_size = state.config.http.max_body_size;
    let reply = match read_body(&parts.headers, body, max_body_size).await {
        Ok(raw_body) => {
            let path = strip_prefix(parts.uri.path(), state.config.path_prefix());
            let query = parts
                .uri
                .query()
                .map_or_else(|| http::parse_params(b""), |q| http::parse_params(q.as_bytes()));
            let body_params = if header_string(&parts.headers, CONTENT_TYPE.as_str())
                .is_some_and(|ct| http::is_form_content_type(&ct))
            {
                http::parse_params(&raw_body)
            } else {
                http::parse_params(b"")
            };

            let ctx = RequestContext::new(parts.method.clone())
                .with_headers(parts.headers)
                .with_query(query)
                .with_body_params(body_params)
                .with_raw_body(raw_body);

            run_dispatcher(path, &ctx, &state, &mut entry)
        }
        Err(reply) => reply,
    };

    let response = http::respond(&reply.body, reply.status);

    entry.status = response.status().as_u16();
    entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
        .unwrap_or(usize::MAX);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    if state.config.logging.access_log {
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn run_dispatcher(
    path: &str,
    ctx: &RequestContext,
    state: &AppState,
    entry: &mut AccessLogEntry,
) -> Reply {
    match RequestDispatcher::new(path, ctx, &state.dispatch) {
        Ok(dispatcher) => {
            let name = dispatcher.method_name();
            entry.effective_method = Some(dispatcher.method().to_string());
            logger::log_debug(&format!(
                "{} {path} -> {name} args={:?}",
                dispatcher.method(),
                dispatcher.parsed().args
            ));
            entry.operation = Some(name);
            dispatcher.dispatch(&state.registry)
        }
        Err(err) => {
            let parsed = parse(path);
            entry.operation = Some(build_method_name(&parsed.endpoint, &parsed.verb));
            logger::log_warning(&format!("{} {path}: {err}", ctx.method));
            err.into()
        }
    }
}

/// Collect the body, enforcing `max_body_size` both on the declared
/// Content-Length and on the bytes actually received
async fn read_body<B>(
    headers: &hyper::HeaderMap,
    body: B,
    max_body_size: u64,
) -> Result<Bytes, Reply>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if let Some(size_str) = header_string(headers, CONTENT_LENGTH.as_str()) {
        match size_str.trim().parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                return Err(payload_too_large());
            }
            Ok(_) => {}
            Err(_) => logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            )),
        }
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!("Request body exceeded {max_body_size} bytes"));
            Err(payload_too_large())
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            Err(Reply::new(Value::String("Bad Request".to_string()), 400))
        }
    }
}

fn payload_too_large() -> Reply {
    Reply::new(
        Value::String("Payload Too Large".to_string()),
        PAYLOAD_TOO_LARGE,
    )
}

/// Remove the front-controller prefix.
///
/// The prefix must end at a segment boundary. Paths outside it map to the
/// empty path, which dispatches as an unknown endpoint.
pub fn strip_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => "",
    }
}

fn header_string(headers: &hyper::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
