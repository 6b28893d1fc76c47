use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::ext::ReasonPhrase;
use hyper::{Method, Request, Response};
use serde_json::{json, Value};

use restgate::config::{AppState, Config};
use restgate::dispatch::{HandlerError, MethodFilter, Operation, Registry, Resource};
use restgate::handler::handle_request;

/// A resource shaped like a typical file API
struct Files;

impl Resource for Files {
    fn endpoint(&self) -> &str {
        "files"
    }

    fn operations(self: Arc<Self>) -> Vec<Operation> {
        vec![
            Operation::new("", MethodFilter::GET, |call| {
                Ok(json!({"id": call.arg(0), "filter": call.param("filter")}))
            }),
            Operation::new("", MethodFilter::DELETE, |call| {
                call.arg(0)
                    .map(|id| json!({"deleted": id, "reason": call.param_str("reason")}))
                    .ok_or_else(|| HandlerError::bad_request("id required"))
            }),
            Operation::new("", MethodFilter::PUT, |call| {
                Ok(json!({"replaced": call.arg(0), "with": call.read_raw_body()}))
            }),
            Operation::new("process", MethodFilter::POST, |call| {
                Ok(json!({"processed": call.args}))
            }),
        ]
    }
}

fn state(toml: &str) -> Arc<AppState> {
    let mut config = Config::from_toml(toml).unwrap();
    config.logging.access_log = false;
    let mut registry = Registry::new();
    registry.mount(Arc::new(Files));
    Arc::new(AppState::new(config, registry))
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (u16, String, Value) {
    let resp: Response<Full<Bytes>> = handle_request(req, Arc::clone(state), peer())
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let reason = resp
        .extensions()
        .get::<ReasonPhrase>()
        .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
        .unwrap_or_default();
    assert_eq!(resp.headers()["Content-Type"], "application/json");
    assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    assert_eq!(resp.headers()["Access-Control-Allow-Methods"], "*");
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, reason, serde_json::from_slice(&bytes).unwrap())
}

fn request(method: Method, uri: &str) -> hyper::http::request::Builder {
    Request::builder().method(method).uri(uri)
}

#[tokio::test]
async fn get_with_query_is_sanitized() {
    let state = state("");
    let req = request(Method::GET, "/files/12/?filter=%3Cb%3Enew%3C%2Fb%3E+")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, reason, body) = send(&state, req).await;
    assert_eq!(status, 200);
    assert_eq!(reason, "OK");
    assert_eq!(body, json!({"id": "12", "filter": "new"}));
}

#[tokio::test]
async fn unknown_endpoint_is_404() {
    let state = state("");
    let req = request(Method::GET, "/users/1")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, reason, body) = send(&state, req).await;
    assert_eq!(status, 404);
    assert_eq!(reason, "Not Found");
    assert_eq!(body, json!("No Endpoint: users"));
}

#[tokio::test]
async fn post_override_delete_reads_form_body() {
    let state = state("");
    let req = request(Method::POST, "/files/7?reason=query")
        .header("X-HTTP-Method", "DELETE")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Full::new(Bytes::from("reason=%3Ci%3Eobsolete%3C%2Fi%3E")))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"deleted": "7", "reason": "obsolete"}));
}

#[tokio::test]
async fn post_override_put_reads_raw_json() {
    let state = state("");
    let req = request(Method::POST, "/files/9")
        .header("X-HTTP-Method", "PUT")
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(r#"{"name":"b.txt"}"#)))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"replaced": "9", "with": {"name": "b.txt"}}));
}

#[tokio::test]
async fn invalid_override_is_400() {
    let state = state("");
    let req = request(Method::POST, "/files/9")
        .header("X-HTTP-Method", "PATCH")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, reason, body) = send(&state, req).await;
    assert_eq!(status, 400);
    assert_eq!(reason, "Bad Request");
    assert_eq!(body, json!("Unexpected Header: PATCH"));
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let state = state("");
    let req = request(Method::PATCH, "/files/9")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, reason, body) = send(&state, req).await;
    assert_eq!(status, 405);
    assert_eq!(reason, "Method Not Allowed");
    assert_eq!(body, json!("Invalid Method"));
}

#[tokio::test]
async fn verb_dispatch_and_handler_errors() {
    let state = state("");
    let req = request(Method::POST, "/files/process/1/2")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"processed": ["1", "2"]}));

    let req = request(Method::DELETE, "/files")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!("id required"));
}

#[tokio::test]
async fn path_prefix_is_stripped() {
    let state = state("[http]\npath_prefix = \"/api/v1\"");
    let req = request(Method::GET, "/api/v1/files/3")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], "3");

    let req = request(Method::GET, "/files/3")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!("No Endpoint: "));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let state = state("[http]\nmax_body_size = 8");
    let req = request(Method::POST, "/files/process")
        .body(Full::new(Bytes::from("0123456789abcdef")))
        .unwrap();
    let (status, reason, body) = send(&state, req).await;
    assert_eq!(status, 413);
    assert_eq!(reason, "Internal Server Error");
    assert_eq!(body, json!("Payload Too Large"));
}

#[tokio::test]
async fn deeply_nested_form_key_is_ignored() {
    let state = state("");
    let body = format!("junk{}=1&reason=kept", "[x]".repeat(100_000));
    let req = request(Method::POST, "/files/5")
        .header("X-HTTP-Method", "DELETE")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Full::new(Bytes::from(body)))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"deleted": "5", "reason": "kept"}));
}

#[tokio::test]
async fn oversized_list_query_is_truncated() {
    let state = state("");
    let uri = format!("/files/1?{}filter=late", "tags[]=x&".repeat(5_000));
    let req = request(Method::GET, &uri)
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"id": "1", "filter": null}));
}

#[tokio::test]
async fn custom_override_header() {
    let state = state("[http]\noverride_header = \"X-Method-Override\"");
    let req = request(Method::POST, "/files/4")
        .header("X-Method-Override", "DELETE")
        .header("X-HTTP-Method", "PATCH")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let (status, _, body) = send(&state, req).await;
    assert_eq!(status, 200);
    assert_eq!(body["deleted"], "4");
}

#[tokio::test]
async fn requests_are_counted() {
    let state = state("");
    for _ in 0..3 {
        let req = request(Method::GET, "/files")
            .body(Full::new(Bytes::new()))
            .unwrap();
        send(&state, req).await;
    }
    assert_eq!(
        state.requests.load(std::sync::atomic::Ordering::Relaxed),
        3
    );
}
