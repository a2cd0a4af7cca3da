use std::{collections::BTreeMap, time::Duration};

use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Redirect},
    routing::{any, delete, get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What `/echo` saw of the request it received.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub const INT_BODY: &str = "20220322075441";
pub const YAML_BODY: &str = "name: web\ntags:\n  - a\n  - b\n";

pub fn app() -> Router {
    Router::new()
        .route("/get", get(|| async { json_text(r#"{"get":"t"}"#) }))
        .route("/int", get(|| async { INT_BODY }))
        .route("/post", post(|| async { json_text(r#"{"post":"t","c":"t"}"#) }))
        .route("/put", put(|| async { json_text(r#"{"put":"t"}"#) }))
        .route("/patch", patch(|| async { json_text(r#"{"patch":"t"}"#) }))
        .route("/delete", delete(|| async { json_text(r#"{"delete":"t"}"#) }))
        .route("/yaml", get(|| async { ([(header::CONTENT_TYPE, "application/yaml")], YAML_BODY) }))
        .route("/empty", get(|| async { StatusCode::OK }))
        .route("/redirect", get(|| async { Redirect::to("/get") }))
        .route("/status/{code}", any(status))
        .route("/slow/{millis}", get(slow))
        .route("/big/{len}", get(big))
        .route("/echo", any(echo))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn json_text(body: &'static str) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], body)
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

async fn slow(Path(millis): Path<u64>) -> impl IntoResponse {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    json_text(r#"{"slow":"t"}"#)
}

/// `len` bytes of `x`, for bodies past any client-side size cap.
async fn big(Path(len): Path<usize>) -> String {
    "x".repeat(len)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    Json(Echo {
        method: method.to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    })
}
