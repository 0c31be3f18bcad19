//! HTTP host for the tool surface.
//!
//! Routes:
//! - `GET  /tools` — names of every callable tool
//! - `POST /tools/{name}` — invoke a tool; the JSON body is the flat
//!   parameter object, the response is the remote API's payload unmodified
//! - `GET  {redirect path}` — the OAuth callback (confirmation page)
//!
//! Tool failures come back as `{"error": {"kind", "message"}}`, with 400 for
//! caller mistakes and 500 otherwise.

use crate::callback;
use crate::error::{Error, Result};
use crate::tools::{TOOL_NAMES, Toolbox};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use serde_json::{Value, json};
use std::sync::Arc;

enum Route<'a> {
    ListTools,
    CallTool(&'a str),
    Callback,
    NotFound,
}

fn route<'a>(method: &Method, path: &'a str, callback_path: &str) -> Route<'a> {
    if *method == Method::GET && path == "/tools" {
        Route::ListTools
    } else if *method == Method::POST
        && let Some(tool) = path.strip_prefix("/tools/")
    {
        Route::CallTool(tool)
    } else if *method == Method::GET && path == callback_path {
        Route::Callback
    } else {
        Route::NotFound
    }
}

/// Serves the tool surface until the process is stopped.
pub async fn serve(toolbox: Arc<Toolbox>) -> Result<()> {
    let settings = toolbox.settings();
    let (_, _, callback_path) = settings.redirect_parts()?;
    let listener =
        tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    tracing::info!(
        host = %settings.host,
        port = settings.port,
        tools = TOOL_NAMES.len(),
        "tool server listening"
    );

    loop {
        let (conn, peer) = listener.accept().await?;
        let io = hyper_util::rt::TokioIo::new(conn);
        let toolbox = Arc::clone(&toolbox);
        let callback_path = callback_path.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let toolbox = Arc::clone(&toolbox);
                let callback_path = callback_path.clone();
                async move { Ok::<_, std::convert::Infallible>(handle(toolbox, &callback_path, req).await) }
            });
            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, service)
                .await
            {
                tracing::debug!(%peer, "connection error: {e}");
            }
        });
    }
}

async fn handle(
    toolbox: Arc<Toolbox>,
    callback_path: &str,
    req: Request<body::Incoming>,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    match route(&method, &path, callback_path) {
        Route::ListTools => json_response(StatusCode::OK, &json!({ "tools": TOOL_NAMES })),
        Route::CallTool(tool) => {
            let tool = tool.to_string();
            let params = match read_params(&tool, req).await {
                Ok(params) => params,
                Err(e) => {
                    return json_response(StatusCode::BAD_REQUEST, &error_body(&e));
                }
            };
            tracing::debug!(%tool, "tool call");
            match toolbox.dispatch(&tool, params).await {
                Ok(result) => json_response(StatusCode::OK, &result),
                Err(e) => {
                    tracing::warn!(%tool, error = %e, "tool call failed");
                    let status = if e.is_caller_error() {
                        StatusCode::BAD_REQUEST
                    } else {
                        StatusCode::INTERNAL_SERVER_ERROR
                    };
                    json_response(status, &error_body(&e))
                }
            }
        }
        Route::Callback => {
            let outcome = callback::process_redirect(toolbox.oauth(), req.uri().query()).await;
            let (status, html) = callback::render(&outcome);
            Response::builder()
                .status(status)
                .header("Content-Type", "text/html; charset=utf-8")
                .body(Full::from(html))
                .expect("static response parts are valid")
        }
        Route::NotFound => json_response(
            StatusCode::NOT_FOUND,
            &json!({ "error": { "kind": "not_found", "message": format!("no route for {method} {path}") } }),
        ),
    }
}

/// Reads the request body as the tool's parameter object. An empty body is
/// the empty object, for tools that take no parameters.
async fn read_params(tool: &str, req: Request<body::Incoming>) -> Result<Value> {
    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| Error::InvalidParams {
            tool: tool.to_string(),
            message: format!("read request body: {e}"),
        })?
        .to_bytes();
    if bytes.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_slice(&bytes).map_err(|e| Error::InvalidParams {
        tool: tool.to_string(),
        message: format!("request body is not JSON: {e}"),
    })
}

fn error_body(e: &Error) -> Value {
    json!({ "error": { "kind": e.kind(), "message": e.to_string() } })
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::from(body.to_string()))
        .expect("static response parts are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_parsing() {
        assert!(matches!(
            route(&Method::GET, "/tools", "/callback"),
            Route::ListTools
        ));
        assert!(matches!(
            route(&Method::POST, "/tools/youtube_accounts_list", "/callback"),
            Route::CallTool("youtube_accounts_list")
        ));
        assert!(matches!(
            route(&Method::GET, "/callback", "/callback"),
            Route::Callback
        ));
        assert!(matches!(
            route(&Method::GET, "/oauth/done", "/oauth/done"),
            Route::Callback
        ));
        assert!(matches!(
            route(&Method::GET, "/tools/youtube_accounts_list", "/callback"),
            Route::NotFound
        ));
        assert!(matches!(
            route(&Method::POST, "/callback", "/callback"),
            Route::NotFound
        ));
    }

    #[test]
    fn test_error_body_shape() {
        let body = error_body(&Error::UnknownTool("nope".into()));
        assert_eq!(body["error"]["kind"], "unknown_tool");
        assert_eq!(body["error"]["message"], "unknown tool: nope");
    }
}
