//! OAuth redirect receiver.
//!
//! The identity provider sends the user's browser back to the configured
//! redirect URI with an authorization code in the query string. The handler
//! here exchanges that code synchronously and answers the browser with a
//! small human-readable page. It backs two hosts: the long-running tool
//! server's callback route, and a short-lived listener the CLI spins up for
//! exactly one authorization.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::oauth::OAuthManager;
use crate::store::CredentialRecord;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response, body};
use std::time::Duration;
use tokio::sync::mpsc;

pub(crate) enum CallbackOutcome {
    /// The redirect carried no usable code (or an explicit provider error).
    /// The store was not touched.
    Rejected(String),
    /// Code exchange against the provider failed.
    Failed(Error),
    Authorized(CredentialRecord),
}

/// Parses the redirect query string and, when a code is present, runs the
/// exchange. A missing code or a provider `error` parameter short-circuits
/// before any store access.
pub(crate) async fn process_redirect(oauth: &OAuthManager, query: Option<&str>) -> CallbackOutcome {
    let mut code = None;
    let mut error = None;
    for (k, v) in form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
        match &*k {
            "code" => code = Some(v.into_owned()),
            "error" => error = Some(v.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return CallbackOutcome::Rejected(format!("authorization was not granted: {error}"));
    }
    let Some(code) = code else {
        return CallbackOutcome::Rejected("no authorization code in redirect".into());
    };

    match oauth.exchange_code(&code).await {
        Ok(record) => CallbackOutcome::Authorized(record),
        Err(e) => {
            tracing::error!("authorization code exchange failed: {e}");
            CallbackOutcome::Failed(e)
        }
    }
}

pub(crate) fn render(outcome: &CallbackOutcome) -> (StatusCode, String) {
    match outcome {
        CallbackOutcome::Authorized(record) => (
            StatusCode::OK,
            page(
                "Authorization complete",
                &format!(
                    "Connected <strong>{}</strong>. You can close this tab.",
                    record.channel_title
                ),
            ),
        ),
        CallbackOutcome::Rejected(reason) => (
            StatusCode::BAD_REQUEST,
            page("Authorization incomplete", reason),
        ),
        CallbackOutcome::Failed(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            page("Authorization failed", &e.to_string()),
        ),
    }
}

fn page(title: &str, detail: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{detail}</p></body></html>"
    )
}

/// Runs a listener on the configured redirect URI until one authorization
/// completes (successfully or not), then shuts it down.
///
/// Rejected redirects (no code, stray browser requests) keep the listener
/// alive so the user can retry from the consent page.
pub async fn receive_authorization(
    oauth: &OAuthManager,
    settings: &Settings,
) -> Result<CredentialRecord> {
    let (host, port, path) = settings.redirect_parts()?;
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!(%host, port, %path, "listening for the OAuth redirect");

    let (tx, mut rx) = mpsc::channel::<Result<CredentialRecord>>(1);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (conn, _) = accepted?;
                let io = hyper_util::rt::TokioIo::new(conn);
                let oauth = oauth.clone();
                let tx = tx.clone();
                let path = path.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<body::Incoming>| {
                        let oauth = oauth.clone();
                        let tx = tx.clone();
                        let path = path.clone();
                        async move {
                            if req.uri().path() != path {
                                return Ok::<_, std::convert::Infallible>(html_response(
                                    StatusCode::NOT_FOUND,
                                    page("Not found", "nothing to see here"),
                                ));
                            }
                            let outcome = process_redirect(&oauth, req.uri().query()).await;
                            let (status, body) = render(&outcome);
                            match outcome {
                                CallbackOutcome::Authorized(record) => {
                                    let _ = tx.send(Ok(record)).await;
                                }
                                CallbackOutcome::Failed(e) => {
                                    let _ = tx.send(Err(e)).await;
                                }
                                CallbackOutcome::Rejected(reason) => {
                                    tracing::warn!(%reason, "ignoring redirect without a code");
                                }
                            }
                            Ok(html_response(status, body))
                        }
                    });
                    if let Err(e) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        tracing::debug!("redirect connection error: {e}");
                    }
                });
            }
            received = rx.recv() => {
                // let the confirmation page flush before the listener drops
                tokio::time::sleep(Duration::from_millis(200)).await;
                return received.expect("a sender is held by this loop");
            }
        }
    }
}

fn html_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::from(body))
        .expect("static response parts are valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TokenStore;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn oauth(dir: &tempfile::TempDir) -> (OAuthManager, TokenStore) {
        let settings = Arc::new(Settings {
            host: "127.0.0.1".into(),
            port: 0,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://127.0.0.1:9000/callback".into(),
            scopes: vec![],
            account_id_override: None,
            token_store_path: dir.path().join("tokens.json"),
            active_account_path: dir.path().join("active_account"),
            oauth_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            oauth_token_url: "https://oauth2.googleapis.com/token".into(),
            api_base_url: "https://www.googleapis.com/youtube/v3".into(),
            upload_base_url: "https://www.googleapis.com/upload/youtube/v3".into(),
            http_timeout: std::time::Duration::from_secs(5),
        });
        let store = TokenStore::new(
            PathBuf::from(&settings.token_store_path),
            PathBuf::from(&settings.active_account_path),
        );
        (
            OAuthManager::new(settings, store.clone(), reqwest::Client::new()),
            store,
        )
    }

    #[tokio::test]
    async fn test_redirect_without_code_is_rejected_and_store_untouched() {
        let dir = tempfile::TempDir::new().unwrap();
        let (oauth, store) = oauth(&dir);

        let outcome = process_redirect(&oauth, Some("state=abc")).await;
        assert!(matches!(outcome, CallbackOutcome::Rejected(_)));
        let (status, _) = render(&outcome);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let outcome = process_redirect(&oauth, None).await;
        assert!(matches!(outcome, CallbackOutcome::Rejected(_)));

        assert!(store.load().unwrap().is_empty());
        assert!(!dir.path().join("tokens.json").exists());
    }

    #[tokio::test]
    async fn test_provider_error_parameter_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let (oauth, store) = oauth(&dir);

        let outcome = process_redirect(&oauth, Some("error=access_denied")).await;
        match outcome {
            CallbackOutcome::Rejected(reason) => assert!(reason.contains("access_denied")),
            _ => panic!("expected rejection"),
        }
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exchange_without_client_config_fails_without_store_write() {
        let dir = tempfile::TempDir::new().unwrap();
        let (oauth, store) = oauth(&dir);

        // a code is present, but the exchange cannot even start without
        // client credentials configured
        let outcome = process_redirect(&oauth, Some("code=4/abc")).await;
        match outcome {
            CallbackOutcome::Failed(Error::Configuration(_)) => {}
            _ => panic!("expected a configuration failure"),
        }
        assert!(store.load().unwrap().is_empty());
    }
}
