//! Environment-driven configuration for the tool gateway.

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Scope requested when `YOUTUBE_SCOPES` is not set.
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

/// Runtime settings, resolved once at startup from the process environment.
///
/// The binaries load a `.env` file first (via `dotenvy`), so local development
/// works without exporting anything by hand.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind address for the tool server.
    pub host: String,
    /// Bind port for the tool server.
    pub port: u16,

    /// OAuth application credentials. May be empty; flows that need them
    /// fail with a configuration error when first used.
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI registered with the OAuth application. The callback
    /// receiver binds to this URI's host and port.
    pub redirect_uri: String,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,

    /// Overrides the active-account pointer when set (`YOUTUBE_ACCOUNT_ID`).
    pub account_id_override: Option<String>,

    /// State files.
    pub token_store_path: PathBuf,
    pub active_account_path: PathBuf,

    /// Provider endpoints. Overridable so tests can point at a stub.
    pub oauth_auth_url: String,
    pub oauth_token_url: String,
    pub api_base_url: String,
    pub upload_base_url: String,

    /// Bound applied to every outgoing HTTP request.
    pub http_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let port = env_or("PORT", "9000")
            .parse::<u16>()
            .map_err(|e| Error::Configuration(format!("PORT: {e}")))?;
        let http_timeout = env_or("HTTP_TIMEOUT", "30")
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| Error::Configuration(format!("HTTP_TIMEOUT: {e}")))?;

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port,
            client_id: env_or("YOUTUBE_CLIENT_ID", ""),
            client_secret: env_or("YOUTUBE_CLIENT_SECRET", ""),
            redirect_uri: env_or("YOUTUBE_REDIRECT_URI", "http://127.0.0.1:9000/callback"),
            scopes: split_scopes(&env_or("YOUTUBE_SCOPES", DEFAULT_SCOPE)),
            account_id_override: env::var("YOUTUBE_ACCOUNT_ID").ok().filter(|v| !v.is_empty()),
            token_store_path: PathBuf::from(env_or("TOKEN_STORE_PATH", ".tokens.json")),
            active_account_path: PathBuf::from(env_or("ACTIVE_ACCOUNT_PATH", ".active_account")),
            oauth_auth_url: env_or(
                "OAUTH_AUTH_URL",
                "https://accounts.google.com/o/oauth2/v2/auth",
            ),
            oauth_token_url: env_or("OAUTH_TOKEN_URL", "https://oauth2.googleapis.com/token"),
            api_base_url: env_or(
                "YOUTUBE_API_BASE_URL",
                "https://www.googleapis.com/youtube/v3",
            ),
            upload_base_url: env_or(
                "YOUTUBE_UPLOAD_BASE_URL",
                "https://www.googleapis.com/upload/youtube/v3",
            ),
            http_timeout,
        })
    }

    /// Splits the configured redirect URI into the pieces the callback
    /// receiver needs: bind host, bind port, and the request path to match.
    pub fn redirect_parts(&self) -> Result<(String, u16, String)> {
        let url = url::Url::parse(&self.redirect_uri)
            .map_err(|e| Error::Configuration(format!("YOUTUBE_REDIRECT_URI: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::Configuration("YOUTUBE_REDIRECT_URI has no host".into()))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);
        let path = match url.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };
        Ok((host, port, path))
    }
}

fn env_or(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Accepts space- or comma-separated scope lists.
pub fn split_scopes(raw: &str) -> Vec<String> {
    raw.replace(',', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scopes_space_separated() {
        let scopes = split_scopes("a b  c");
        assert_eq!(scopes, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_scopes_comma_and_mixed() {
        let scopes = split_scopes("a,b, c");
        assert_eq!(scopes, vec!["a", "b", "c"]);
        assert!(split_scopes("  ").is_empty());
    }

    fn settings_with_redirect(uri: &str) -> Settings {
        Settings {
            host: "0.0.0.0".into(),
            port: 9000,
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: uri.into(),
            scopes: vec![DEFAULT_SCOPE.into()],
            account_id_override: None,
            token_store_path: PathBuf::from(".tokens.json"),
            active_account_path: PathBuf::from(".active_account"),
            oauth_auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            oauth_token_url: "https://oauth2.googleapis.com/token".into(),
            api_base_url: "https://www.googleapis.com/youtube/v3".into(),
            upload_base_url: "https://www.googleapis.com/upload/youtube/v3".into(),
            http_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_redirect_parts() {
        let settings = settings_with_redirect("http://127.0.0.1:8080/callback");
        let (host, port, path) = settings.redirect_parts().unwrap();
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 8080);
        assert_eq!(path, "/callback");
    }

    #[test]
    fn test_redirect_parts_default_port_and_path() {
        let settings = settings_with_redirect("http://localhost");
        let (host, port, path) = settings.redirect_parts().unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 80);
        assert_eq!(path, "/");
    }

    #[test]
    fn test_redirect_parts_rejects_garbage() {
        let settings = settings_with_redirect("not a uri");
        assert!(matches!(
            settings.redirect_parts(),
            Err(Error::Configuration(_))
        ));
    }
}
