//! Error taxonomy for the tool gateway.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The OAuth application is misconfigured (missing client id/secret,
    /// unparsable redirect URI). Fatal; surfaced immediately.
    #[error("invalid OAuth application configuration: {0}")]
    Configuration(String),

    /// The provider rejected the authorization-code exchange.
    #[error("authorization code exchange failed: {0}")]
    AuthExchange(String),

    /// The provider rejected the refresh grant. The stored refresh token is
    /// no longer usable and the account must go through the full
    /// authorization flow again.
    #[error("token refresh failed: {0}")]
    AuthRefresh(String),

    /// The referenced account id is not present in the token store.
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// A passthrough API call came back non-2xx. Carries the provider's
    /// status and response body verbatim; never retried.
    #[error("YouTube API error {status}: {message}")]
    RemoteApi { status: u16, message: String },

    /// The token store or active-account file is unreadable or corrupt.
    #[error("token store unusable: {0}")]
    Store(String),

    /// The tool host was asked for a tool it does not expose.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The caller's parameters for a tool did not deserialize.
    #[error("invalid parameters for {tool}: {message}")]
    InvalidParams { tool: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Stable machine-readable tag used in tool-surface error objects.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration_error",
            Error::AuthExchange(_) => "auth_exchange_error",
            Error::AuthRefresh(_) => "auth_refresh_error",
            Error::UnknownAccount(_) => "unknown_account_error",
            Error::RemoteApi { .. } => "remote_api_error",
            Error::Store(_) => "store_error",
            Error::UnknownTool(_) => "unknown_tool",
            Error::InvalidParams { .. } => "invalid_params",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Http(_) => "http_error",
        }
    }

    /// Whether the failure is the caller's fault (bad tool name or
    /// parameters) rather than a gateway/provider failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownTool(_) | Error::InvalidParams { .. } | Error::UnknownAccount(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_api_error_display_carries_status_and_body() {
        let err = Error::RemoteApi {
            status: 403,
            message: "quotaExceeded".into(),
        };
        assert_eq!(err.to_string(), "YouTube API error 403: quotaExceeded");
        assert_eq!(err.kind(), "remote_api_error");
    }

    #[test]
    fn test_caller_errors_are_classified() {
        assert!(Error::UnknownTool("nope".into()).is_caller_error());
        assert!(Error::UnknownAccount("UCx".into()).is_caller_error());
        assert!(
            !Error::RemoteApi {
                status: 500,
                message: String::new()
            }
            .is_caller_error()
        );
    }
}
