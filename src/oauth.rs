//! OAuth 2.0 management for YouTube API authentication.
//!
//! Covers the three credential operations the gateway needs: building the
//! consent URL, exchanging an authorization code for tokens, and refreshing
//! an expired access token. Successful exchanges and refreshes are persisted
//! to the [`TokenStore`] before they are returned.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::store::{CredentialRecord, TokenStore};
use crate::youtube_api::channels::ChannelListResponse;
use jiff::Timestamp;
use oauth2::basic::{BasicClient, BasicErrorResponseType, BasicTokenResponse, BasicTokenType};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
};
use std::sync::Arc;

/// Assumed access-token lifetime when the provider omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct OAuthManager {
    settings: Arc<Settings>,
    store: TokenStore,
    http: reqwest::Client,
}

impl OAuthManager {
    pub fn new(settings: Arc<Settings>, store: TokenStore, http: reqwest::Client) -> Self {
        Self {
            settings,
            store,
            http,
        }
    }

    /// Builds the consent URL the user must visit to authorize an account.
    ///
    /// Pure construction, no side effect. `access_type=offline` and
    /// `prompt=consent` are always requested so the provider issues a
    /// refresh token on first authorization.
    pub fn authorization_url(&self) -> Result<url::Url> {
        if self.settings.client_id.is_empty() {
            return Err(Error::Configuration(
                "YOUTUBE_CLIENT_ID is required for the OAuth flow".into(),
            ));
        }
        let client = BasicClient::new(ClientId::new(self.settings.client_id.clone()))
            .set_auth_uri(
                AuthUrl::new(self.settings.oauth_auth_url.clone())
                    .map_err(|e| Error::Configuration(format!("OAUTH_AUTH_URL: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(self.settings.redirect_uri.clone())
                    .map_err(|e| Error::Configuration(format!("YOUTUBE_REDIRECT_URI: {e}")))?,
            );

        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in &self.settings.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, _csrf) = request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url();
        Ok(url)
    }

    /// Exchanges an authorization code for tokens, resolves the channel
    /// identity behind them, and persists the resulting credential record.
    ///
    /// The active-account pointer is only written when it was previously
    /// unset; authorizing an additional account never steals the pointer
    /// from the one already active.
    pub async fn exchange_code(&self, code: &str) -> Result<CredentialRecord> {
        let (client_id, client_secret) = self.require_client_credentials()?;
        let client = BasicClient::new(client_id)
            .set_client_secret(client_secret)
            .set_auth_uri(
                AuthUrl::new(self.settings.oauth_auth_url.clone())
                    .map_err(|e| Error::Configuration(format!("OAUTH_AUTH_URL: {e}")))?,
            )
            .set_token_uri(
                TokenUrl::new(self.settings.oauth_token_url.clone())
                    .map_err(|e| Error::Configuration(format!("OAUTH_TOKEN_URL: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(self.settings.redirect_uri.clone())
                    .map_err(|e| Error::Configuration(format!("YOUTUBE_REDIRECT_URI: {e}")))?,
            );

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| Error::AuthExchange(e.to_string()))?;

        let identity = self
            .fetch_channel_identity(token.access_token().secret())
            .await?;

        let now = Timestamp::now();
        let record = CredentialRecord {
            user_id: identity.id,
            user_name: identity.user_name,
            channel_title: identity.channel_title,
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            token_type: token_type_label(&token),
            expires_in: token_lifetime_secs(&token),
            scopes: token_scopes(&token, &self.settings.scopes),
            created_at: now,
            updated_at: now,
        };

        let pointer_unset = self.store.active_account()?.is_none();
        let record = self.store.upsert(record)?;
        if pointer_unset {
            self.store.set_active(&record.user_id)?;
        }
        tracing::info!(
            user_id = %record.user_id,
            channel = %record.channel_title,
            "authorized account stored"
        );
        Ok(record)
    }

    /// Refreshes the stored access token for `user_id` and updates the
    /// record in place.
    ///
    /// `access_token`, `expires_in` and `updated_at` change; `user_id`,
    /// `created_at` and the stored `refresh_token` do not (providers often
    /// omit the refresh token from refresh responses).
    pub async fn refresh(&self, user_id: &str) -> Result<CredentialRecord> {
        let (client_id, client_secret) = self.require_client_credentials()?;
        let record = self
            .store
            .find(user_id)?
            .ok_or_else(|| Error::UnknownAccount(user_id.to_string()))?;
        let Some(refresh_token) = record.refresh_token.clone() else {
            return Err(Error::AuthRefresh(format!(
                "account {user_id} has no stored refresh token; re-run authorization"
            )));
        };

        tracing::debug!(user_id, "attempting to refresh OAuth token");
        let client = BasicClient::new(client_id)
            .set_client_secret(client_secret)
            .set_token_uri(
                TokenUrl::new(self.settings.oauth_token_url.clone())
                    .map_err(|e| Error::Configuration(format!("OAUTH_TOKEN_URL: {e}")))?,
            );

        let token = match client
            .exchange_refresh_token(&RefreshToken::new(refresh_token))
            .request_async(&self.http)
            .await
        {
            Ok(token) => token,
            Err(oauth2::RequestTokenError::ServerResponse(sr))
                if matches!(sr.error(), BasicErrorResponseType::InvalidGrant) =>
            {
                tracing::warn!(user_id, "refresh token considered invalid grant");
                return Err(Error::AuthRefresh(format!(
                    "refresh token for {user_id} is invalid or revoked; re-run authorization"
                )));
            }
            Err(e) => return Err(Error::AuthRefresh(e.to_string())),
        };

        let mut updated = record;
        updated.access_token = token.access_token().secret().clone();
        updated.expires_in = token_lifetime_secs(&token);
        updated.token_type = token_type_label(&token);
        // None here is backfilled from the stored record by the upsert.
        updated.refresh_token = token.refresh_token().map(|t| t.secret().clone());
        if token.scopes().is_some() {
            updated.scopes = token_scopes(&token, &self.settings.scopes);
        }

        let updated = self.store.upsert(updated)?;
        tracing::debug!(user_id, "access token refreshed");
        Ok(updated)
    }

    fn require_client_credentials(&self) -> Result<(ClientId, ClientSecret)> {
        if self.settings.client_id.is_empty() || self.settings.client_secret.is_empty() {
            return Err(Error::Configuration(
                "YOUTUBE_CLIENT_ID and YOUTUBE_CLIENT_SECRET are required".into(),
            ));
        }
        Ok((
            ClientId::new(self.settings.client_id.clone()),
            ClientSecret::new(self.settings.client_secret.clone()),
        ))
    }

    /// Resolves which channel a freshly issued access token belongs to, via
    /// `channels.list mine=true`.
    async fn fetch_channel_identity(&self, access_token: &str) -> Result<ChannelIdentity> {
        let url = format!(
            "{}/channels",
            self.settings.api_base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .get(&url)
            .query(&[("part", "snippet"), ("mine", "true")])
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|e| Error::AuthExchange(format!("fetch channel identity: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AuthExchange(format!(
                "fetch channel identity: {status}: {body}"
            )));
        }
        let channels: ChannelListResponse = response
            .json()
            .await
            .map_err(|e| Error::AuthExchange(format!("parse channel identity: {e}")))?;

        let Some(channel) = channels.items.into_iter().next() else {
            return Err(Error::AuthExchange(
                "authorized token is not associated with any channel".into(),
            ));
        };
        let user_name = channel
            .snippet
            .custom_url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| channel.snippet.title.clone());
        Ok(ChannelIdentity {
            id: channel.id,
            user_name,
            channel_title: channel.snippet.title,
        })
    }
}

struct ChannelIdentity {
    id: String,
    user_name: String,
    channel_title: String,
}

fn token_lifetime_secs(token: &BasicTokenResponse) -> i64 {
    token
        .expires_in()
        .map(|d| d.as_secs() as i64)
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
}

fn token_type_label(token: &BasicTokenResponse) -> String {
    match token.token_type() {
        BasicTokenType::Bearer => "Bearer".to_string(),
        other => serde_json::to_value(other)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "Bearer".to_string()),
    }
}

fn token_scopes(token: &BasicTokenResponse, fallback: &[String]) -> Vec<String> {
    token
        .scopes()
        .map(|scopes| scopes.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| fallback.to_vec())
}
