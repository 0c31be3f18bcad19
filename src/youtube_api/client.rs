//! Authenticated passthrough client for the YouTube Data API v3.
//!
//! Every gateway call follows the same shape: resolve the active account's
//! access token (refreshing it first when it has expired), issue exactly one
//! HTTP request with the caller's parameters, and hand back the remote
//! response body as raw JSON. Failures carry the provider's status and
//! message verbatim and are never retried here.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::oauth::OAuthManager;
use crate::store::TokenStore;
use bytes::Bytes;
use http::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct YouTubeClient {
    settings: Arc<Settings>,
    store: TokenStore,
    oauth: OAuthManager,
    http: reqwest::Client,
}

impl YouTubeClient {
    pub fn new(
        settings: Arc<Settings>,
        store: TokenStore,
        oauth: OAuthManager,
        http: reqwest::Client,
    ) -> Self {
        Self {
            settings,
            store,
            oauth,
            http,
        }
    }

    /// Gets a guaranteed-fresh access token for the active account.
    ///
    /// Resolution order for "active" is the env override, the pointer file,
    /// then the most recently stored record. A token past its expiry window
    /// (`updated_at + expires_in`, minus a safety margin) is refreshed and
    /// persisted before being returned; a failed refresh surfaces as
    /// [`Error::AuthRefresh`] and the account must be re-authorized.
    pub(crate) async fn fresh_access_token(&self) -> Result<String> {
        let record = self
            .store
            .resolve_active(self.settings.account_id_override.as_deref())?;
        if record.is_expired() {
            tracing::debug!(user_id = %record.user_id, "access token expired, refreshing before call");
            let record = self.oauth.refresh(&record.user_id).await?;
            return Ok(record.access_token);
        }
        Ok(record.access_token)
    }

    /// Makes one authenticated request against the Data API base URL and
    /// returns the response body as raw JSON.
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        query_params: &[(&str, &str)],
        json_body: Option<&Value>,
    ) -> Result<Value> {
        let url = format!(
            "{}/{}",
            self.settings.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let access_token = self.fresh_access_token().await?;

        let mut request = self
            .http
            .request(method, &url)
            .header("Authorization", format!("Bearer {access_token}"))
            .query(query_params);
        if let Some(body) = json_body {
            request = request.json(body);
        }

        let response = request.send().await?;
        into_json(response).await
    }

    /// Lists broadcasts filtered by lifecycle status.
    ///
    /// `channelId` is sent when known instead of `mine=true`: the remote API
    /// rejects `mine` combined with `broadcastStatus` as incompatible
    /// parameters.
    pub async fn list_broadcasts(
        &self,
        broadcast_status: &str,
        channel_id: Option<&str>,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<Value> {
        let max_results = max_results.to_string();
        let mut query = vec![
            ("broadcastStatus", broadcast_status),
            ("part", "snippet,contentDetails,status"),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(id) = channel_id {
            query.push(("channelId", id));
        }
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        self.request(Method::GET, "liveBroadcasts", &query, None)
            .await
    }

    pub async fn get_broadcast(&self, broadcast_id: &str, part: &str) -> Result<Value> {
        let query = [("id", broadcast_id), ("part", part)];
        self.request(Method::GET, "liveBroadcasts", &query, None)
            .await
    }

    pub async fn insert_broadcast(&self, body: &Value) -> Result<Value> {
        let query = [("part", "snippet,contentDetails,status")];
        self.request(Method::POST, "liveBroadcasts", &query, Some(body))
            .await
    }

    /// Binds a broadcast to the stream that will carry its video.
    pub async fn bind_broadcast(&self, broadcast_id: &str, stream_id: &str) -> Result<Value> {
        let query = [
            ("id", broadcast_id),
            ("streamId", stream_id),
            ("part", "snippet,contentDetails,status"),
        ];
        self.request(Method::POST, "liveBroadcasts/bind", &query, None)
            .await
    }

    pub async fn get_stream(&self, stream_id: &str, part: &str) -> Result<Value> {
        let query = [("id", stream_id), ("part", part)];
        self.request(Method::GET, "liveStreams", &query, None).await
    }

    pub async fn insert_stream(&self, body: &Value) -> Result<Value> {
        let query = [("part", "snippet,cdn,contentDetails,status")];
        self.request(Method::POST, "liveStreams", &query, Some(body))
            .await
    }

    pub async fn list_chat_messages(
        &self,
        live_chat_id: &str,
        part: &str,
        max_results: u32,
        page_token: Option<&str>,
    ) -> Result<Value> {
        let max_results = max_results.to_string();
        let mut query = vec![
            ("liveChatId", live_chat_id),
            ("part", part),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        self.request(Method::GET, "liveChat/messages", &query, None)
            .await
    }

    pub async fn insert_chat_message(&self, body: &Value) -> Result<Value> {
        let query = [("part", "snippet")];
        self.request(Method::POST, "liveChat/messages", &query, Some(body))
            .await
    }

    /// Uploads a thumbnail image for a video (the broadcast id, for live
    /// events) via the upload endpoint.
    #[instrument(skip(self))]
    pub async fn set_thumbnail(&self, video_id: &str, file_path: &str) -> Result<Value> {
        let image = Bytes::from(tokio::fs::read(file_path).await?);
        let content_type = if file_path.to_ascii_lowercase().ends_with(".png") {
            "image/png"
        } else {
            "image/jpeg"
        };

        let url = format!(
            "{}/thumbnails/set",
            self.settings.upload_base_url.trim_end_matches('/')
        );
        let access_token = self.fresh_access_token().await?;
        let response = self
            .http
            .post(&url)
            .query(&[("videoId", video_id), ("uploadType", "media")])
            .header("Authorization", format!("Bearer {access_token}"))
            .header("Content-Type", content_type)
            .body(image)
            .send()
            .await?;
        into_json(response).await
    }
}

/// Turns a remote response into its JSON body, or a [`Error::RemoteApi`]
/// carrying the provider's status and message verbatim.
async fn into_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        tracing::error!(status = status.as_u16(), %message, "YouTube API request failed");
        return Err(Error::RemoteApi {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}
