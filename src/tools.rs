//! The callable tool surface.
//!
//! Each tool takes a flat set of named fields (mirroring the remote API's
//! own parameter names) and returns the remote response unmodified, so an
//! agent host can forward calls without knowing anything about YouTube
//! beyond the tool contract. [`Toolbox`] owns the wiring: settings, the
//! token store, the OAuth manager, and the passthrough API client.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::oauth::OAuthManager;
use crate::store::TokenStore;
use crate::youtube_api::{
    LiveBroadcastContentDetails, LiveBroadcastInsertRequest, LiveBroadcastInsertSnippet,
    LiveBroadcastInsertStatus, LiveChatMessageInsertRequest, LiveStreamCdn,
    LiveStreamContentDetails, LiveStreamInsertRequest, LiveStreamInsertSnippet, YouTubeClient,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

/// Every tool the gateway exposes, in a stable order.
pub const TOOL_NAMES: &[&str] = &[
    "youtube_oauth_authorization_url",
    "youtube_oauth_exchange_code",
    "youtube_oauth_refresh_token",
    "youtube_live_broadcasts_list_completed",
    "youtube_live_broadcasts_list_upcoming",
    "youtube_live_broadcasts_list_by_status",
    "youtube_live_broadcasts_get",
    "youtube_live_broadcasts_insert",
    "youtube_live_broadcasts_bind",
    "youtube_live_streams_get",
    "youtube_live_streams_insert",
    "youtube_thumbnails_set",
    "youtube_live_chats_list",
    "youtube_live_chat_messages_list",
    "youtube_live_chat_messages_insert",
    "youtube_accounts_list",
    "youtube_accounts_set_active",
];

pub struct Toolbox {
    settings: Arc<Settings>,
    store: TokenStore,
    oauth: OAuthManager,
    youtube: YouTubeClient,
}

impl Toolbox {
    pub fn new(settings: Settings) -> Result<Self> {
        let settings = Arc::new(settings);
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(settings.http_timeout)
            .build()?;
        let store = TokenStore::new(&settings.token_store_path, &settings.active_account_path);
        let oauth = OAuthManager::new(Arc::clone(&settings), store.clone(), http.clone());
        let youtube = YouTubeClient::new(
            Arc::clone(&settings),
            store.clone(),
            oauth.clone(),
            http,
        );
        Ok(Self {
            settings,
            store,
            oauth,
            youtube,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn oauth(&self) -> &OAuthManager {
        &self.oauth
    }

    /// Runs one tool call to completion.
    pub async fn dispatch(&self, tool: &str, params: Value) -> Result<Value> {
        match tool {
            "youtube_oauth_authorization_url" => {
                let url = self.oauth.authorization_url()?;
                Ok(json!({ "authorization_url": url.as_str() }))
            }
            "youtube_oauth_exchange_code" => {
                let p: OAuthExchangeParams = parse(tool, params)?;
                let record = self.oauth.exchange_code(&p.code).await?;
                Ok(serde_json::to_value(record)?)
            }
            "youtube_oauth_refresh_token" => {
                let p: OAuthRefreshParams = parse(tool, params)?;
                let record = self.oauth.refresh(&p.user_id).await?;
                Ok(serde_json::to_value(record)?)
            }
            "youtube_live_broadcasts_list_completed" => {
                let p: BroadcastsListParams = parse(tool, params)?;
                self.list_broadcasts("completed", p).await
            }
            "youtube_live_broadcasts_list_upcoming" => {
                let p: BroadcastsListParams = parse(tool, params)?;
                self.list_broadcasts("upcoming", p).await
            }
            "youtube_live_broadcasts_list_by_status" => {
                let BroadcastsListByStatusParams {
                    broadcast_status,
                    rest,
                } = parse(tool, params)?;
                self.list_broadcasts(&broadcast_status, rest).await
            }
            "youtube_live_broadcasts_get" => {
                let p: BroadcastGetParams = parse(tool, params)?;
                self.youtube.get_broadcast(&p.broadcast_id, &p.part).await
            }
            "youtube_live_broadcasts_insert" => {
                let p: BroadcastInsertParams = parse(tool, params)?;
                let body = broadcast_insert_body(&p)?;
                self.youtube.insert_broadcast(&body).await
            }
            "youtube_live_broadcasts_bind" => {
                let p: BroadcastBindParams = parse(tool, params)?;
                self.youtube
                    .bind_broadcast(&p.broadcast_id, &p.stream_id)
                    .await
            }
            "youtube_live_streams_get" => {
                let p: StreamGetParams = parse(tool, params)?;
                self.youtube.get_stream(&p.stream_id, &p.part).await
            }
            "youtube_live_streams_insert" => {
                let p: StreamInsertParams = parse(tool, params)?;
                let body = stream_insert_body(&p)?;
                self.youtube.insert_stream(&body).await
            }
            "youtube_thumbnails_set" => {
                let p: ThumbnailSetParams = parse(tool, params)?;
                self.youtube.set_thumbnail(&p.video_id, &p.file_path).await
            }
            "youtube_live_chats_list" => {
                let LiveChatsListParams {
                    status,
                    max_results,
                    page_token,
                    channel_id,
                } = parse(tool, params)?;
                let listing = self
                    .list_broadcasts(
                        &status,
                        BroadcastsListParams {
                            max_results,
                            page_token,
                            channel_id,
                        },
                    )
                    .await?;
                Ok(project_live_chats(&listing))
            }
            "youtube_live_chat_messages_list" => {
                let p: LiveChatListParams = parse(tool, params)?;
                self.youtube
                    .list_chat_messages(
                        &p.live_chat_id,
                        &p.part,
                        p.max_results,
                        p.page_token.as_deref(),
                    )
                    .await
            }
            "youtube_live_chat_messages_insert" => {
                let p: LiveChatInsertParams = parse(tool, params)?;
                let body = chat_insert_body(&p)?;
                self.youtube.insert_chat_message(&body).await
            }
            "youtube_accounts_list" => self.list_accounts(),
            "youtube_accounts_set_active" => {
                let p: AccountsSetActiveParams = parse(tool, params)?;
                self.store.set_active(&p.user_id)?;
                Ok(json!({ "status": "ok", "active_user_id": p.user_id }))
            }
            other => Err(Error::UnknownTool(other.to_string())),
        }
    }

    async fn list_broadcasts(&self, status: &str, p: BroadcastsListParams) -> Result<Value> {
        let channel_id = match p.channel_id {
            Some(id) => Some(id),
            None => self.default_channel_id()?,
        };
        self.youtube
            .list_broadcasts(
                status,
                channel_id.as_deref(),
                p.max_results,
                p.page_token.as_deref(),
            )
            .await
    }

    /// Channel used for list calls when the caller does not name one: the
    /// most recently authorized account.
    fn default_channel_id(&self) -> Result<Option<String>> {
        Ok(self.store.load()?.last().map(|r| r.user_id.clone()))
    }

    fn list_accounts(&self) -> Result<Value> {
        let records = self.store.load()?;
        let active = self.store.active_account()?;
        let accounts: Vec<Value> = records
            .iter()
            .map(|r| {
                json!({
                    "user_id": r.user_id,
                    "user_name": r.user_name,
                    "channel_title": r.channel_title,
                    "created_at": r.created_at,
                    "updated_at": r.updated_at,
                    "active": active.as_deref() == Some(r.user_id.as_str()),
                })
            })
            .collect();
        Ok(json!({ "accounts": accounts, "active_user_id": active }))
    }
}

fn parse<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| Error::InvalidParams {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn default_max_results() -> u32 {
    10
}

fn default_chat_max_results() -> u32 {
    200
}

fn default_broadcast_part() -> String {
    "snippet,contentDetails,status".into()
}

fn default_stream_part() -> String {
    "snippet,cdn,contentDetails,status".into()
}

fn default_chat_part() -> String {
    "snippet,authorDetails".into()
}

fn default_chat_scan_status() -> String {
    "upcoming".into()
}

fn default_privacy_status() -> String {
    "private".into()
}

fn default_ingestion_type() -> String {
    "rtmp".into()
}

fn default_reusable() -> Option<bool> {
    Some(true)
}

#[derive(Debug, Deserialize)]
struct OAuthExchangeParams {
    /// Authorization code returned by the provider's redirect.
    code: String,
}

#[derive(Debug, Deserialize)]
struct OAuthRefreshParams {
    /// Stored account to refresh.
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct BroadcastsListParams {
    #[serde(default = "default_max_results")]
    max_results: u32,
    #[serde(default)]
    page_token: Option<String>,
    /// Overrides the channel inferred from stored accounts.
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BroadcastsListByStatusParams {
    /// `completed`, `active` or `upcoming`.
    broadcast_status: String,
    #[serde(flatten)]
    rest: BroadcastsListParams,
}

#[derive(Debug, Deserialize)]
struct LiveChatsListParams {
    /// Broadcast status to scan for chats.
    #[serde(default = "default_chat_scan_status")]
    status: String,
    #[serde(default = "default_max_results")]
    max_results: u32,
    #[serde(default)]
    page_token: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BroadcastGetParams {
    broadcast_id: String,
    #[serde(default = "default_broadcast_part")]
    part: String,
}

#[derive(Debug, Deserialize)]
struct StreamGetParams {
    stream_id: String,
    #[serde(default = "default_stream_part")]
    part: String,
}

#[derive(Debug, Deserialize)]
struct BroadcastInsertParams {
    title: String,
    /// RFC 3339.
    scheduled_start_time: String,
    #[serde(default = "default_privacy_status")]
    privacy_status: String,
    #[serde(default)]
    enable_auto_start: Option<bool>,
    #[serde(default)]
    enable_auto_stop: Option<bool>,
    #[serde(default)]
    description: Option<String>,
    /// Raw request body; overrides every other field when present.
    #[serde(default)]
    request_body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StreamInsertParams {
    title: String,
    #[serde(default = "default_ingestion_type")]
    ingestion_type: String,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default)]
    frame_rate: Option<String>,
    #[serde(default = "default_reusable")]
    is_reusable: Option<bool>,
    #[serde(default)]
    request_body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BroadcastBindParams {
    broadcast_id: String,
    stream_id: String,
}

#[derive(Debug, Deserialize)]
struct ThumbnailSetParams {
    /// Video id (the broadcast id, for live events).
    video_id: String,
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct LiveChatListParams {
    live_chat_id: String,
    #[serde(default = "default_chat_max_results")]
    max_results: u32,
    #[serde(default)]
    page_token: Option<String>,
    #[serde(default = "default_chat_part")]
    part: String,
}

#[derive(Debug, Deserialize)]
struct LiveChatInsertParams {
    live_chat_id: String,
    message_text: String,
    #[serde(default)]
    request_body: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AccountsSetActiveParams {
    user_id: String,
}

fn broadcast_insert_body(p: &BroadcastInsertParams) -> Result<Value> {
    if let Some(body) = &p.request_body {
        return Ok(body.clone());
    }
    let body = LiveBroadcastInsertRequest {
        snippet: LiveBroadcastInsertSnippet {
            title: p.title.clone(),
            scheduled_start_time: p.scheduled_start_time.clone(),
            description: p.description.clone(),
        },
        status: LiveBroadcastInsertStatus {
            privacy_status: p.privacy_status.clone(),
        },
        content_details: LiveBroadcastContentDetails {
            enable_auto_start: p.enable_auto_start,
            enable_auto_stop: p.enable_auto_stop,
        },
    };
    Ok(serde_json::to_value(body)?)
}

fn stream_insert_body(p: &StreamInsertParams) -> Result<Value> {
    if let Some(body) = &p.request_body {
        return Ok(body.clone());
    }
    let body = LiveStreamInsertRequest {
        snippet: LiveStreamInsertSnippet {
            title: p.title.clone(),
        },
        cdn: LiveStreamCdn {
            ingestion_type: p.ingestion_type.clone(),
            resolution: p.resolution.clone(),
            frame_rate: p.frame_rate.clone(),
        },
        content_details: LiveStreamContentDetails {
            is_reusable: p.is_reusable,
        },
    };
    Ok(serde_json::to_value(body)?)
}

fn chat_insert_body(p: &LiveChatInsertParams) -> Result<Value> {
    if let Some(body) = &p.request_body {
        return Ok(body.clone());
    }
    let body = LiveChatMessageInsertRequest::text(&p.live_chat_id, &p.message_text);
    Ok(serde_json::to_value(body)?)
}

/// Projects a broadcasts listing down to the entries that have a live chat
/// attached, in the shape chat-oriented callers expect.
fn project_live_chats(listing: &Value) -> Value {
    let mut chats = Vec::new();
    if let Some(items) = listing.get("items").and_then(Value::as_array) {
        for item in items {
            let snippet = &item["snippet"];
            if let Some(live_chat_id) = snippet.get("liveChatId").and_then(Value::as_str) {
                chats.push(json!({
                    "broadcast_id": item.get("id"),
                    "title": snippet.get("title"),
                    "scheduled_start_time": snippet.get("scheduledStartTime"),
                    "live_chat_id": live_chat_id,
                }));
            }
        }
    }
    json!({
        "items": chats,
        "pageInfo": listing.get("pageInfo"),
        "nextPageToken": listing.get("nextPageToken"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_defaults() {
        let p: BroadcastsListParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p.max_results, 10);
        assert_eq!(p.page_token, None);
        assert_eq!(p.channel_id, None);

        let p: LiveChatListParams =
            serde_json::from_value(json!({"live_chat_id": "c1"})).unwrap();
        assert_eq!(p.max_results, 200);
        assert_eq!(p.part, "snippet,authorDetails");

        let p: LiveChatsListParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p.status, "upcoming");
    }

    #[test]
    fn test_by_status_params_flatten_shared_fields() {
        let p: BroadcastsListByStatusParams = serde_json::from_value(json!({
            "broadcast_status": "active",
            "max_results": 25,
            "page_token": "tok",
        }))
        .unwrap();
        assert_eq!(p.broadcast_status, "active");
        assert_eq!(p.rest.max_results, 25);
        assert_eq!(p.rest.page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_missing_required_field_is_invalid_params() {
        let err = parse::<BroadcastBindParams>(
            "youtube_live_broadcasts_bind",
            json!({"broadcast_id": "b1"}),
        )
        .unwrap_err();
        assert!(
            matches!(err, Error::InvalidParams { ref tool, .. } if tool == "youtube_live_broadcasts_bind")
        );
    }

    #[test]
    fn test_broadcast_insert_body_from_flat_fields() {
        let p: BroadcastInsertParams = serde_json::from_value(json!({
            "title": "Launch",
            "scheduled_start_time": "2026-08-07T18:00:00Z",
            "enable_auto_start": true,
        }))
        .unwrap();
        let body = broadcast_insert_body(&p).unwrap();
        assert_eq!(body["snippet"]["title"], "Launch");
        assert_eq!(body["status"]["privacyStatus"], "private");
        assert_eq!(body["contentDetails"]["enableAutoStart"], true);
        assert!(body["contentDetails"].get("enableAutoStop").is_none());
    }

    #[test]
    fn test_request_body_overrides_flat_fields() {
        let p: BroadcastInsertParams = serde_json::from_value(json!({
            "title": "ignored",
            "scheduled_start_time": "ignored",
            "request_body": {"snippet": {"title": "verbatim"}},
        }))
        .unwrap();
        let body = broadcast_insert_body(&p).unwrap();
        assert_eq!(body, json!({"snippet": {"title": "verbatim"}}));
    }

    #[test]
    fn test_stream_insert_body_defaults() {
        let p: StreamInsertParams =
            serde_json::from_value(json!({"title": "Main encoder"})).unwrap();
        let body = stream_insert_body(&p).unwrap();
        assert_eq!(body["cdn"]["ingestionType"], "rtmp");
        assert_eq!(body["contentDetails"]["isReusable"], true);
        assert!(body["cdn"].get("resolution").is_none());
    }

    #[test]
    fn test_chat_insert_body() {
        let p: LiveChatInsertParams = serde_json::from_value(json!({
            "live_chat_id": "chat-1",
            "message_text": "hi",
        }))
        .unwrap();
        let body = chat_insert_body(&p).unwrap();
        assert_eq!(body["snippet"]["liveChatId"], "chat-1");
        assert_eq!(body["snippet"]["type"], "textMessageEvent");
    }

    #[test]
    fn test_project_live_chats_keeps_only_chat_bearing_broadcasts() {
        let listing = json!({
            "items": [
                {
                    "id": "b1",
                    "snippet": {
                        "title": "with chat",
                        "scheduledStartTime": "2026-08-07T18:00:00Z",
                        "liveChatId": "chat-1"
                    }
                },
                {"id": "b2", "snippet": {"title": "no chat"}}
            ],
            "pageInfo": {"totalResults": 2, "resultsPerPage": 2},
            "nextPageToken": "tok"
        });
        let projected = project_live_chats(&listing);
        let items = projected["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["broadcast_id"], "b1");
        assert_eq!(items[0]["live_chat_id"], "chat-1");
        assert_eq!(projected["nextPageToken"], "tok");
    }

    fn test_toolbox(dir: &tempfile::TempDir) -> Toolbox {
        let settings = Settings {
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
        };
        Toolbox::new(settings).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_tool() {
        let dir = tempfile::TempDir::new().unwrap();
        let toolbox = test_toolbox(&dir);
        let err = toolbox
            .dispatch("youtube_videos_rate", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTool(_)));
    }

    #[tokio::test]
    async fn test_dispatch_accounts_on_fresh_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let toolbox = test_toolbox(&dir);

        let listing = toolbox
            .dispatch("youtube_accounts_list", json!({}))
            .await
            .unwrap();
        assert_eq!(listing["accounts"], json!([]));
        assert_eq!(listing["active_user_id"], Value::Null);

        // activating an account that was never stored must fail
        let err = toolbox
            .dispatch("youtube_accounts_set_active", json!({"user_id": "UC_c"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownAccount(id) if id == "UC_c"));
    }
}
