//! Request bodies for the YouTube Live Broadcasts API.
//!
//! A `liveBroadcast` resource represents the viewer-facing live streaming
//! event: title, schedule, privacy, and lifecycle settings. Responses are
//! passed through to callers as raw JSON; only the insert body the gateway
//! constructs itself is typed here.
//!
//! See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/insert>

use serde::{Deserialize, Serialize};

/// Body for `liveBroadcasts.insert`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastInsertRequest {
    pub snippet: LiveBroadcastInsertSnippet,
    pub status: LiveBroadcastInsertStatus,
    pub content_details: LiveBroadcastContentDetails,
}

/// The snippet object for a broadcast being created.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastInsertSnippet {
    /// The broadcast's title.
    pub title: String,
    /// The date and time the broadcast is scheduled to start, RFC 3339.
    ///
    /// Passed through verbatim; the remote API validates the format.
    pub scheduled_start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The status object for a broadcast being created.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastInsertStatus {
    /// `public`, `unlisted` or `private`.
    pub privacy_status: String,
}

/// The contentDetails object for a broadcast being created.
///
/// Serializes to `{}` when neither flag is set, which the remote API
/// treats as "use channel defaults".
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastContentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_auto_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_auto_stop: Option<bool>,
}
