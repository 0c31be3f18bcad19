//! Request bodies for the YouTube Live Streams API.
//!
//! A `liveStream` resource is the technical ingest pipeline (encoder
//! settings, ingestion URL, CDN configuration) that a broadcast is bound
//! to before going live.
//!
//! See: <https://developers.google.com/youtube/v3/live/docs/liveStreams/insert>

use serde::{Deserialize, Serialize};

/// Body for `liveStreams.insert`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamInsertRequest {
    pub snippet: LiveStreamInsertSnippet,
    pub cdn: LiveStreamCdn,
    pub content_details: LiveStreamContentDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LiveStreamInsertSnippet {
    /// The stream's title.
    pub title: String,
}

/// CDN/ingestion settings for a stream being created.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamCdn {
    /// `rtmp` or `dash`.
    pub ingestion_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStreamContentDetails {
    /// Whether the stream can be bound to more than one broadcast over time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reusable: Option<bool>,
}
