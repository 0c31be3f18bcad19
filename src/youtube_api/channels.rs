//! YouTube Channels API types.
//!
//! Used once per authorization: `channels.list mine=true` tells us which
//! channel a freshly issued token belongs to.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Response structure for the `channels.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelListResponse {
    /// Identifies the API resource's type.
    ///
    /// The value will be `youtube#channelListResponse`.
    pub kind: String,
    /// A list of channels that match the request criteria.
    #[serde(default)]
    pub items: Vec<Channel>,
}

/// A `channel` resource contains information about a YouTube channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: String,
    /// Contains basic details about the channel.
    pub snippet: ChannelSnippet,
}

/// The snippet object contains basic details about the channel.
///
/// This is a subset of the full snippet data available from the YouTube API,
/// containing only the fields needed to identify an authorized account.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    /// The channel's title.
    pub title: String,
    /// The channel's handle-style custom URL, when one is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    /// The date and time that the channel was created.
    ///
    /// The value is specified in ISO 8601 format.
    pub published_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_list_deserialization() {
        let json = r#"
        {
            "kind": "youtube#channelListResponse",
            "items": [
                {
                    "id": "UC123",
                    "snippet": {
                        "title": "My Channel",
                        "customUrl": "@mychannel",
                        "publishedAt": "2020-05-01T12:00:00Z"
                    }
                }
            ]
        }"#;

        let parsed: ChannelListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].id, "UC123");
        assert_eq!(parsed.items[0].snippet.custom_url.as_deref(), Some("@mychannel"));
    }

    #[test]
    fn test_channel_without_custom_url() {
        let json = r#"
        {
            "kind": "youtube#channelListResponse",
            "items": [
                {
                    "id": "UC456",
                    "snippet": {
                        "title": "Plain Channel",
                        "publishedAt": "2021-01-01T00:00:00Z"
                    }
                }
            ]
        }"#;

        let parsed: ChannelListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.items[0].snippet.custom_url, None);
    }
}
