//! Request bodies for the YouTube Live Chat Messages API.
//!
//! See: <https://developers.google.com/youtube/v3/live/docs/liveChatMessages/insert>

use serde::{Deserialize, Serialize};

/// Body for `liveChatMessages.insert`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LiveChatMessageInsertRequest {
    pub snippet: LiveChatMessageSnippet,
}

impl LiveChatMessageInsertRequest {
    /// A plain text chat message addressed to `live_chat_id`.
    pub fn text(live_chat_id: impl Into<String>, message_text: impl Into<String>) -> Self {
        Self {
            snippet: LiveChatMessageSnippet {
                live_chat_id: live_chat_id.into(),
                kind: "textMessageEvent".into(),
                text_message_details: TextMessageDetails {
                    message_text: message_text.into(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveChatMessageSnippet {
    pub live_chat_id: String,
    /// Always `textMessageEvent` for messages this gateway sends.
    #[serde(rename = "type")]
    pub kind: String,
    pub text_message_details: TextMessageDetails,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageDetails {
    pub message_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_serializes_to_remote_field_names() {
        let body = LiveChatMessageInsertRequest::text("chat-1", "hello from the gateway");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["snippet"]["liveChatId"], "chat-1");
        assert_eq!(value["snippet"]["type"], "textMessageEvent");
        assert_eq!(
            value["snippet"]["textMessageDetails"]["messageText"],
            "hello from the gateway"
        );
    }
}
