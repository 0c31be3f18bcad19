//! YouTube Live API surface.
//!
//! The gateway never computes on the remote data model: list/get/insert
//! responses are handed back to the caller as raw JSON. The typed structs
//! here cover only what this crate itself constructs (request bodies) or
//! reads (the channel identity behind a freshly authorized token).
//!
//! # Broadcasts vs Streams
//!
//! A broadcast is the viewer-facing live event (title, schedule, privacy);
//! a stream is the technical ingest pipeline (encoder settings, ingestion
//! URL) that a broadcast is bound to before going live. One stream can be
//! reused across many broadcasts.

pub mod broadcasts;
pub mod channels;
pub mod chat;
pub mod client;
pub mod streams;

pub use broadcasts::{
    LiveBroadcastContentDetails, LiveBroadcastInsertRequest, LiveBroadcastInsertSnippet,
    LiveBroadcastInsertStatus,
};
pub use channels::{Channel, ChannelListResponse, ChannelSnippet};
pub use chat::{LiveChatMessageInsertRequest, LiveChatMessageSnippet, TextMessageDetails};
pub use client::YouTubeClient;
pub use streams::{LiveStreamCdn, LiveStreamContentDetails, LiveStreamInsertRequest,
    LiveStreamInsertSnippet};
