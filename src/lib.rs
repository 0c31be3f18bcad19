//! Tool gateway for the YouTube Live API.
//!
//! A thin adaptation layer that exposes the live-broadcast REST API as
//! callable tools for an agent/automation host: OAuth2 credential
//! acquisition, multi-account token storage and refresh, and one-shot
//! passthrough calls for broadcasts, streams, thumbnails and live chat.
//! The remote data model is owned by YouTube; nothing here computes on it.

pub mod callback;
pub mod config;
pub mod error;
pub mod oauth;
pub mod server;
pub mod store;
pub mod tools;
pub mod youtube_api;

pub use config::Settings;
pub use error::{Error, Result};
pub use oauth::OAuthManager;
pub use store::{CredentialRecord, TokenStore};
pub use tools::{TOOL_NAMES, Toolbox};
