//! Playback API Abstraction
//!
//! Remote calls the progress synchronizer depends on: acquiring a playback
//! token and reporting watch progress for a content item.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Opaque playback token issued by the server.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackToken(String);

impl PlaybackToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlaybackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaybackToken([REDACTED])")
    }
}

/// Body of a remote progress update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdateRequest {
    pub token: PlaybackToken,
    pub content_id: String,
    /// Absolute playback position in seconds
    pub progress_seconds: i64,
    /// Seconds watched since the last accepted report
    pub delta_seconds: i64,
}

/// What the server answered to a progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdateResponse {
    pub http_status: u16,
    /// Progress the server holds for this content, in seconds
    pub server_progress_seconds: Option<i64>,
}

impl ProgressUpdateResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status)
    }
}

/// Remote playback API.
///
/// # Errors
///
/// - `update_progress` returns `Ok` for every response the server produced,
///   including 4xx/5xx, and [`BridgeError::Transport`](crate::BridgeError::Transport)
///   when no response was received.
/// - `acquire_token` returns [`BridgeError::Http`](crate::BridgeError::Http) when the
///   server refused to issue a token and `Transport` when it was unreachable.
#[async_trait]
pub trait PlaybackApi: Send + Sync {
    /// Request a fresh playback token
    async fn acquire_token(&self) -> Result<PlaybackToken>;

    /// Report playback progress for a content item
    async fn update_progress(&self, request: ProgressUpdateRequest)
        -> Result<ProgressUpdateResponse>;
}
