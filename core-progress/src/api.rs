//! HTTP-backed [`PlaybackApi`] over the host's [`HttpClient`].
//!
//! Speaks the JSON:API dialect used by the course backend:
//!
//! - `POST {base}/playback_tokens` issues a token
//! - `POST {base}/contents/{id}/progress` reports progress, authorized by the
//!   `X-Playback-Token` header

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::{
    BridgeError, PlaybackApi, PlaybackToken, ProgressUpdateRequest, ProgressUpdateResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Header carrying the playback token on progress updates
pub const PLAYBACK_TOKEN_HEADER: &str = "X-Playback-Token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
struct ProgressBody<'a> {
    data: ProgressData<'a>,
}

#[derive(Debug, Serialize)]
struct ProgressData<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    attributes: ProgressAttributes,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ProgressAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    progress_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProgressAnswer {
    data: Option<ProgressAnswerData>,
}

#[derive(Debug, Deserialize)]
struct ProgressAnswerData {
    #[serde(default)]
    attributes: ProgressAttributes,
}

#[derive(Debug, Deserialize)]
struct TokenAnswer {
    data: TokenAnswerData,
}

#[derive(Debug, Deserialize)]
struct TokenAnswerData {
    attributes: TokenAttributes,
}

#[derive(Debug, Deserialize)]
struct TokenAttributes {
    token: String,
}

/// Playback API talking to the backend over HTTP.
///
/// # Example
///
/// ```ignore
/// use core_progress::HttpPlaybackApi;
///
/// let api = HttpPlaybackApi::new(http_client, "https://api.example.com/v2")
///     .with_session_token(session);
/// let token = api.acquire_token().await?;
/// ```
pub struct HttpPlaybackApi {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    /// User session used to authorize token requests
    session_token: Option<String>,
}

impl HttpPlaybackApi {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    fn request(&self, path: &str) -> HttpRequest {
        let request = HttpRequest::new(HttpMethod::Post, format!("{}{}", self.base_url, path))
            .header("Accept", "application/vnd.api+json")
            .timeout(REQUEST_TIMEOUT);
        match &self.session_token {
            Some(session) => request.bearer_token(session.clone()),
            None => request,
        }
    }
}

#[async_trait]
impl PlaybackApi for HttpPlaybackApi {
    #[instrument(skip(self))]
    async fn acquire_token(&self) -> Result<PlaybackToken> {
        let response = self
            .http_client
            .execute(self.request("/playback_tokens"))
            .await?
            .error_for_status()?;

        let answer: TokenAnswer = response.json()?;
        if answer.data.attributes.token.is_empty() {
            return Err(BridgeError::OperationFailed(
                "Server issued an empty playback token".to_string(),
            ));
        }
        debug!("Playback token issued");
        Ok(PlaybackToken::new(answer.data.attributes.token))
    }

    #[instrument(skip(self, request), fields(content_id = %request.content_id))]
    async fn update_progress(
        &self,
        request: ProgressUpdateRequest,
    ) -> Result<ProgressUpdateResponse> {
        let body = ProgressBody {
            data: ProgressData {
                kind: "progressions",
                attributes: ProgressAttributes {
                    progress_seconds: Some(request.progress_seconds),
                    delta_seconds: Some(request.delta_seconds),
                },
            },
        };
        let http_request = self
            .request(&format!("/contents/{}/progress", request.content_id))
            .header(PLAYBACK_TOKEN_HEADER, request.token.as_str())
            .json(&body)?;

        let response = self.http_client.execute(http_request).await?;
        if !response.is_success() {
            debug!(status = response.status, "Progress update not accepted");
            return Ok(ProgressUpdateResponse {
                http_status: response.status,
                server_progress_seconds: None,
            });
        }

        // An empty or unexpected body still counts as accepted
        let server_progress_seconds = if response.body.is_empty() {
            None
        } else {
            response
                .json::<ProgressAnswer>()
                .ok()
                .and_then(|answer| answer.data)
                .and_then(|data| data.attributes.progress_seconds)
        };

        Ok(ProgressUpdateResponse {
            http_status: response.status,
            server_progress_seconds,
        })
    }
}
