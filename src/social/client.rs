use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::SecondsFormat;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::models::{ApiErrorBody, Post, PostListResponse, PostQuery, UserBulkResponse, UserProfile};
use crate::error::HttpError;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("Failed to reach social API: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Social API rate limit exceeded")]
    RateLimited,

    #[error("Social API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed social API response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl HttpError for SocialError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::RequestError(_) | Self::ApiError { .. } | Self::Malformed(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::RequestError(_) => Some("REQUEST_ERROR"),
            Self::RateLimited => Some("RATE_LIMITED"),
            Self::ApiError { .. } => Some("API_ERROR"),
            Self::Malformed(_) => Some("MALFORMED_RESPONSE"),
        }
    }
}

/// Read-only view of the social graph used by the aggregator.
///
/// Implementations are expected to be long-lived and shared; the aggregator
/// never constructs one per call.
#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Resolve user ids to profiles. Unknown ids are simply absent from the result.
    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<UserProfile>, SocialError>;

    /// Posts by `query.author_id` created at or after `query.since`, at most
    /// `query.limit` of them, each with its direct replies inline.
    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, SocialError>;
}

/// `SocialClient` over the HTTP API
pub struct HttpSocialClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSocialClient {
    /// Wrap a shared reqwest client; `base_url` may carry a trailing slash
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Map non-success statuses to errors and decode the body
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, SocialError> {
        let status = response.status();
        tracing::debug!(status = %status, "Received social API response");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SocialError::RateLimited);
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(SocialError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SocialClient for HttpSocialClient {
    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<UserProfile>, SocialError> {
        let joined = ids.join(",");
        tracing::debug!(ids = %joined, "Looking up users");

        let response = self
            .client
            .get(self.url("user/bulk"))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("ids", joined.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let body: UserBulkResponse = Self::decode(response).await?;
        Ok(body.users)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, SocialError> {
        let since = query.since.to_rfc3339_opts(SecondsFormat::Secs, true);
        tracing::debug!(
            author_id = %query.author_id,
            since = %since,
            limit = query.limit,
            "Listing posts"
        );

        let response = self
            .client
            .get(self.url("posts"))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[
                ("author_id", query.author_id.clone()),
                ("since", since),
                ("limit", query.limit.to_string()),
                ("include_replies", "true".to_string()),
            ])
            .send()
            .await?;

        let body: PostListResponse = Self::decode(response).await?;
        let mut posts = body.posts;
        posts.truncate(query.limit);
        Ok(posts)
    }
}
