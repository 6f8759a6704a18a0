// ABOUTME: Remote session API trait and its reqwest-backed HTTP implementation
// ABOUTME: Maps transport failures and non-success statuses onto NetworkError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Remote Session API
//!
//! The tracking core only talks to the backend through [`RuckApi`]. The HTTP
//! implementation targets the REST routes below; the bearer token is supplied
//! from outside and never refreshed here.
//!
//! | Operation | Route |
//! |-----------|-------|
//! | create | `POST /api/rucks` |
//! | start / pause / resume | `POST /api/rucks/{id}/start` (etc.) |
//! | append location batch | `POST /api/rucks/{id}/location` |
//! | append heart-rate batch | `POST /api/rucks/{id}/heartrate` |
//! | complete | `POST /api/rucks/{id}/complete` |
//! | delete | `DELETE /api/rucks/{id}` |

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use ruck_core::errors::NetworkError;
use ruck_core::models::{HeartRateSample, LocationPoint, NewSession, SessionId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::http_client::shared_client;
use crate::payloads::{
    Batch, CompletionPayload, HeartRateBatchBody, LocationBatchBody, RemoteSession,
};

/// Longest response body kept in a `NetworkError::Status`
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Operations the tracking core needs from the backend
#[async_trait]
pub trait RuckApi: Send + Sync {
    /// Create a session in `created` status
    async fn create_session(&self, params: &NewSession) -> Result<RemoteSession, NetworkError>;

    /// Mark the session as started
    async fn start_session(&self, session_id: &SessionId) -> Result<(), NetworkError>;

    /// Mark the session as paused
    async fn pause_session(&self, session_id: &SessionId) -> Result<(), NetworkError>;

    /// Mark the session as resumed
    async fn resume_session(&self, session_id: &SessionId) -> Result<(), NetworkError>;

    /// Append a batch of accepted location points
    async fn append_location_batch(
        &self,
        session_id: &SessionId,
        batch: &Batch<LocationPoint>,
    ) -> Result<(), NetworkError>;

    /// Append a batch of heart-rate samples
    async fn append_heart_rate_batch(
        &self,
        session_id: &SessionId,
        batch: &Batch<HeartRateSample>,
    ) -> Result<(), NetworkError>;

    /// Complete the session with its final stats
    async fn complete_session(
        &self,
        session_id: &SessionId,
        payload: &CompletionPayload,
    ) -> Result<(), NetworkError>;

    /// Delete the session and everything uploaded for it
    async fn delete_session(&self, session_id: &SessionId) -> Result<(), NetworkError>;
}

/// `RuckApi` over HTTP
#[derive(Debug, Clone)]
pub struct HttpRuckApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRuckApi {
    /// Client using the shared connection pool
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self::with_client(shared_client().clone(), base_url, token)
    }

    /// Client using a caller-provided `reqwest::Client`
    pub fn with_client(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            client,
            base_url,
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder, operation: &str) -> Result<Response, NetworkError> {
        let response = builder.send().await.map_err(|e| {
            debug!(
                operation,
                error = %e,
                timeout = e.is_timeout(),
                "API request failed before a response"
            );
            if e.is_timeout() {
                NetworkError::Timeout(e.to_string())
            } else {
                NetworkError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY_CHARS {
            body = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        }
        warn!(operation, status = status.as_u16(), "API request rejected");
        Err(NetworkError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn post_json<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
        operation: &str,
    ) -> Result<Response, NetworkError> {
        Self::send(self.request(Method::POST, path).json(body), operation).await
    }

    async fn post_empty(&self, path: &str, operation: &str) -> Result<(), NetworkError> {
        Self::send(self.request(Method::POST, path), operation)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl RuckApi for HttpRuckApi {
    async fn create_session(&self, params: &NewSession) -> Result<RemoteSession, NetworkError> {
        let response = self.post_json("/api/rucks", params, "create_session").await?;
        response
            .json::<RemoteSession>()
            .await
            .map_err(|e| NetworkError::Encoding(e.to_string()))
    }

    async fn start_session(&self, session_id: &SessionId) -> Result<(), NetworkError> {
        self.post_empty(&format!("/api/rucks/{session_id}/start"), "start_session")
            .await
    }

    async fn pause_session(&self, session_id: &SessionId) -> Result<(), NetworkError> {
        self.post_empty(&format!("/api/rucks/{session_id}/pause"), "pause_session")
            .await
    }

    async fn resume_session(&self, session_id: &SessionId) -> Result<(), NetworkError> {
        self.post_empty(&format!("/api/rucks/{session_id}/resume"), "resume_session")
            .await
    }

    async fn append_location_batch(
        &self,
        session_id: &SessionId,
        batch: &Batch<LocationPoint>,
    ) -> Result<(), NetworkError> {
        let body = LocationBatchBody::from(batch);
        self.post_json(
            &format!("/api/rucks/{session_id}/location"),
            &body,
            "append_location_batch",
        )
        .await
        .map(|_| ())
    }

    async fn append_heart_rate_batch(
        &self,
        session_id: &SessionId,
        batch: &Batch<HeartRateSample>,
    ) -> Result<(), NetworkError> {
        let body = HeartRateBatchBody::from(batch);
        self.post_json(
            &format!("/api/rucks/{session_id}/heartrate"),
            &body,
            "append_heart_rate_batch",
        )
        .await
        .map(|_| ())
    }

    async fn complete_session(
        &self,
        session_id: &SessionId,
        payload: &CompletionPayload,
    ) -> Result<(), NetworkError> {
        self.post_json(
            &format!("/api/rucks/{session_id}/complete"),
            payload,
            "complete_session",
        )
        .await
        .map(|_| ())
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), NetworkError> {
        Self::send(
            self.request(Method::DELETE, &format!("/api/rucks/{session_id}")),
            "delete_session",
        )
        .await
        .map(|_| ())
    }
}
