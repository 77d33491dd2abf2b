//! Client for the chat/session backend.
//!
//! The backend owns sessions, answers messages and keeps a copy of the
//! query context. Everything behind [`SessionClient`] is I/O; the pure
//! pipeline never calls it directly.

use crate::config::BackendConfig;
use crate::models::{
    ConversationTurn, MessageContext, QueryContext, QueryMetadata, Role, VisualizationRequest,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// A freshly created session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(alias = "sessionId")]
    pub session_id: String,
}

/// Backend health as reported by the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
    #[serde(default)]
    pub services: BTreeMap<String, String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.to_lowercase().as_str(), "ok" | "healthy")
    }
}

/// Operations consumed from the session backend.
#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn create_session(&self) -> Result<SessionInfo>;

    /// Sends a user message and returns the assistant's reply.
    async fn send_message(
        &self,
        text: &str,
        session_id: &str,
        context: Option<&MessageContext>,
    ) -> Result<ConversationTurn>;

    async fn update_context(&self, session_id: &str, context: &QueryContext) -> Result<()>;

    async fn get_health(&self) -> Result<HealthStatus>;
}

/// Chat message request body.
#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a MessageContext>,
}

/// Chat message response body.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(alias = "response", alias = "text")]
    content: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    confidence_score: Option<f64>,
    #[serde(default, alias = "visualization")]
    visualization_spec: Option<VisualizationRequest>,
    #[serde(default)]
    query_metadata: Option<QueryMetadata>,
}

impl From<MessageResponse> for ConversationTurn {
    fn from(response: MessageResponse) -> Self {
        let mut turn = ConversationTurn::new(Role::Assistant, response.content);
        if let Some(id) = response.id {
            turn.id = id;
        }
        if let Some(timestamp) = response.timestamp {
            turn.created_at = timestamp;
        }
        turn.confidence_score = response.confidence_score.map(|s| s.clamp(0.0, 1.0));
        turn.visualization = response.visualization_spec;
        turn.query_metadata = response.query_metadata;
        turn
    }
}

/// [`SessionClient`] over HTTP/JSON.
pub struct HttpSessionClient {
    base_url: String,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl HttpSessionClient {
    /// Create a client for the configured backend.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        info!("Using session backend at {}", config.url);

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            timeout_seconds: config.timeout_seconds,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns transport failures into readable errors.
    fn send_error(&self, e: reqwest::Error) -> anyhow::Error {
        if e.is_timeout() {
            anyhow::anyhow!("Request timed out after {}s", self.timeout_seconds)
        } else if e.is_connect() {
            anyhow::anyhow!(
                "Cannot connect to session backend at {}. Is it running?",
                self.base_url
            )
        } else {
            anyhow::anyhow!("Failed to send request: {}", e)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Session backend error {}: {}", status, body));
        }
        Ok(response)
    }
}

#[async_trait]
impl SessionClient for HttpSessionClient {
    async fn create_session(&self) -> Result<SessionInfo> {
        let response = self
            .http_client
            .post(self.url("/api/chat/session"))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let session: SessionInfo = Self::check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse session response")?;

        info!("Created session {}", session.session_id);
        Ok(session)
    }

    async fn send_message(
        &self,
        text: &str,
        session_id: &str,
        context: Option<&MessageContext>,
    ) -> Result<ConversationTurn> {
        let request = MessageRequest {
            message: text,
            session_id,
            context,
        };

        debug!("Sending message to session {}", session_id);

        let response = self
            .http_client
            .post(self.url("/api/chat/message"))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let reply: MessageResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse chat response")?;

        Ok(reply.into())
    }

    async fn update_context(&self, session_id: &str, context: &QueryContext) -> Result<()> {
        let response = self
            .http_client
            .put(self.url(&format!("/api/chat/session/{}/context", session_id)))
            .json(context)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::check_status(response).await?;
        debug!("Pushed context to session {}", session_id);
        Ok(())
    }

    async fn get_health(&self) -> Result<HealthStatus> {
        let response = self
            .http_client
            .get(self.url("/api/health"))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse health response")
    }
}
