//! Licensing service client.
//!
//! One request per evaluation: `POST <endpoint>` with `{app, type, guid}`,
//! answered by `{status, message}`. The HTTP status line is not
//! interpreted; only the JSON body is.

use crate::error::{LicenseError, LicenseResult};
use crate::identity::{ClientIdentity, IdentityKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of the status request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    /// Application id.
    pub app: String,
    /// 1 for a device identity, 2 for a tenant identity.
    #[serde(rename = "type")]
    pub kind: u8,
    /// The identity string.
    pub guid: String,
}

impl StatusRequest {
    /// Builds the request for an identity.
    pub fn new(app_id: impl Into<String>, identity: &ClientIdentity) -> Self {
        Self {
            app: app_id.into(),
            kind: identity.kind().request_type(),
            guid: identity.as_str().to_string(),
        }
    }
}

/// Body of the status response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Status code, see [`RemoteStatus`].
    pub status: i32,
    /// First-launch date or license token, depending on `status`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    /// The `message` field, empty when absent.
    #[must_use]
    pub fn detail(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

/// A recognised status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// Trial running; carries the first-launch date (`YYYY-MM-DD`).
    Trial {
        /// First-launch date as sent by the service.
        first_launch: String,
    },
    /// Trial running and an order is waiting for payment.
    OrderPending {
        /// First-launch date as sent by the service.
        first_launch: String,
    },
    /// Licensed; carries the base64 token the service issued.
    Licensed {
        /// Signature over the client identity.
        token: String,
    },
}

impl RemoteStatus {
    /// Maps a status code and its detail to a status and the identity kind
    /// the code belongs to (1x device, 2x tenant).
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::UnknownStatus`] for any code outside
    /// 11-13 and 21-23.
    pub fn classify(code: i32, detail: &str) -> LicenseResult<(Self, IdentityKind)> {
        let kind = match code / 10 {
            1 => IdentityKind::Device,
            2 => IdentityKind::Tenant,
            _ => return Err(LicenseError::UnknownStatus(code)),
        };
        let status = match code % 10 {
            1 => Self::Trial {
                first_launch: detail.to_string(),
            },
            2 => Self::OrderPending {
                first_launch: detail.to_string(),
            },
            3 => Self::Licensed {
                token: detail.to_string(),
            },
            _ => return Err(LicenseError::UnknownStatus(code)),
        };
        Ok((status, kind))
    }
}

/// Anything that can answer a status request.
#[async_trait]
pub trait StatusService: Send + Sync {
    /// Sends the identity to the licensing service and returns its answer.
    async fn query_status(
        &self,
        app_id: &str,
        identity: &ClientIdentity,
    ) -> LicenseResult<StatusResponse>;
}

#[async_trait]
impl<T: StatusService + ?Sized> StatusService for Arc<T> {
    async fn query_status(
        &self,
        app_id: &str,
        identity: &ClientIdentity,
    ) -> LicenseResult<StatusResponse> {
        (**self).query_status(app_id, identity).await
    }
}

/// HTTP implementation of [`StatusService`].
#[derive(Debug, Clone)]
pub struct StatusClient {
    client: Client,
    endpoint: String,
}

impl StatusClient {
    /// Creates a client for `endpoint` with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Config`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> LicenseResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LicenseError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// The URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StatusService for StatusClient {
    async fn query_status(
        &self,
        app_id: &str,
        identity: &ClientIdentity,
    ) -> LicenseResult<StatusResponse> {
        let request = StatusRequest::new(app_id, identity);
        debug!(endpoint = %self.endpoint, kind = request.kind, "Sending license status request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| LicenseError::Network(format!("sending license status request: {e}")))?;

        let http_status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LicenseError::Network(format!("reading license service response: {e}")))?;

        let parsed: StatusResponse = serde_json::from_str(&body).map_err(|e| {
            LicenseError::ResponseFormat(format!("HTTP {http_status}: {e}"))
        })?;

        debug!(status = parsed.status, "License service answered");
        Ok(parsed)
    }
}
