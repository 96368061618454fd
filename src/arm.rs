//! Minimal Azure Resource Manager REST client.
//!
//! Issues authenticated `GET`s against resource-group scoped ARM paths and
//! classifies failures into [`ArmError`]. The caller hands in a bearer token;
//! there are no retries and every error is surfaced as-is.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("hemmer-provider-azurerm/", env!("CARGO_PKG_VERSION"));

/// Errors returned by [`ArmClient`] and by anything implementing the
/// per-service client traits.
#[derive(Debug, Error)]
pub enum ArmError {
    /// The management API answered with a non-success status.
    #[error("unexpected status {status} ({code}): {message}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// ARM error code, e.g. `ResourceNotFound`.
        code: String,
        /// Human-readable message from the error envelope.
        message: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("sending request: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response carried a body that does not match the model.
    #[error("decoding response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The configured endpoint cannot be used as a base URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The access token cannot be sent as a header value.
    #[error("invalid access token: {0}")]
    InvalidToken(String),
}

impl ArmError {
    /// Build a response error from its parts.
    pub fn response(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Response {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// A 404 response error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::response(404, "ResourceNotFound", message)
    }

    /// Whether the management API reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Response { status: 404, .. })
    }

    /// HTTP status of a response error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Deserialize, Default)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Async client for the ARM management endpoint of one subscription.
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: Url,
    subscription_id: String,
}

impl ArmClient {
    /// Build a client that sends `access_token` as a bearer token on every request.
    pub fn new(
        endpoint: Url,
        subscription_id: impl Into<String>,
        access_token: &SecretString,
    ) -> Result<Self, ArmError> {
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", access_token.expose_secret()))
            .map_err(|e| ArmError::InvalidToken(e.to_string()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()?;

        Self::from_reqwest(http, endpoint, subscription_id)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(
        http: reqwest::Client,
        endpoint: Url,
        subscription_id: impl Into<String>,
    ) -> Result<Self, ArmError> {
        if endpoint.cannot_be_a_base() {
            return Err(ArmError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            http,
            endpoint,
            subscription_id: subscription_id.into(),
        })
    }

    /// The subscription every request is scoped to.
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// The management endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build `{endpoint}/subscriptions/{sub}/resourceGroups/{rg}/{segments...}?api-version=...`.
    ///
    /// Every segment is percent-encoded on its own, so names cannot escape
    /// their position in the path.
    pub fn resource_group_url(
        &self,
        resource_group: &str,
        segments: &[&str],
        api_version: &str,
    ) -> Result<Url, ArmError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| ArmError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend([
                "subscriptions",
                self.subscription_id.as_str(),
                "resourceGroups",
                resource_group,
            ])
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// `GET` a resource-group scoped ARM resource and decode it.
    pub async fn get_resource<T: DeserializeOwned>(
        &self,
        resource_group: &str,
        segments: &[&str],
        api_version: &str,
    ) -> Result<T, ArmError> {
        let url = self.resource_group_url(resource_group, segments, api_version)?;
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ArmError> {
        debug!(url = %url, "GET");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(ArmError::Decode)
        } else {
            debug!(status = status.as_u16(), "ARM request failed");
            Err(parse_error(status, &body))
        }
    }
}

fn parse_error(status: StatusCode, body: &str) -> ArmError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_default();

    let code = detail
        .code
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    let message = detail.message.unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.to_string()
        } else {
            body.to_string()
        }
    });

    ArmError::response(status.as_u16(), code, message)
}
