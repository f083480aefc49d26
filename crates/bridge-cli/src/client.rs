//! HTTP client for the compile gateway.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::Config;

/// Errors talking to the gateway.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (refused, timed out, DNS).
    #[error("cannot reach gateway at {url}: {source}")]
    Transport {
        /// Request URL.
        url: String,
        /// Underlying cause.
        #[source]
        source: reqwest::Error,
    },

    /// The gateway answered with a non-2xx status.
    #[error("gateway responded with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response body was not the expected JSON.
    #[error("unreadable gateway response: {message}")]
    Decode {
        /// Decoder message.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Setup(String),
}

/// Gateway health as reported by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Service status text.
    pub status: String,
    /// Port the gateway listens on.
    #[serde(default)]
    pub port: Option<u16>,
    /// Whether the compiler executable is present.
    pub compiler_exists: bool,
    /// Check time.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Request body for `POST /compile`.
#[derive(Debug, Clone, Serialize)]
pub struct CompileRequest<'a> {
    /// Source text.
    pub code: &'a str,
}

/// Response body of `POST /compile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResponse {
    /// Whether compilation succeeded.
    pub success: bool,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Assembly listing.
    #[serde(default)]
    pub assembly: String,
    /// Compiler output text.
    #[serde(default)]
    pub output: String,
    /// Keyword count.
    #[serde(default)]
    pub keywords: u64,
    /// Identifier count.
    #[serde(default)]
    pub identifiers: u64,
}

/// Operations the console needs from a gateway.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Base URL, for messages.
    fn base_url(&self) -> &str;

    /// Fetches gateway health.
    async fn health(&self) -> Result<HealthReport, ClientError>;

    /// Submits source text for compilation.
    async fn compile(&self, code: &str) -> Result<CompileResponse, ClientError>;
}

/// API client for the compile gateway.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    async fn read_json<T: DeserializeOwned>(
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| ClientError::Decode {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl GatewayApi for ApiClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health(&self) -> Result<HealthReport, ClientError> {
        let url = format!("{}/health", self.base_url);
        tracing::debug!(url = %url, "checking gateway health");
        let request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        Self::read_json(&url, request).await
    }

    async fn compile(&self, code: &str) -> Result<CompileResponse, ClientError> {
        let url = format!("{}/compile", self.base_url);
        tracing::debug!(url = %url, bytes = code.len(), "submitting source");
        let request = self.client.post(&url).json(&CompileRequest { code });
        Self::read_json(&url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_response_tolerates_missing_fields() {
        let response: CompileResponse =
            serde_json::from_str(r#"{"success": false, "error": "Invalid JSON"}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Invalid JSON"));
        assert!(response.assembly.is_empty());
        assert_eq!(response.keywords, 0);
    }

    #[test]
    fn health_report_reads_camel_case() {
        let report: HealthReport = serde_json::from_str(
            r#"{"status":"OK","port":5000,"compilerExists":true,"timestamp":"2026-01-01T00:00:00.000Z"}"#,
        )
        .unwrap();
        assert!(report.compiler_exists);
        assert_eq!(report.port, Some(5000));
    }

    #[test]
    fn compile_request_shape() {
        let body = serde_json::to_value(CompileRequest { code: "dhoro x = 10;" }).unwrap();
        assert_eq!(body, serde_json::json!({"code": "dhoro x = 10;"}));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let client = ApiClient::new(&Config {
            api_url: "http://127.0.0.1:9".to_string(),
            timeout: std::time::Duration::from_secs(2),
            ..Config::default()
        })
        .unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }));
        assert!(err.to_string().contains("127.0.0.1:9"));
    }
}
