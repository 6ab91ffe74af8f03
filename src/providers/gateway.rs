//! Authenticated Request Gateway
//!
//! Every call to the Shield API goes through [`ShieldGateway::invoke`]:
//! 1. Resolve `<base URL>/api/v1/<path>`
//! 2. Ask the injected [`CredentialProvider`] for the current session
//!    (never cached) and attach it as a bearer token when present
//! 3. Turn non-2xx responses into a [`ShieldError`] carrying the server's
//!    `detail` or `Request failed (<status>)`
//!
//! The gateway never retries. Retry policy belongs to the caller.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::models::config::ShieldConfig;
use crate::models::errors::{ErrorCode, ShieldError, ShieldResult};
use crate::providers::credentials::CredentialProvider;

/// HTTP gateway to the Shield backend
#[derive(Clone)]
pub struct ShieldGateway {
    /// HTTP client with default headers (gzip enabled)
    client: reqwest::Client,
    config: ShieldConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl ShieldGateway {
    /// Create a gateway. Build it once at startup and share it.
    pub fn new(
        config: ShieldConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> ShieldResult<Self> {
        config.validate()?;
        let client = Self::build_client(&config)?;

        Ok(Self {
            client,
            config,
            credentials,
        })
    }

    /// Build HTTP client with default headers
    fn build_client(config: &ShieldConfig) -> ShieldResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| ShieldError::invalid_config("User-Agent is not a valid header value"))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| {
                ShieldError::with_source(
                    ErrorCode::ConfigInvalidValue,
                    "Failed to build HTTP client",
                    e,
                )
            })
    }

    pub fn config(&self) -> &ShieldConfig {
        &self.config
    }

    /// Absolute URL for an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        self.config.resolve(path)
    }

    /// Perform one API call and return the decoded JSON body.
    ///
    /// A 2xx response with an empty body yields `Value::Null`.
    pub async fn invoke(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> ShieldResult<Value> {
        let url = self.endpoint(path);
        let start = Instant::now();

        let mut request = self.client.request(method.clone(), &url);
        match self.credentials.current_credential().await {
            Some(credential) => {
                request = request.bearer_auth(credential.access_token());
            }
            None => debug!("🔓 No session, calling {} unauthenticated", path),
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("⚠️ {} {} failed to send: {}", method, path, e);
            ShieldError::from(e)
        })?;

        let status = response.status();

        if !status.is_success() {
            // an unreadable error body still reports the status
            let bytes = response.bytes().await.unwrap_or_default();
            let latency_ms = start.elapsed().as_millis();
            let err = ShieldError::from_response(status.as_u16(), &bytes);
            warn!(
                "❌ {} {} -> {} [{}] {} ({}ms)",
                method,
                path,
                status.as_u16(),
                err.code_str(),
                err.message,
                latency_ms
            );
            return Err(err);
        }

        let bytes = response.bytes().await.map_err(ShieldError::from)?;
        let latency_ms = start.elapsed().as_millis();
        info!("✅ {} {} -> {} ({}ms)", method, path, status.as_u16(), latency_ms);

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET and decode into `T`
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ShieldResult<T> {
        let value = self.invoke(path, Method::GET, None).await?;
        decode(path, value)
    }

    /// POST a JSON body and decode the response into `T`
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ShieldResult<T> {
        let payload = serde_json::to_value(body)?;
        let value = self.invoke(path, Method::POST, Some(&payload)).await?;
        decode(path, value)
    }
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> ShieldResult<T> {
    serde_json::from_value(value).map_err(|e| {
        warn!("⚠️ Unexpected response shape from {}: {}", path, e);
        ShieldError::with_source(
            ErrorCode::Decode,
            format!("Unexpected response from {}", path),
            e,
        )
    })
}
