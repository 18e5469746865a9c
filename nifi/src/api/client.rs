use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use url::Url;

use super::error::ApiError;
use super::poll::PollPolicy;
use super::transport::ClientConfig;

/// NiFi API client
///
/// Clones share the same connection pool and the same cross-resource lock.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    drain_poll: PollPolicy,
    port_poll: PollPolicy,
    // Serializes reconciliation sequences that stop, modify and restart
    // entities other than the one being reconciled.
    lock: Mutex<()>,
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(host: &str, api_path: &str) -> Result<Self, ApiError> {
        Self::with_config(host, api_path, ClientConfig::default())
    }

    pub fn with_config(host: &str, api_path: &str, config: ClientConfig) -> Result<Self, ApiError> {
        let host = host.trim_end_matches('/');
        let api_path = api_path.trim_matches('/');
        if host.is_empty() {
            return Err(ApiError::InvalidUrl("host must not be empty".to_string()));
        }

        let raw = format!("{}://{}/{}", config.scheme(), host, api_path);
        let url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
        let base_url = url.as_str().trim_end_matches('/').to_string();

        let http_client = config.build_client()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                drain_poll: config.drain_poll,
                port_poll: config.port_poll,
                lock: Mutex::new(()),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub(crate) fn drain_poll(&self) -> &PollPolicy {
        &self.inner.drain_poll
    }

    pub(crate) fn port_poll(&self) -> &PollPolicy {
        &self.inner.port_poll
    }

    /// Acquire the cross-resource lock; released when the guard drops.
    pub async fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.inner.lock.lock().await
    }

    /// Issue a call and decode the response body into `T`.
    ///
    /// The body is serialized as JSON only when present; any status >= 300 is
    /// returned as `ApiError::Status` so callers can classify 404/409.
    pub async fn call<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let text = self.send(method, path, body).await?;
        parse_body(&text)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.call(Method::POST, path, Some(body)).await
    }

    /// POST without a request body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call::<T, ()>(Method::POST, path, None).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.call(Method::PUT, path, Some(body)).await
    }

    /// DELETE, discarding whatever the server echoes back
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send::<()>(Method::DELETE, path, None).await.map(|_| ())
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        tracing::debug!("{} request to: {}", method, url);

        let mut request = self.inner.http_client.request(method, &url);
        if let Some(body) = body {
            request = request.header(ACCEPT, "application/json").json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("http call status code: {}", status.as_u16());

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status.as_u16() >= 300 {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(text)
    }
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    // Empty bodies decode as JSON null so `()`/Option targets still work.
    let text = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
        ApiError::Parse(e.to_string())
    })
}
