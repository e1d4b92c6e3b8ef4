//! Shared HTTP client for the panel API.
//!
//! The cookie store carries the auth session cookie, so every adapter built
//! from the same `ApiClient` acts as the same signed-in user.

use crate::domain::DomainError;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Error body returned by the panel: `{ "error": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the panel origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, DomainError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DomainError::Http(format!("Client build failed: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DomainError> {
        let res = self.send(self.request(Method::GET, path)).await?;
        Self::decode(res).await
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, DomainError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self.send(self.request(method, path).json(body)).await?;
        Self::decode(res).await
    }

    /// DELETE, ignoring the `{ success: true }` body.
    pub async fn delete(&self, path: &str) -> Result<(), DomainError> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// Send and turn non-2xx responses into domain errors.
    pub async fn send(&self, req: RequestBuilder) -> Result<Response, DomainError> {
        let res = req
            .send()
            .await
            .map_err(|e| DomainError::Http(format!("Request failed: {}", e)))?;
        let status = res.status();
        debug!(url = %res.url(), status = status.as_u16(), "panel response");
        if status.is_success() {
            return Ok(res);
        }
        let text = res.text().await.unwrap_or_default();
        Err(error_for_status(status, &text))
    }

    async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, DomainError> {
        res.json::<T>()
            .await
            .map_err(|e| DomainError::Http(format!("Invalid response body: {}", e)))
    }
}

/// Map a panel error response. Uses the `{error}` message when the body has one.
pub fn error_for_status(status: StatusCode, body: &str) -> DomainError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DomainError::Auth(message),
        StatusCode::BAD_REQUEST => DomainError::Validation(message),
        _ => DomainError::Store(format!("Panel API error {}: {}", status.as_u16(), message)),
    }
}
