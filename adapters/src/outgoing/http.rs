use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use rooster_application::error::{AppError, AppResult};
use rooster_application::infrastructure_config::HttpConfig;

pub fn build_client(config: &HttpConfig) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| AppError::ConfigError {
            message: format!("Failed to build HTTP client: {e}"),
        })
}

pub fn map_transport_error(error: &reqwest::Error) -> AppError {
    if error.is_timeout() {
        warn!("Request timed out: {}", error);
        return AppError::Timeout;
    }

    if error.is_decode() {
        return AppError::Internal {
            message: format!("Unexpected response body: {error}"),
        };
    }

    AppError::Network {
        message: error.to_string(),
    }
}

/// Decodes a successful body as `T`, or hands status and raw body to the
/// backend-specific `map_error`.
pub async fn read_json<T, F>(response: Response, map_error: F) -> AppResult<T>
where
    T: DeserializeOwned,
    F: FnOnce(StatusCode, &str) -> AppError,
{
    let status = response.status();
    if status.is_success() {
        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(&e))?;
        return Ok(serde_json::from_slice(&body)?);
    }

    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(&e))?;
    debug!(status = status.as_u16(), body = %body, "Backend returned error");
    Err(map_error(status, &body))
}

pub async fn read_empty<F>(response: Response, map_error: F) -> AppResult<()>
where
    F: FnOnce(StatusCode, &str) -> AppError,
{
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(&e))?;
    debug!(status = status.as_u16(), body = %body, "Backend returned error");
    Err(map_error(status, &body))
}

pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
