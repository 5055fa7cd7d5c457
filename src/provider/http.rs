//! Shared HTTP client, SSE parsing, and status mapping.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::config::DEFAULT_TIMEOUT;
use crate::error::GenaiError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| build_client(DEFAULT_TIMEOUT).unwrap_or_default())
}

pub fn build_client(timeout: Duration) -> Result<reqwest::Client, GenaiError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()?)
}

/// Headers for a Gemini API-key request.
pub fn gemini_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(api_key) {
        headers.insert("x-goog-api-key", val);
    }
    headers
}

/// Parse an SSE "data:" line, returning None for other lines and "[DONE]".
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> GenaiError {
    let message = extract_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => GenaiError::Authentication(message),
        429 => GenaiError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => GenaiError::api(status, message),
    }
}

fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Google APIs report the delay as a `RetryInfo` detail, e.g. `"retryDelay": "13s"`.
fn extract_retry_after(body: &str) -> Option<u64> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    value
        .get("error")?
        .get("details")?
        .as_array()?
        .iter()
        .filter_map(|d| d.get("retryDelay").and_then(|r| r.as_str()))
        .find_map(|delay| delay.strip_suffix('s')?.parse::<f64>().ok())
        .map(|secs| (secs * 1000.0) as u64)
}
