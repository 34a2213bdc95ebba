//! Shared HTTP plumbing: endpoint URLs and mapping failures into [`RemoteError`].

use pos_core::RemoteError;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

/// Error body shape returned by the services: `{"error": code, "message": text}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// `base` with `segments` appended, each percent-encoded as one path segment.
pub fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| RemoteError::unknown(format!("base URL {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Classify a transport-level failure (no HTTP status was received).
pub fn transport_error(err: &reqwest::Error) -> RemoteError {
    if err.is_connect() || err.is_timeout() {
        RemoteError::unavailable(err.to_string())
    } else if err.is_decode() {
        RemoteError::unknown(format!("undecodable response: {err}"))
    } else {
        RemoteError::unknown(err.to_string())
    }
}

/// Classify a non-success HTTP status; `body` is the raw response text.
pub fn status_error(status: StatusCode, body: &str) -> RemoteError {
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            RemoteError::unavailable(status.to_string())
        }
        s if s.is_client_error() => RemoteError::rejected(reason(status, body)),
        _ => RemoteError::unknown(format!("{status}: {}", reason(status, body))),
    }
}

/// Turn a response into `Ok(response)` for 2xx, else the classified error.
pub async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn reason(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
