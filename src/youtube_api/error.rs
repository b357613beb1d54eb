//! Error taxonomy for YouTube Data API calls.

use http::Method;
use serde::Deserialize;
use thiserror::Error;

/// A failed call against the YouTube Data API.
///
/// Listing and insertion failures are recoverable at item granularity: the
/// run records them and keeps going with the remaining channels or videos.
/// [`ApiError::QuotaExceeded`] is the one variant callers inspect, since
/// retrying identical calls against an exhausted daily quota cannot succeed.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("YouTube rejected the credentials: {message}")]
    Auth { message: String },

    #[error("YouTube API quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("rate limited by YouTube: {message}")]
    RateLimited { message: String },

    #[error("{endpoint} returned no matching resource")]
    NotFound { endpoint: String },

    #[error("YouTube API {method} {endpoint} failed with status {status}: {message}")]
    Status {
        method: Method,
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("request to YouTube failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_quota(&self) -> bool {
        matches!(self, ApiError::QuotaExceeded { .. })
    }

    /// Classifies a non-success response.
    ///
    /// Google error bodies look like
    /// `{"error": {"code": 403, "message": "...", "errors": [{"reason": "quotaExceeded"}]}}`.
    /// The `reason` is more precise than the status code (quota exhaustion
    /// and permission problems both arrive as 403), so it wins when present.
    pub(crate) fn from_response(
        method: Method,
        endpoint: &str,
        status: reqwest::StatusCode,
        body: &str,
    ) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|b| b.error.message.clone())
            .unwrap_or_else(|| body.trim().to_string());
        let reason = parsed
            .as_ref()
            .and_then(|b| b.error.errors.iter().find_map(|e| e.reason.as_deref()));

        match reason {
            Some("quotaExceeded" | "dailyLimitExceeded") => {
                return ApiError::QuotaExceeded { message };
            }
            Some("rateLimitExceeded" | "userRateLimitExceeded") => {
                return ApiError::RateLimited { message };
            }
            _ => {}
        }

        match status.as_u16() {
            401 => ApiError::Auth { message },
            404 => ApiError::NotFound {
                endpoint: endpoint.to_string(),
            },
            429 => ApiError::RateLimited { message },
            code => ApiError::Status {
                method,
                endpoint: endpoint.to_string(),
                status: code,
                message,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    reason: Option<String>,
}
