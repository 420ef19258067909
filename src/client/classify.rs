//! Classification of YouTube Data API failures into mutation outcomes
//!
//! The API reports failures as a JSON envelope whose `errors[].reason` names
//! the condition (`subscriptionDuplicate`, `quotaExceeded`, ...). The reason
//! wins over the HTTP status; the status is only consulted when no known
//! reason is present.

use super::MutationOutcome;
use reqwest::{Error as ReqwestError, StatusCode};
use serde::Deserialize;

const DUPLICATE_REASONS: &[&str] = &["subscriptionDuplicate"];
const NOT_FOUND_REASONS: &[&str] = &["channelNotFound", "publisherNotFound"];
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded"];
const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

/// Google API error envelope (`{"error": {...}}`)
#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

/// Decoded `error` object of a failed API response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    /// HTTP status echoed by the API
    #[serde(default)]
    pub code: u16,
    /// Top-level message
    #[serde(default)]
    pub message: String,
    /// Individual error entries
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

/// One entry of the `errors` array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorDetail {
    /// Machine-readable reason (e.g., "quotaExceeded")
    #[serde(default)]
    pub reason: String,
    /// Error domain (e.g., "youtube.quota")
    #[serde(default)]
    pub domain: String,
    /// Detail message
    #[serde(default)]
    pub message: String,
}

impl ApiErrorBody {
    /// Parse a response body, returning `None` when it is not an error envelope
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error)
    }

    /// First reported reason, if any
    pub fn reason(&self) -> Option<&str> {
        self.errors
            .iter()
            .map(|detail| detail.reason.as_str())
            .find(|reason| !reason.is_empty())
    }

    fn has_reason(&self, candidates: &[&str]) -> bool {
        self.errors
            .iter()
            .any(|detail| candidates.contains(&detail.reason.as_str()))
    }
}

/// Classify a non-success API response
pub fn classify_api_error(status: StatusCode, body: &str) -> MutationOutcome {
    let parsed = ApiErrorBody::parse(body);

    if let Some(error) = &parsed {
        if error.has_reason(DUPLICATE_REASONS) {
            return MutationOutcome::AlreadyExists;
        }
        if error.has_reason(NOT_FOUND_REASONS) {
            return MutationOutcome::NotFound;
        }
        if error.has_reason(QUOTA_REASONS) {
            return MutationOutcome::QuotaExceeded;
        }
        if error.has_reason(RATE_LIMIT_REASONS) {
            return MutationOutcome::RateLimited;
        }
    }

    let detail = parsed
        .as_ref()
        .and_then(|error| error.reason().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    if status == StatusCode::TOO_MANY_REQUESTS {
        return MutationOutcome::RateLimited;
    }

    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        return MutationOutcome::TransientError(detail);
    }

    MutationOutcome::UnknownError(detail)
}

/// Classify a request that never produced a response
///
/// Timeouts and connection failures are transient by definition; anything
/// else the transport reports is retried the same way.
pub fn classify_transport_error(err: &ReqwestError) -> MutationOutcome {
    let kind = if err.is_timeout() {
        "network timeout"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "network error"
    };
    MutationOutcome::TransientError(format!("{kind}: {err}"))
}
