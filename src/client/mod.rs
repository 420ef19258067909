//! Remote API client for subscription mutations and listing
//!
//! The [`SubscriptionApi`] trait is the seam between the transfer engine and
//! the YouTube Data API. [`YouTubeClient`] is the HTTP implementation; tests
//! drive the engine through scripted implementations of the same trait.

use crate::SubscriptionRecord;
use async_trait::async_trait;
use std::fmt;

pub mod classify;
pub mod youtube;

pub use classify::{classify_api_error, classify_transport_error, ApiErrorBody};
pub use youtube::YouTubeClient;

/// Client errors for list/read operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// API returned an error status
    #[error("API error {status} ({reason}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// First error reason reported by the API
        reason: String,
        /// Human-readable message
        message: String,
    },

    /// Network error (timeout, connection refused, DNS)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Classified result of one "ensure subscribed" call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// A new subscription was created
    Success,
    /// The destination account is already subscribed
    AlreadyExists,
    /// The channel no longer exists
    NotFound,
    /// The API quota is exhausted for the remainder of the run
    QuotaExceeded,
    /// Request was throttled
    RateLimited,
    /// Timeout, connection failure or server error
    TransientError(String),
    /// Unrecognized failure
    UnknownError(String),
}

/// How the retry policy should react to an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Item is now in the desired state
    Done,
    /// Retrying cannot help
    Permanent,
    /// Retry with the long, exponential backoff
    RetryExponential,
    /// Retry with the short, linear backoff
    RetryLinear,
}

impl MutationOutcome {
    /// Map this outcome onto the retry decision
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Success | Self::AlreadyExists => Disposition::Done,
            Self::NotFound | Self::QuotaExceeded => Disposition::Permanent,
            Self::RateLimited => Disposition::RetryExponential,
            Self::TransientError(_) | Self::UnknownError(_) => Disposition::RetryLinear,
        }
    }

    /// Whether another attempt could change the result
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.disposition(),
            Disposition::RetryExponential | Disposition::RetryLinear
        )
    }

    /// Stable label used for log fields and metric labels
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::QuotaExceeded => "quota_exceeded",
            Self::RateLimited => "rate_limited",
            Self::TransientError(_) => "transient_error",
            Self::UnknownError(_) => "unknown_error",
        }
    }
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "subscribed"),
            Self::AlreadyExists => write!(f, "already subscribed"),
            Self::NotFound => write!(f, "channel not found"),
            Self::QuotaExceeded => write!(f, "API quota exceeded"),
            Self::RateLimited => write!(f, "rate limit exceeded"),
            Self::TransientError(detail) => write!(f, "transient error: {detail}"),
            Self::UnknownError(detail) => write!(f, "unknown error: {detail}"),
        }
    }
}

/// Authenticated channel identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel ID
    pub id: String,
    /// Channel title
    pub title: String,
    /// Channel description
    pub description: String,
    /// Custom URL handle, if any
    pub custom_url: String,
}

/// One page of the authenticated account's subscriptions
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPage {
    /// Records on this page
    pub items: Vec<SubscriptionRecord>,
    /// Token for the next page, `None` on the last page
    pub next_page_token: Option<String>,
}

/// Operations the transfer needs from the remote API
#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    /// Subscribe the authenticated account to `channel_id` and classify the result
    ///
    /// Never fails: every error is folded into a [`MutationOutcome`].
    async fn ensure_subscribed(&self, channel_id: &str) -> MutationOutcome;

    /// Cheap check whether the authenticated account already follows `channel_id`
    ///
    /// Errors are swallowed and reported as `false` ("not yet known").
    async fn is_already_subscribed(&self, channel_id: &str) -> bool;

    /// Fetch one page of the authenticated account's subscriptions
    async fn list_subscriptions_page(
        &self,
        page_token: Option<&str>,
    ) -> ClientResult<SubscriptionPage>;

    /// Identity of the authenticated channel
    async fn channel_info(&self) -> ClientResult<Option<ChannelInfo>>;
}
