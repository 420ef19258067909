//! YouTube Data API v3 client
//!
//! Provides the HTTP implementation of [`SubscriptionApi`]:
//! - `subscriptions.insert` for the idempotent subscribe mutation
//! - `subscriptions.list` (with `forChannelId`) for the already-subscribed check
//! - `subscriptions.list` (paged, `mine=true`) for extraction
//! - `channels.list` (`mine=true`) for the authenticated identity

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::classify::{classify_api_error, classify_transport_error, ApiErrorBody};
use super::{
    ChannelInfo, ClientError, ClientResult, MutationOutcome, SubscriptionApi, SubscriptionPage,
};
use crate::auth::AuthorizedSession;
use crate::transfer::config::{PAGE_SIZE, REQUEST_TIMEOUT};
use crate::SubscriptionRecord;

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// HTTP client bound to one authorized account
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl YouTubeClient {
    /// Create a client for an authorized session
    pub fn new(session: &AuthorizedSession) -> ClientResult<Self> {
        Self::new_with_base_url(session.access_token(), DEFAULT_BASE_URL)
    }

    /// Create with custom base URL (for testing)
    pub fn new_with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// Execute an authorized GET and deserialize the response
    async fn get_json<T>(&self, resource: &str, params: &[(&str, String)]) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(resource);
        debug!("Making GET request to: {} with {} params", url, params.len());

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()
            .await
            .map_err(|e| ClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed = ApiErrorBody::parse(&body).unwrap_or_default();
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                reason: parsed.reason().unwrap_or("unknown").to_string(),
                message: if parsed.message.is_empty() {
                    body
                } else {
                    parsed.message
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to deserialize response: {e}")))
    }
}

#[async_trait]
impl SubscriptionApi for YouTubeClient {
    async fn ensure_subscribed(&self, channel_id: &str) -> MutationOutcome {
        let body = json!({
            "snippet": {
                "resourceId": {
                    "kind": "youtube#channel",
                    "channelId": channel_id,
                }
            }
        });

        let response = match self
            .client
            .post(self.url("subscriptions"))
            .bearer_auth(&self.access_token)
            .query(&[("part", "snippet")])
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status();
        if status.is_success() {
            return MutationOutcome::Success;
        }

        let text = response.text().await.unwrap_or_default();
        debug!(
            channel_id = %channel_id,
            status = status.as_u16(),
            "Subscribe request rejected"
        );
        classify_api_error(status, &text)
    }

    async fn is_already_subscribed(&self, channel_id: &str) -> bool {
        let params = [
            ("part", "snippet".to_string()),
            ("forChannelId", channel_id.to_string()),
            ("mine", "true".to_string()),
        ];

        match self
            .get_json::<SubscriptionListResponse>("subscriptions", &params)
            .await
        {
            Ok(response) => !response.items.is_empty(),
            Err(e) => {
                debug!(channel_id = %channel_id, error = %e, "Subscription check failed, assuming not subscribed");
                false
            }
        }
    }

    async fn list_subscriptions_page(
        &self,
        page_token: Option<&str>,
    ) -> ClientResult<SubscriptionPage> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("mine", "true".to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response: SubscriptionListResponse = self.get_json("subscriptions", &params).await?;

        Ok(SubscriptionPage {
            items: response.items.into_iter().map(Into::into).collect(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn channel_info(&self) -> ClientResult<Option<ChannelInfo>> {
        let params = [("part", "snippet".to_string()), ("mine", "true".to_string())];
        let response: ChannelListResponse = self.get_json("channels", &params).await?;

        Ok(response.items.into_iter().next().map(|channel| ChannelInfo {
            id: channel.id,
            title: channel.snippet.title,
            description: channel.snippet.description,
            custom_url: channel.snippet.custom_url,
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionListResponse {
    #[serde(default)]
    items: Vec<SubscriptionItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    #[serde(default)]
    id: String,
    snippet: SubscriptionSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    published_at: String,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    channel_id: String,
}

impl From<SubscriptionItem> for SubscriptionRecord {
    fn from(item: SubscriptionItem) -> Self {
        Self {
            channel_id: item.snippet.resource_id.channel_id,
            channel_title: item.snippet.title,
            channel_description: item.snippet.description,
            published_at: item.snippet.published_at,
            subscription_id: item.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    custom_url: String,
}
