//! Google Hangouts Chat webhook channel.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::{HandlerConfig, ThreadKeySource};
use crate::error::{ChannelError, ConfigError};
use crate::events::Event;
use crate::NotifyChannel;

/// Upper bound for the whole webhook request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameter that groups messages into a conversation thread.
const THREAD_KEY_PARAM: &str = "threadKey";

/// Hangouts Chat incoming webhook channel.
pub struct HangoutsChannel {
    client: reqwest::Client,
}

impl HangoutsChannel {
    /// Create a channel whose requests time out after [`REQUEST_TIMEOUT`].
    pub fn new() -> Result<Self, ChannelError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a channel with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NotifyChannel for HangoutsChannel {
    fn name(&self) -> &'static str {
        "hangouts"
    }

    async fn send(&self, url: &Url, body: Vec<u8>) -> Result<(), ChannelError> {
        debug!(channel = "hangouts", host = ?url.host_str(), "Sending notification");

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = "hangouts", status = %status, "Notification sent successfully");
            Ok(())
        } else {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(
                        channel = "hangouts",
                        status = %status,
                        error = %e,
                        "Failed to read webhook response body"
                    );
                    String::new()
                }
            };
            Err(ChannelError::Status { status, body })
        }
    }
}

/// The URL to POST to for `event`: the configured webhook, plus a
/// `threadKey` parameter when threading is enabled.
pub fn webhook_url(config: &HandlerConfig, event: &Event) -> Result<Url, ConfigError> {
    let mut url = Url::parse(&config.webhook).map_err(|source| ConfigError::InvalidWebhook {
        url: config.webhook.clone(),
        source,
    })?;

    if config.thread_key {
        let key = match config.thread_key_value {
            ThreadKeySource::Id => event.uuid().to_string(),
            ThreadKeySource::Alias => event.alias(),
        };
        url.query_pairs_mut().append_pair(THREAD_KEY_PARAM, &key);
    }

    Ok(url)
}
