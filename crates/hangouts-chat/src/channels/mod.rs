//! Delivery channel implementations.

pub mod hangouts;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::ChannelError;

/// Result of a delivery attempt. Failures are logged, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The webhook accepted the payload
    Delivered,
    /// The webhook answered with a non-success status
    Rejected { status: u16 },
    /// The request could not be completed or the payload not serialized
    Failed,
}

impl DeliveryOutcome {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Trait for webhook delivery channels.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// POST an already serialized payload to `url`.
    async fn send(&self, url: &Url, body: Vec<u8>) -> Result<(), ChannelError>;
}

/// Serialize `payload`, send it through `channel` and log the result.
pub async fn deliver<T>(channel: &dyn NotifyChannel, url: &Url, payload: &T) -> DeliveryOutcome
where
    T: Serialize + Sync,
{
    let channel_name = channel.name();

    let body = match serde_json::to_vec(payload) {
        Ok(body) => body,
        Err(e) => {
            error!(channel = channel_name, error = %e, "Failed to serialize payload");
            return DeliveryOutcome::Failed;
        }
    };

    match channel.send(url, body).await {
        Ok(()) => {
            debug!(channel = channel_name, "Notification sent");
            DeliveryOutcome::Delivered
        }
        Err(ChannelError::Status { status, body }) => {
            warn!(
                channel = channel_name,
                status = %status,
                body = %body,
                "Webhook rejected notification"
            );
            DeliveryOutcome::Rejected {
                status: status.as_u16(),
            }
        }
        Err(e) => {
            error!(
                channel = channel_name,
                error = %e,
                "Failed to send notification"
            );
            DeliveryOutcome::Failed
        }
    }
}
