//! Sensu Go handler that posts monitoring events to Google Hangouts Chat.
//!
//! Each event is rendered into a Hangouts Chat card and POSTed to an
//! incoming webhook. Delivery failures are logged and reported as a
//! [`DeliveryOutcome`], never as an error.
//!
//! # Usage
//!
//! ```no_run
//! use hangouts_chat::{Event, Handler, HandlerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HandlerConfig {
//!     webhook: "https://chat.googleapis.com/v1/spaces/AAAA/messages?key=k".to_string(),
//!     ..HandlerConfig::default()
//! };
//! let handler = Handler::new(config)?;
//!
//! let event = Event::new("web-01", "http");
//! let outcome = handler.handle(&event).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`render`] turns a configuration and an event into a [`ChatCard`]
//! - [`TemplateEngine`] evaluates the title and description templates
//! - [`NotifyChannel`] is the delivery seam; [`HangoutsChannel`] implements it
//! - [`Handler`] validates, renders and delivers a single event

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod card;
pub mod channels;
pub mod config;
pub mod error;
pub mod events;
pub mod render;
pub mod template;

pub use card::ChatCard;
pub use channels::hangouts::{webhook_url, HangoutsChannel};
pub use channels::{deliver, DeliveryOutcome, NotifyChannel};
pub use config::{HandlerConfig, ThreadKeySource};
pub use error::{ChannelError, ConfigError, HandlerError, InputError, TemplateError};
pub use events::Event;
pub use template::TemplateEngine;

use std::sync::Arc;
use tracing::{debug, info};

/// Renders events and delivers them through a channel.
pub struct Handler {
    config: HandlerConfig,
    channel: Arc<dyn NotifyChannel>,
    templates: TemplateEngine,
}

impl Handler {
    /// Create a handler that delivers to the Hangouts Chat webhook.
    pub fn new(config: HandlerConfig) -> Result<Self, ChannelError> {
        Ok(Self::with_channel(config, Arc::new(HangoutsChannel::new()?)))
    }

    /// Create a handler with a specific delivery channel.
    #[must_use]
    pub fn with_channel(config: HandlerConfig, channel: Arc<dyn NotifyChannel>) -> Self {
        Self {
            config,
            channel,
            templates: TemplateEngine::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Configuration in effect for `event`, with annotation overrides applied.
    pub fn effective_config(&self, event: &Event) -> Result<HandlerConfig, ConfigError> {
        let config = self.config.with_annotation_overrides(event)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the card for `event` without sending it.
    pub fn render(&self, event: &Event) -> Result<ChatCard, HandlerError> {
        event.validate()?;
        let config = self.effective_config(event)?;
        Ok(render::assemble_card(&self.templates, &config, event))
    }

    /// Validate, render and deliver a single event.
    ///
    /// Only configuration and input problems are errors. Delivery problems are
    /// logged and returned as the outcome.
    pub async fn handle(&self, event: &Event) -> Result<DeliveryOutcome, HandlerError> {
        event.validate()?;
        let config = self.effective_config(event)?;
        let url = webhook_url(&config, event)?;

        let card = render::assemble_card(&self.templates, &config, event);
        debug!(
            entity = %event.entity.metadata.name,
            check = %event.check.metadata.name,
            status = event.check.status,
            "Rendered chat card"
        );

        let outcome = deliver(self.channel.as_ref(), &url, &card).await;
        info!(
            channel = self.channel.name(),
            outcome = ?outcome,
            entity = %event.entity.metadata.name,
            check = %event.check.metadata.name,
            "Handled event"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use url::Url;

    /// Records every request instead of sending it.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<(String, serde_json::Value)>>,
    }

    #[async_trait]
    impl NotifyChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, url: &Url, body: Vec<u8>) -> Result<(), ChannelError> {
            let payload = serde_json::from_slice(&body)?;
            self.sent.lock().unwrap().push((url.to_string(), payload));
            Ok(())
        }
    }

    fn config() -> HandlerConfig {
        HandlerConfig {
            webhook: "https://chat.example/hook?key=k".to_string(),
            ..HandlerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_handle_sends_card() {
        let channel = Arc::new(RecordingChannel::default());
        let handler = Handler::with_channel(config(), channel.clone());

        let outcome = handler.handle(&Event::new("foo", "bar")).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered);

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://chat.example/hook?key=k");
        assert_eq!(sent[0].1["cards"][0]["header"]["subtitle"], "foo/bar");
    }

    #[tokio::test]
    async fn test_missing_webhook_sends_nothing() {
        let channel = Arc::new(RecordingChannel::default());
        let handler = Handler::with_channel(HandlerConfig::default(), channel.clone());

        let err = handler.handle(&Event::new("foo", "bar")).await.unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Config(ConfigError::MissingWebhook)
        ));
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_event_sends_nothing() {
        let channel = Arc::new(RecordingChannel::default());
        let handler = Handler::with_channel(config(), channel.clone());

        let err = handler.handle(&Event::new("", "bar")).await.unwrap_err();
        assert!(matches!(err, HandlerError::Input(InputError::Invalid(_))));
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_render_applies_overrides() {
        let mut event = Event::new("foo", "bar");
        event.check.metadata.annotations.insert(
            format!("{}/messageTemplate", config::KEYSPACE),
            "{{.Check.Name}} on {{.Entity.Name}}".to_string(),
        );

        let handler = Handler::with_channel(config(), Arc::new(RecordingChannel::default()));
        let card = handler.render(&event).unwrap();
        assert_eq!(card.cards[0].header.subtitle, "bar on foo");
    }
}
