//! Error types for the Hangouts Chat handler.

use thiserror::Error;

/// Errors in the handler configuration. These are fatal and are raised before
/// any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No webhook URL was supplied
    #[error("webhook url for Hangouts Chat is empty")]
    MissingWebhook,

    /// The webhook URL does not parse
    #[error("invalid webhook url {url:?}: {source}")]
    InvalidWebhook {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// An annotation override carried a value the option cannot take
    #[error("invalid value {value:?} for option {option}: {reason}")]
    InvalidOption {
        option: String,
        value: String,
        reason: String,
    },
}

/// Errors in the incoming event. These are fatal and are raised before
/// rendering.
#[derive(Debug, Error)]
pub enum InputError {
    /// The event could not be read from its source
    #[error("failed to read event: {0}")]
    Io(#[from] std::io::Error),

    /// The event is not valid JSON or misses a required record
    #[error("failed to parse event: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The event parsed but is structurally invalid
    #[error("invalid event: {0}")]
    Invalid(String),
}

/// A template could not be evaluated against an event.
#[derive(Debug, Error)]
#[error("failed to evaluate {name} template: {source}")]
pub struct TemplateError {
    pub name: String,
    #[source]
    pub source: Box<handlebars::RenderError>,
}

/// Errors that can occur when sending a card to the webhook.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-success status
    #[error("webhook returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by [`crate::Handler::handle`].
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),
}
