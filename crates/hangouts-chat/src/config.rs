//! Handler configuration.
//!
//! Every option can be given as a command-line flag, most of them also as an
//! environment variable. Check and entity annotations under [`KEYSPACE`] can
//! override any option for a single event.

use clap::Args;
use std::convert::Infallible;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::events::Event;

/// Annotation prefix for per-event configuration overrides.
pub const KEYSPACE: &str = "sensu.io/plugins/sensu-hangouts-chat-handler/config";

/// Dashboard value that turns the dashboard link off.
pub const DASHBOARD_DISABLED: &str = "disabled";

pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{{.Entity.Name}}/{{.Check.Name}}";
pub const DEFAULT_MESSAGE_LIMIT: usize = 130;
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "{{.Check.Output}}";
pub const DEFAULT_DESCRIPTION_LIMIT: usize = 1500;

/// Where the `threadKey` query parameter takes its value from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadKeySource {
    /// The event UUID
    #[default]
    Id,
    /// `entity.name-check.name`
    Alias,
}

impl ThreadKeySource {
    /// Parse a source name. Anything other than `alias` selects the event id.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "alias" => Self::Alias,
            "id" => Self::Id,
            other => {
                warn!(value = other, "Unknown threadKey source, using the event id");
                Self::Id
            }
        }
    }
}

fn thread_key_source(value: &str) -> Result<ThreadKeySource, Infallible> {
    Ok(ThreadKeySource::parse(value))
}

/// Options recognised by the handler.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct HandlerConfig {
    /// The Webhook URL, use default from HANGOUTSCHAT_WEBHOOK env var
    #[arg(
        short = 'w',
        long = "webhook",
        env = "HANGOUTSCHAT_WEBHOOK",
        default_value = "",
        hide_env_values = true
    )]
    pub webhook: String,

    /// Sensu dashboard base URL used for the source link, or "disabled".
    /// Example: http://sensu-dashboard.example.local/c/~/n
    #[arg(
        short = 's',
        long = "sensuDashboard",
        env = "HANGOUTSCHAT_SENSU_DASHBOARD",
        default_value = DASHBOARD_DISABLED
    )]
    pub sensu_dashboard: String,

    /// Include event, check and entity annotations in the message
    #[arg(short = 'a', long = "withAnnotations")]
    pub with_annotations: bool,

    /// Include event, check and entity labels in the message
    #[arg(short = 'W', long = "withLabels")]
    pub with_labels: bool,

    /// The template for the message title
    #[arg(
        short = 'm',
        long = "messageTemplate",
        env = "HANGOUTSCHAT_MESSAGE_TEMPLATE",
        default_value = DEFAULT_MESSAGE_TEMPLATE
    )]
    pub message_template: String,

    /// The maximum length of the message title, in bytes
    #[arg(
        short = 'l',
        long = "messageLimit",
        env = "HANGOUTSCHAT_MESSAGE_LIMIT",
        default_value_t = DEFAULT_MESSAGE_LIMIT
    )]
    pub message_limit: usize,

    /// The template for the check output section
    #[arg(
        short = 'd',
        long = "descriptionTemplate",
        env = "HANGOUTSCHAT_DESCRIPTION_TEMPLATE",
        default_value = DEFAULT_DESCRIPTION_TEMPLATE
    )]
    pub description_template: String,

    /// The maximum length of the check output section, in bytes
    #[arg(
        short = 'L',
        long = "descriptionLimit",
        env = "HANGOUTSCHAT_DESCRIPTION_LIMIT",
        default_value_t = DEFAULT_DESCRIPTION_LIMIT
    )]
    pub description_limit: usize,

    /// Replace -, / and \ with spaces and title-case the message title
    #[arg(short = 'T', long = "titlePrettify")]
    pub title_prettify: bool,

    /// Comma separated check annotations to post as link buttons, e.g. prometheus_url
    #[arg(
        short = 'A',
        long = "annotations-as-link",
        env = "HANGOUTSCHAT_ANNOTATIONS_LINK",
        default_value = ""
    )]
    pub annotations_as_link: String,

    /// Post every check annotation ending with this suffix as a link button, e.g. _url
    #[arg(
        short = 'S',
        long = "annotations-suffix-link",
        env = "HANGOUTSCHAT_ANNOTATIONS_SUFFIX_LINK",
        default_value = ""
    )]
    pub annotations_suffix_link: String,

    /// Comma separated annotations to skip when matching the link suffix
    #[arg(
        short = 'E',
        long = "annotations-suffix-exclude",
        env = "HANGOUTSCHAT_ANNOTATIONS_SUFFIX_EXCLUDE",
        default_value = ""
    )]
    pub annotations_suffix_exclude: String,

    /// Send the message with a threadKey query parameter
    #[arg(long = "threadKey")]
    pub thread_key: bool,

    /// Source of the threadKey value: id or alias (entity.name-check.name)
    #[arg(long = "threadKey-value", value_parser = thread_key_source, default_value = "id")]
    pub thread_key_value: ThreadKeySource,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            webhook: String::new(),
            sensu_dashboard: DASHBOARD_DISABLED.to_string(),
            with_annotations: false,
            with_labels: false,
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            message_limit: DEFAULT_MESSAGE_LIMIT,
            description_template: DEFAULT_DESCRIPTION_TEMPLATE.to_string(),
            description_limit: DEFAULT_DESCRIPTION_LIMIT,
            title_prettify: false,
            annotations_as_link: String::new(),
            annotations_suffix_link: String::new(),
            annotations_suffix_exclude: String::new(),
            thread_key: false,
            thread_key_value: ThreadKeySource::Id,
        }
    }
}

impl HandlerConfig {
    /// Reject configurations that cannot deliver anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook.trim().is_empty() {
            return Err(ConfigError::MissingWebhook);
        }
        url::Url::parse(&self.webhook).map_err(|source| ConfigError::InvalidWebhook {
            url: self.webhook.clone(),
            source,
        })?;
        Ok(())
    }

    /// Annotation keys to render as link buttons.
    #[must_use]
    pub fn link_annotations(&self) -> Vec<String> {
        parse_list(&self.annotations_as_link)
    }

    /// Annotation keys exempt from suffix matching.
    #[must_use]
    pub fn suffix_exclusions(&self) -> Vec<String> {
        parse_list(&self.annotations_suffix_exclude)
    }

    /// Whether the dashboard source link is turned on.
    #[must_use]
    pub fn dashboard_enabled(&self) -> bool {
        self.sensu_dashboard != DASHBOARD_DISABLED
    }

    /// Return a copy of this configuration with the keyspace annotations of
    /// `event` applied. A check annotation takes precedence over an entity
    /// annotation for the same option; empty values are ignored.
    pub fn with_annotation_overrides(&self, event: &Event) -> Result<Self, ConfigError> {
        let mut config = self.clone();

        // Entity first so that check values overwrite them.
        let scopes = [
            &event.entity.metadata.annotations,
            &event.check.metadata.annotations,
        ];

        for annotations in scopes {
            for (key, value) in annotations {
                let Some(option) = key
                    .strip_prefix(KEYSPACE)
                    .and_then(|rest| rest.strip_prefix('/'))
                else {
                    continue;
                };
                if value.is_empty() {
                    continue;
                }
                config.set_option(option, value)?;
            }
        }

        Ok(config)
    }

    fn set_option(&mut self, option: &str, value: &str) -> Result<(), ConfigError> {
        match option {
            "webhook" => self.webhook = value.to_string(),
            "sensuDashboard" => self.sensu_dashboard = value.to_string(),
            "withAnnotations" => self.with_annotations = parse_bool(option, value)?,
            "withLabels" => self.with_labels = parse_bool(option, value)?,
            "messageTemplate" => self.message_template = value.to_string(),
            "messageLimit" => self.message_limit = parse_value(option, value)?,
            "descriptionTemplate" => self.description_template = value.to_string(),
            "descriptionLimit" => self.description_limit = parse_value(option, value)?,
            "titlePrettify" => self.title_prettify = parse_bool(option, value)?,
            "annotations-as-link" => self.annotations_as_link = value.to_string(),
            "annotations-suffix-link" => self.annotations_suffix_link = value.to_string(),
            "annotations-suffix-exclude" => self.annotations_suffix_exclude = value.to_string(),
            "threadKey" => self.thread_key = parse_bool(option, value)?,
            "threadKey-value" => self.thread_key_value = ThreadKeySource::parse(value),
            _ => {
                debug!(option, "Ignoring unknown configuration override");
                return Ok(());
            }
        }
        debug!(option, "Applied configuration override from annotation");
        Ok(())
    }
}

/// Split a comma separated list. A value without commas is a single element;
/// blank entries are dropped.
#[must_use]
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_value<T>(option: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

// Accepts the same spellings as Go's strconv.ParseBool, which annotation
// values written for other Sensu plugins rely on.
fn parse_bool(option: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ConfigError::InvalidOption {
            option: option.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
