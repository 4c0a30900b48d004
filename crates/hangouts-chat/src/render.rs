//! Rendering of events into Hangouts Chat cards.
//!
//! Everything here is pure: a configuration and an event go in, text or card
//! structures come out.

use std::fmt::Write as _;
use tracing::warn;

use crate::card::{Button, Card, ChatCard, Header, Section, Widget};
use crate::config::{HandlerConfig, KEYSPACE};
use crate::events::{Event, Metadata};
use crate::template::TemplateEngine;

/// Card header title.
pub const CARD_TITLE: &str = "Sensu Event";

/// Label of the check output section.
pub const CHECK_OUTPUT_LABEL: &str = "Check Output";

/// Link used when no other button applies.
pub const DOCUMENTATION_URL: &str = "https://docs.sensu.io/sensu-go/latest";

/// Label of the dashboard link button.
const DASHBOARD_BUTTON: &str = "Sensu Source";

/// Label of the documentation fallback button.
const DOCUMENTATION_BUTTON: &str = "Sensu Documentation";

/// Render the message title (the card subtitle).
///
/// Template failures render an empty title.
pub fn render_title(engine: &TemplateEngine, config: &HandlerConfig, event: &Event) -> String {
    let title = match engine.evaluate("title", &config.message_template, event) {
        Ok(title) => title,
        Err(e) => {
            warn!(error = %e, "Failed to render message title");
            return String::new();
        }
    };

    if config.title_prettify {
        truncate(&title_prettify(&title), config.message_limit).to_string()
    } else {
        truncate(&title, config.message_limit).to_string()
    }
}

/// Render the check output body. Literal `\n` sequences become newlines.
///
/// Template failures render an empty body.
pub fn render_body(engine: &TemplateEngine, config: &HandlerConfig, event: &Event) -> String {
    match engine.evaluate("description", &config.description_template, event) {
        Ok(body) => truncate(&body.replace("\\n", "\n"), config.description_limit).to_string(),
        Err(e) => {
            warn!(error = %e, "Failed to render description");
            String::new()
        }
    }
}

/// Fixed-format summary of the event, optionally followed by the filtered
/// annotations and labels of the event, check and entity.
pub fn render_summary(config: &HandlerConfig, event: &Event) -> String {
    let mut message = format!(
        "Entity: {}, \nCheck: {}, \nCommand: {}, ",
        event.entity.metadata.name, event.check.metadata.name, event.check.command
    );
    if !event.check.proxy_entity_name.is_empty() {
        let _ = writeln!(message, "\nProxy_Entity: {}, ", event.check.proxy_entity_name);
    }

    let links = config.link_annotations();

    if config.with_annotations {
        let annotations = scoped_metadata(
            &links,
            [
                ("event", &event.metadata.annotations),
                ("check", &event.check.metadata.annotations),
                ("entity", &event.entity.metadata.annotations),
            ],
        );
        if !annotations.is_empty() {
            let _ = write!(message, "\n Annotations: \n{annotations}");
        }
    }

    if config.with_labels {
        let labels = scoped_metadata(
            &links,
            [
                ("event", &event.metadata.labels),
                ("check", &event.check.metadata.labels),
                ("entity", &event.entity.metadata.labels),
            ],
        );
        if !labels.is_empty() {
            let _ = write!(message, "\n Labels: \n{labels}");
        }
    }

    message
}

fn scoped_metadata(links: &[String], scopes: [(&str, &Metadata); 3]) -> String {
    let mut out = String::new();
    for (scope, entries) in scopes {
        for (key, value) in entries {
            if is_reportable(key, links) {
                let _ = writeln!(out, "{scope}_{key}: {value}, ");
            }
        }
    }
    out
}

/// Whether a metadata key belongs in the summary. Keys carrying handler
/// configuration are never shown, and keys already posted as link buttons
/// are skipped.
#[must_use]
pub fn is_reportable(key: &str, links: &[String]) -> bool {
    !key.contains(KEYSPACE) && !links.iter().any(|link| link == key)
}

/// Two-state label for a check status.
#[must_use]
pub const fn render_status_label(event: &Event) -> &'static str {
    match event.check.status {
        0 => "RESOLVED",
        _ => "ALERT",
    }
}

/// Link buttons for the card: the dashboard source, allow-listed annotation
/// links and suffix-matched annotation links. Falls back to a single
/// documentation link when nothing else applies.
pub fn render_link_buttons(config: &HandlerConfig, event: &Event) -> Vec<Button> {
    let mut buttons = vec![];

    if config.dashboard_enabled() && is_valid_url(&config.sensu_dashboard) {
        buttons.push(Button::link(
            DASHBOARD_BUTTON,
            format!(
                "{}/{}/events/{}/{}",
                config.sensu_dashboard,
                event.entity.metadata.namespace,
                event.entity.metadata.name,
                event.check.metadata.name
            ),
        ));
    }

    let annotations = &event.check.metadata.annotations;

    if !config.annotations_as_link.is_empty() {
        let links = config.link_annotations();
        buttons.extend(
            annotations
                .iter()
                .filter(|(key, value)| links.contains(*key) && is_valid_url(value))
                .map(|(key, value)| Button::link(key.as_str(), value.as_str())),
        );
    }

    if !config.annotations_suffix_link.is_empty() {
        let excluded = config.suffix_exclusions();
        buttons.extend(
            annotations
                .iter()
                .filter(|(key, _)| !excluded.contains(*key))
                .filter(|(key, value)| {
                    key.ends_with(config.annotations_suffix_link.as_str()) && is_valid_url(value)
                })
                .map(|(key, value)| Button::link(key.as_str(), value.as_str())),
        );
    }

    if buttons.is_empty() {
        buttons.push(Button::link(DOCUMENTATION_BUTTON, DOCUMENTATION_URL));
    }

    buttons
}

/// Build the complete card payload for an event.
pub fn assemble_card(engine: &TemplateEngine, config: &HandlerConfig, event: &Event) -> ChatCard {
    let card = Card {
        header: Header {
            title: CARD_TITLE.to_string(),
            subtitle: render_title(engine, config, event),
            image_url: String::new(),
        },
        sections: vec![
            Section::single(Widget::key_value(
                render_status_label(event),
                render_summary(config, event),
            )),
            Section::single(Widget::buttons(render_link_buttons(config, event))),
            Section::single(Widget::key_value(
                CHECK_OUTPUT_LABEL,
                render_body(engine, config, event),
            )),
        ],
    };

    ChatCard { cards: vec![card] }
}

/// Cut `s` to at most `limit` bytes, backing off to a character boundary.
#[must_use]
pub fn truncate(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Replace `-`, `/` and `\` with spaces and upper-case the first letter of
/// every word.
#[must_use]
pub fn title_prettify(s: &str) -> String {
    let spaced = s.replace(['-', '/', '\\'], " ");

    let mut title = String::with_capacity(spaced.len());
    let mut previous = ' ';
    for c in spaced.chars() {
        if is_word_separator(previous) {
            title.extend(c.to_uppercase());
        } else {
            title.push(c);
        }
        previous = c;
    }
    title
}

fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        !(c.is_ascii_alphanumeric() || c == '_')
    } else {
        c.is_whitespace()
    }
}

/// A URL is usable as a link when it has both a scheme and a host.
#[must_use]
pub fn is_valid_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| !url.scheme().is_empty() && url.host().is_some())
        .unwrap_or(false)
}
