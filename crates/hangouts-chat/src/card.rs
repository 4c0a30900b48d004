//! Hangouts Chat card message types.
//!
//! See <https://developers.google.com/chat/api/guides/message-formats/cards>.

use serde::{Deserialize, Serialize};

/// Top-level webhook payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCard {
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub header: Header,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub title: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub widgets: Vec<Widget>,
}

impl Section {
    /// A section holding a single widget.
    #[must_use]
    pub fn single(widget: Widget) -> Self {
        Self {
            widgets: vec![widget],
        }
    }
}

/// A widget is either a key-value text block or a row of buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_value: Option<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

impl Widget {
    /// A multiline key-value block.
    #[must_use]
    pub fn key_value(top_label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key_value: Some(KeyValue {
                top_label: top_label.into(),
                content: content.into(),
                content_multiline: true,
            }),
            buttons: vec![],
        }
    }

    #[must_use]
    pub fn buttons(buttons: Vec<Button>) -> Self {
        Self {
            key_value: None,
            buttons,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    pub top_label: String,
    pub content: String,
    pub content_multiline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub text_button: TextButton,
}

impl Button {
    /// A text button that opens `url`.
    #[must_use]
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text_button: TextButton {
                text: text.into(),
                on_click: OnClick {
                    open_link: OpenLink { url: url.into() },
                },
            },
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text_button.text
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.text_button.on_click.open_link.url
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextButton {
    pub text: String,
    pub on_click: OnClick,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnClick {
    pub open_link: OpenLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLink {
    pub url: String,
}
