//! Template evaluation against events using Handlebars.
//!
//! Templates see the event under Go-style field names (`Entity.Name`,
//! `Check.Output`, ...), so templates written for other Sensu handlers keep
//! working. A leading dot on a path (`{{.Check.Output}}`) is accepted.

use handlebars::Handlebars;
use regex::Regex;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::error::TemplateError;
use crate::events::{Event, ObjectMeta};

/// A `{{ ... }}` expression.
static MUSTACHE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{.*?\}\}").expect("valid mustache pattern"));

/// A path with a leading dot inside an expression, e.g. `.Check.Name`.
static DOTTED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[\s(~#/^{])\.([A-Za-z_])").expect("valid dotted path pattern")
});

/// Evaluates user-supplied templates against events.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    #[must_use]
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();

        // Unknown fields are template errors, and output goes into JSON
        // rather than HTML.
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render `template` against `event`. `name` only labels errors.
    pub fn evaluate(&self, name: &str, template: &str, event: &Event) -> Result<String, TemplateError> {
        let template = normalize(template);
        self.handlebars
            .render_template(&template, &context(event))
            .map_err(|source| TemplateError {
                name: name.to_string(),
                source: Box::new(source),
            })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip leading dots from paths so `{{.Check.Name}}` reads as `{{Check.Name}}`.
fn normalize(template: &str) -> Cow<'_, str> {
    MUSTACHE.replace_all(template, |caps: &regex::Captures<'_>| {
        DOTTED_PATH.replace_all(&caps[0], "$1$2").into_owned()
    })
}

fn meta_context(meta: &ObjectMeta) -> Value {
    json!({
        "Name": meta.name,
        "Namespace": meta.namespace,
        "Labels": meta.labels,
        "Annotations": meta.annotations,
    })
}

/// The template view of an event.
fn context(event: &Event) -> Value {
    let mut entity = meta_context(&event.entity.metadata);
    entity["EntityClass"] = json!(event.entity.entity_class);
    entity["System"] = event.entity.system.clone();

    let check = &event.check;
    let mut check_context = meta_context(&check.metadata);
    check_context["Command"] = json!(check.command);
    check_context["Output"] = json!(check.output);
    check_context["Status"] = json!(check.status);
    check_context["ProxyEntityName"] = json!(check.proxy_entity_name);
    check_context["Occurrences"] = json!(check.occurrences);
    check_context["Interval"] = json!(check.interval);
    check_context["Issued"] = json!(check.issued);
    check_context["Executed"] = json!(check.executed);
    check_context["State"] = json!(check.state);

    json!({
        "ID": event.uuid().to_string(),
        "Timestamp": event.timestamp,
        "Labels": event.metadata.labels,
        "Annotations": event.metadata.annotations,
        "Entity": entity,
        "Check": check_context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> Event {
        let mut event = Event::new("foo", "bar");
        event.check.output = "Check OK".to_string();
        event.check.status = 2;
        event
    }

    #[test]
    fn test_dotted_and_plain_paths() {
        let engine = TemplateEngine::new();
        assert_eq!(
            engine.evaluate("title", "{{.Entity.Name}}/{{.Check.Name}}", &event()).unwrap(),
            "foo/bar"
        );
        assert_eq!(
            engine.evaluate("description", "{{Check.Output}}", &event()).unwrap(),
            "Check OK"
        );
    }

    #[test]
    fn test_block_helpers_accept_dotted_paths() {
        let engine = TemplateEngine::new();
        let rendered = engine
            .evaluate("title", "{{#if .Check.Status}}failing{{else}}ok{{/if}}", &event())
            .unwrap();
        assert_eq!(rendered, "failing");
    }

    #[test]
    fn test_output_is_not_html_escaped() {
        let mut event = event();
        event.check.output = "a < b && \"c\"".to_string();
        let engine = TemplateEngine::new();
        assert_eq!(
            engine.evaluate("description", "{{Check.Output}}", &event).unwrap(),
            "a < b && \"c\""
        );
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let engine = TemplateEngine::new();
        let err = engine
            .evaluate("title", "{{.Check.Nope}}", &event())
            .unwrap_err();
        assert_eq!(err.name, "title");
    }

    #[test]
    fn test_unclosed_expression_is_an_error() {
        let engine = TemplateEngine::new();
        assert!(engine.evaluate("title", "{{Check.Name", &event()).is_err());
    }

    #[test]
    fn test_normalize_leaves_text_alone() {
        assert_eq!(normalize("v1.2 {{.Check.Name}} ./x"), "v1.2 {{Check.Name}} ./x");
        assert_eq!(normalize("{{../Name}}"), "{{../Name}}");
    }
}
