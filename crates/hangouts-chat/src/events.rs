//! Sensu Go event types consumed by the handler.
//!
//! Only the parts of the event the handler reads are modelled. Unknown fields
//! are ignored and `null` maps are treated as empty.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::InputError;

/// Key-value metadata attached to an event, check or entity.
pub type Metadata = BTreeMap<String, String>;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Object metadata shared by events, checks and entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub namespace: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Metadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: Metadata,
}

/// The monitored host or service an event is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entity_class: String,
    #[serde(default)]
    pub system: serde_json::Value,
}

/// The check execution an event reports on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Check {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ObjectMeta,
    #[serde(default, deserialize_with = "null_as_default")]
    pub command: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub proxy_entity_name: String,
    #[serde(default)]
    pub occurrences: i64,
    #[serde(default)]
    pub interval: u32,
    #[serde(default)]
    pub issued: i64,
    #[serde(default)]
    pub executed: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
}

/// A monitoring event: one check result for one entity.
///
/// Both `entity` and `check` are required; deserializing an event that lacks
/// either fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ObjectMeta,
    pub entity: Entity,
    pub check: Check,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: i64,
}

impl Event {
    /// Build an event for `entity` and `check` with empty metadata.
    #[must_use]
    pub fn new(entity: &str, check: &str) -> Self {
        Self {
            metadata: ObjectMeta::default(),
            entity: Entity {
                metadata: ObjectMeta {
                    name: entity.to_string(),
                    namespace: "default".to_string(),
                    ..ObjectMeta::default()
                },
                entity_class: "host".to_string(),
                system: serde_json::Value::Null,
            },
            check: Check {
                metadata: ObjectMeta {
                    name: check.to_string(),
                    namespace: "default".to_string(),
                    ..ObjectMeta::default()
                },
                ..Check::default()
            },
            id: None,
            timestamp: 0,
        }
    }

    /// Parse and validate an event from its JSON wire form.
    pub fn from_json(input: &str) -> Result<Self, InputError> {
        let event: Self = serde_json::from_str(input)?;
        event.validate()?;
        Ok(event)
    }

    /// Check the structural requirements the handler relies on.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.entity.metadata.name.is_empty() {
            return Err(InputError::Invalid("entity name must not be empty".into()));
        }
        if self.check.metadata.name.is_empty() {
            return Err(InputError::Invalid("check name must not be empty".into()));
        }
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            Uuid::parse_str(id)
                .map_err(|e| InputError::Invalid(format!("event id {id:?} is not a UUID: {e}")))?;
        }
        Ok(())
    }

    /// The event's UUID, or the nil UUID when the event carries none.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap_or_else(Uuid::nil)
    }

    /// Stable alias for the entity/check pair, used as a thread key.
    #[must_use]
    pub fn alias(&self) -> String {
        format!("{}-{}", self.entity.metadata.name, self.check.metadata.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSU_EVENT: &str = r#"{
        "timestamp": 1594392000,
        "id": "8d3c5f4c-5f1b-4d8e-9a6a-1f0b2c3d4e5f",
        "metadata": {"namespace": "default", "labels": null},
        "entity": {
            "entity_class": "agent",
            "metadata": {"name": "web-01", "namespace": "prod", "labels": {"region": "eu"}}
        },
        "check": {
            "command": "check-http -u http://localhost",
            "output": "HTTP CRITICAL",
            "status": 2,
            "proxy_entity_name": "",
            "metadata": {"name": "http", "annotations": {"runbook_url": "https://runbooks.local/http"}}
        }
    }"#;

    #[test]
    fn test_parse_sensu_event() {
        let event = Event::from_json(SENSU_EVENT).unwrap();
        assert_eq!(event.entity.metadata.name, "web-01");
        assert_eq!(event.entity.metadata.namespace, "prod");
        assert_eq!(event.check.status, 2);
        assert_eq!(
            event.check.metadata.annotations.get("runbook_url").map(String::as_str),
            Some("https://runbooks.local/http")
        );
        assert!(event.metadata.labels.is_empty());
        assert_eq!(
            event.uuid().to_string(),
            "8d3c5f4c-5f1b-4d8e-9a6a-1f0b2c3d4e5f"
        );
    }

    #[test]
    fn test_missing_check_is_rejected() {
        let err = Event::from_json(r#"{"entity": {"metadata": {"name": "web-01"}}}"#).unwrap_err();
        assert!(matches!(err, InputError::Malformed(_)));
        assert!(err.to_string().contains("check"));
    }

    #[test]
    fn test_empty_names_are_rejected() {
        let mut event = Event::new("web-01", "http");
        event.check.metadata.name.clear();
        assert!(matches!(event.validate(), Err(InputError::Invalid(_))));
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        let mut event = Event::new("web-01", "http");
        event.id = Some("not-a-uuid".to_string());
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_missing_id_uses_nil_uuid() {
        let event = Event::new("web-01", "http");
        assert_eq!(event.uuid(), Uuid::nil());
        assert_eq!(event.alias(), "web-01-http");
    }
}
