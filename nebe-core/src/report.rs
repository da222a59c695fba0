//! Error-tracking events and the configuration report sent by `send-report`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Info,
}

/// One event for the error-tracking service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvent {
    pub event_id: String,
    pub level: Level,
    pub message: String,
    /// Error chain, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    pub release: String,
    pub environment: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extra: Value,
    pub timestamp: String,
}

impl ReportEvent {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("version".to_string(), crate::VERSION.to_string());
        Self {
            event_id: uuid::Uuid::new_v4().simple().to_string(),
            level,
            message: message.into(),
            causes: Vec::new(),
            release: format!("nebe@{}", crate::VERSION),
            environment: String::new(),
            tags,
            extra: Value::Null,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Event for an error, capturing its `source()` chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut event = ReportEvent::new(Level::Error, error.to_string());
        let mut source = error.source();
        while let Some(cause) = source {
            event.causes.push(cause.to_string());
            source = cause.source();
        }
        event
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags.insert(key.to_string(), value.into());
        self
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = extra;
        self
    }
}

/// Environment and settings snapshot sent by `send-report`. Cached sync
/// listings are skipped and credentials are redacted.
pub fn configuration_report<I>(env: I, settings: &Map<String, Value>) -> Value
where
    I: IntoIterator<Item = (String, String)>,
{
    let env: BTreeMap<String, String> = env
        .into_iter()
        .map(|(key, value)| {
            let upper = key.to_ascii_uppercase();
            if ["SECRET", "TOKEN", "PASSWORD", "KEY"]
                .iter()
                .any(|s| upper.contains(s))
            {
                (key, "<redacted>".to_string())
            } else {
                (key, value)
            }
        })
        .collect();
    let mut config = settings.clone();
    let skipped = crate::settings::LAST_SYNC_RESPONSE;
    if config.contains_key(skipped) {
        config.insert(skipped.to_string(), Value::String("<skipped>".into()));
    }
    config.remove(&format!("{skipped}Sazka"));
    for (key, value) in config.iter_mut() {
        if key.starts_with(crate::settings::PASSWORD) || key.starts_with(crate::settings::TOKEN) {
            *value = Value::String("<redacted>".into());
        }
    }

    serde_json::json!({
        "env": env,
        "config": config,
    })
}
