//! Validation of a visual's `config.json` (local rules) and `schema.json`
//! (delegated to the remote validator).

use crate::contract::DevstackApi;
use crate::model::{Format, SchemaValidation};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

/// Outcome of checking `config.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigCheck {
    /// Problems that make the visual unusable.
    pub errors: Vec<String>,
    /// Problems worth fixing that do not block work.
    pub warnings: Vec<String>,
    pub config: Option<Value>,
}

impl ConfigCheck {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    fn fatal(message: &str) -> Self {
        Self {
            errors: vec![message.to_string()],
            ..Default::default()
        }
    }
}

pub fn check_config(path: &Path) -> ConfigCheck {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "config.json unreadable");
            return ConfigCheck::fatal("config.json does not exist!");
        }
    };

    let config: Value = match serde_json::from_str(&content) {
        Ok(value @ Value::Object(_)) => value,
        _ => return ConfigCheck::fatal("File config.json is not valid JSON"),
    };

    let mut check = ConfigCheck::default();

    match config.get("format").and_then(Value::as_str) {
        None => check.errors.push("Visual's format is not defined".into()),
        Some(format) if Format::parse(format).is_none() => {
            check.errors.push("Visual's format is not correct".into())
        }
        Some(_) => {}
    }

    match config.get("name").and_then(Value::as_str) {
        None => check.errors.push("Visual's name is not defined".into()),
        Some(name) if name.trim().is_empty() => {
            check.errors.push("Visual's name is empty".into())
        }
        Some(_) => {}
    }

    match config.get("description").and_then(Value::as_str) {
        None => check
            .warnings
            .push("Visual's description is not defined".into()),
        Some(description) if description.trim().is_empty() => {
            check.warnings.push("Visual's description is empty".into())
        }
        Some(_) => {}
    }

    check.config = Some(config);
    check
}

/// Outcome of validating `schema.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaCheck {
    pub valid: bool,
    pub messages: Vec<String>,
    /// Raw validator verdict, exposed on the dev state endpoint.
    pub response: Option<SchemaValidation>,
    pub schema: Option<Value>,
}

pub async fn check_schema<D>(path: &Path, devstack: &D) -> SchemaCheck
where
    D: DevstackApi + ?Sized,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            return SchemaCheck {
                messages: vec!["schema.json does not exist!".into()],
                ..Default::default()
            }
        }
    };

    let schema: Value = match serde_json::from_str(&content) {
        Ok(schema) => schema,
        Err(e) => {
            return SchemaCheck {
                messages: vec![format!("schema.json is not valid JSON: {e}")],
                ..Default::default()
            }
        }
    };

    match devstack.validate_schema(&schema).await {
        Ok(verdict) => {
            info!(path = %path.display(), valid = verdict.valid, "Schema validated");
            SchemaCheck {
                valid: verdict.valid,
                messages: verdict.log.iter().map(|l| l.message.clone()).collect(),
                response: Some(verdict),
                schema: Some(schema),
            }
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Schema validation request failed");
            SchemaCheck {
                valid: false,
                messages: vec![format!("Schema validation failed: {e}")],
                response: None,
                schema: Some(schema),
            }
        }
    }
}
