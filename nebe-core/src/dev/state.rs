//! JSON state published on the dev state server (`GET /state`), read by
//! the studio to show what the running dev session serves.

use crate::checks::SchemaCheck;
use crate::git_status::GitStatus;
use crate::model::{Bundle, BundleStatus, SchemaValidation};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedState = Arc<RwLock<DevState>>;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevState {
    pub visual_path: String,
    pub git_status: Option<GitStatus>,
    pub config: Option<Value>,
    pub schema: Option<Value>,
    pub schema_valid: Option<bool>,
    pub schema_response: Option<SchemaValidation>,
    pub schema_messages: Vec<String>,
    pub folders: Vec<String>,
    /// Local previews keyed by their index in the selection.
    pub bundlers: BTreeMap<usize, PreviewState>,
    pub remote: Option<RemoteState>,
}

impl DevState {
    pub fn new(visual_path: impl Into<String>) -> Self {
        Self {
            visual_path: visual_path.into(),
            ..Default::default()
        }
    }

    pub fn apply_schema(&mut self, check: &SchemaCheck) {
        self.schema = check.schema.clone();
        self.schema_valid = Some(check.valid);
        self.schema_response = check.response.clone();
        self.schema_messages = check.messages.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewState {
    pub folder: String,
    pub port: u16,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteState {
    pub id: String,
    pub status: BundleStatus,
    pub preview_url: Option<String>,
}

impl From<&Bundle> for RemoteState {
    fn from(bundle: &Bundle) -> Self {
        Self {
            id: bundle.id.clone(),
            status: bundle.status,
            preview_url: bundle.preview_url.clone(),
        }
    }
}
