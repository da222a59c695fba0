//! Wire and on-disk data shapes shared by the workflows.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// OAuth token as returned by the accounts service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl Token {
    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Accounts user. Only the fields the CLI relies on are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub git_username: Option<String>,
    #[serde(default)]
    pub git_password: Option<String>,
    #[serde(default)]
    pub last_used_cli_at: Option<String>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
}

/// Output category of a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Html,
    Image,
    Print,
    Video,
    Audio,
    Fallback,
    Source,
}

impl Format {
    pub const ALL: [Format; 7] = [
        Format::Html,
        Format::Image,
        Format::Print,
        Format::Video,
        Format::Audio,
        Format::Fallback,
        Format::Source,
    ];

    /// Formats offered when creating a new visual, with their labels.
    pub const CREATABLE: [(Format, &'static str); 6] = [
        (Format::Html, "HTML5"),
        (Format::Image, "Image (jpg, png)"),
        (Format::Print, "Print (pdf)"),
        (Format::Video, "Video (mp4, avi)"),
        (Format::Audio, "Audio (mp3, wav)"),
        (Format::Fallback, "Fallback (jpg)"),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Image => "image",
            Format::Print => "print",
            Format::Video => "video",
            Format::Audio => "audio",
            Format::Fallback => "fallback",
            Format::Source => "source",
        }
    }

    pub fn parse(value: &str) -> Option<Format> {
        Format::ALL.into_iter().find(|f| f.as_str() == value)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of a visual's `config.json` as written by `create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConfig {
    pub name: String,
    pub description: String,
    pub format: Format,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_click_tag: Option<String>,
}

impl VisualConfig {
    pub fn new(name: String, description: String, format: Format, tags: Vec<String>) -> Self {
        let fallback_click_tag = (format == Format::Fallback).then(String::new);
        Self {
            name,
            description,
            format,
            tags,
            fallback_click_tag,
        }
    }
}

/// Response of the client API `visual` listing used by `sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncListing {
    pub user: User,
    #[serde(default)]
    pub brands: IndexMap<String, IndexMap<String, RemoteVisual>>,
}

/// Per-user sync marker attached to a listed visual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualSync {
    #[serde(default)]
    pub id: i64,
}

/// A visual as listed by the client API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVisual {
    pub origin: String,
    /// `None` when the server did not send the field at all (older servers),
    /// `Some(None)` when the user deselected the visual.
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub visual_sync_for_logged_user: Option<Option<VisualSync>>,
}

impl RemoteVisual {
    /// Whether the visual should be present locally. Servers that do not
    /// send the marker predate per-user selection, so everything syncs.
    pub fn is_synced(&self) -> bool {
        !matches!(self.visual_sync_for_logged_user, Some(None))
    }
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<VisualSync>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<VisualSync>::deserialize(deserializer).map(Some)
}

/// Brand entry of the client API `brand` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    pub git_organization_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandListing {
    pub brands: Vec<Brand>,
}

/// Payload for creating a visual through the client API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVisual {
    pub git_organization_name: String,
    pub output_category: Format,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Visual returned after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedVisual {
    pub origin: String,
    pub git_repo_name: String,
}

/// Remote endpoint as described by the devstack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    pub method: String,
}

pub type Endpoints = BTreeMap<String, Endpoint>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleStatus {
    Pending,
    Ready,
    Failed,
}

/// Remote bundle (resize session) backing `dev`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub id: String,
    pub status: BundleStatus,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body for creating a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBundle {
    pub visual: String,
    pub sizes: Vec<String>,
}

/// Result of remote schema validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub valid: bool,
    #[serde(default)]
    pub log: Vec<SchemaLogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaLogEntry {
    pub message: String,
}
