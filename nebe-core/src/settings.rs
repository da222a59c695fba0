//! Persistent key/value settings of the CLI.
//!
//! The store is a single flat JSON object. Keys of the secondary tenant are
//! stored next to the default ones with the tenant suffix appended
//! (`root` / `rootSazka`), so switching tenants never clobbers the other
//! tenant's credentials.
//!
//! # Responsibilities
//! - Load the settings file (a missing file is an empty store)
//! - Typed accessors for the keys the commands rely on
//! - Atomic saves (temp file + rename), tab-indented like the visual files
//!
//! # Errors
//! All failures are [`SettingsError`]; the CLI adds context at its boundary.

use crate::environment::Tenant;
use crate::model::{Token, User};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ROOT: &str = "root";
pub const LAST_DEV: &str = "lastDev";
pub const NEWEST_VISUAL: &str = "newestVisual";
pub const TOKEN: &str = "token";
pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
pub const EMAIL: &str = "email";
pub const USER_ID: &str = "user_id";
pub const NAME: &str = "name";
pub const LAST_SYNC: &str = "lastSync";
pub const LAST_SYNC_RESPONSE: &str = "lastSyncResponseData";

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "NEBE_CONFIG";
/// Environment variable overriding the stored root folder.
pub const ROOT_ENV: &str = "NEBE_ROOT";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("settings file {path} is not a JSON object: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no configuration directory available on this system")]
    NoConfigDir,
    #[error("root folder is not configured, run `{hint}` first")]
    RootNotSet { hint: String },
    #[error("stored value of `{key}` is malformed: {source}")]
    Malformed {
        key: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    tenant: Tenant,
    values: Map<String, Value>,
}

impl Settings {
    /// Default settings location: `$NEBE_CONFIG` or the platform config dir.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        dirs::config_dir()
            .map(|dir| dir.join("nebe-cli").join("config.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    pub fn open(path: impl Into<PathBuf>, tenant: Tenant) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Settings file missing, starting empty");
                Map::new()
            }
            Err(source) => return Err(SettingsError::Read { path, source }),
        };
        Ok(Self {
            path,
            tenant,
            values,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tenant(&self) -> Tenant {
        self.tenant
    }

    fn key(&self, key: &str) -> String {
        format!("{key}{}", self.tenant.key_suffix())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(&self.key(key)).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Serialize) {
        let key = self.key(key);
        match serde_json::to_value(value) {
            Ok(value) => {
                self.values.insert(key, value);
            }
            Err(e) => warn!(key = %key, error = %e, "Refusing to store unserializable value"),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let key = self.key(key);
        self.values.remove(&key)
    }

    /// Every stored key, for all tenants.
    pub fn all(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Drops every key of the current tenant.
    pub fn clear_tenant(&mut self) {
        let suffix = self.tenant.key_suffix();
        let keys: Vec<String> = self
            .values
            .keys()
            .filter(|k| match self.tenant {
                Tenant::Default => !k.ends_with(Tenant::Sazka.key_suffix()),
                Tenant::Sazka => k.ends_with(suffix),
            })
            .cloned()
            .collect();
        for key in keys {
            self.values.remove(&key);
        }
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = crate::visual::to_tab_json(&Value::Object(self.values.clone()))
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Root folder holding `src/`, `dist/` and friends.
    pub fn root(&self) -> Result<PathBuf, SettingsError> {
        if let Ok(root) = std::env::var(ROOT_ENV) {
            if !root.trim().is_empty() {
                return Ok(PathBuf::from(root));
            }
        }
        self.get_str(ROOT)
            .map(PathBuf::from)
            .ok_or_else(|| SettingsError::RootNotSet {
                hint: "nebe root <path>".to_string(),
            })
    }

    pub fn set_root(&mut self, root: &Path) {
        self.set(ROOT, root.to_string_lossy());
    }

    pub fn last_dev(&self) -> Option<&str> {
        self.get_str(LAST_DEV)
    }

    pub fn newest_visual(&self) -> Option<&str> {
        self.get_str(NEWEST_VISUAL)
    }

    pub fn username(&self) -> Option<&str> {
        self.get_str(USERNAME)
    }

    pub fn password(&self) -> Option<&str> {
        self.get_str(PASSWORD)
    }

    pub fn email(&self) -> Option<&str> {
        self.get_str(EMAIL)
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str(NAME)
    }

    pub fn token(&self) -> Result<Option<Token>, SettingsError> {
        match self.get(TOKEN) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| SettingsError::Malformed {
                    key: self.key(TOKEN),
                    source,
                }),
        }
    }

    /// `Authorization` header value of the cached token, if any.
    pub fn access_token(&self) -> Option<String> {
        match self.token() {
            Ok(token) => token.map(|t| t.header_value()),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed cached token");
                None
            }
        }
    }

    pub fn set_token(&mut self, token: &Token) {
        self.set(TOKEN, token);
    }

    /// Stores the user fields the git workflows need.
    pub fn set_user(&mut self, user: &User) {
        self.set(USERNAME, &user.git_username);
        self.set(PASSWORD, &user.git_password);
        self.set(EMAIL, &user.email);
        self.set(USER_ID, user.id);
        self.set(NAME, &user.name);
    }
}
