//! Deployment targets and the URL templates of every remote service.
//!
//! A [`Target`] combines the environment (production, staging, local
//! development stack) with the tenant (the default one or the secondary
//! Sazka tenant). [`ServiceUrls`] is derived from it and is the only place
//! hosts are spelled out; tests build their own `ServiceUrls` pointing at an
//! in-process server.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Staging,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tenant {
    #[default]
    Default,
    Sazka,
}

impl Tenant {
    /// Suffix appended to settings keys of this tenant.
    pub fn key_suffix(&self) -> &'static str {
        match self {
            Tenant::Default => "",
            Tenant::Sazka => "Sazka",
        }
    }
}

/// Port the OAuth callback listener binds to.
pub const OAUTH_CALLBACK_PORT: u16 = 8050;
/// Port of the dev state server.
pub const STATE_PORT: u16 = 1400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Target {
    pub environment: Environment,
    pub tenant: Tenant,
}

impl Target {
    pub fn new(environment: Environment, tenant: Tenant) -> Self {
        Self {
            environment,
            tenant,
        }
    }

    pub fn is_local(&self) -> bool {
        self.environment == Environment::Local
    }

    /// Name of the binary as users know it for this tenant.
    pub fn bin(&self) -> &'static str {
        match self.tenant {
            Tenant::Default => "nebe",
            Tenant::Sazka => "nebe-sazka",
        }
    }

    /// Command line hint for `command`, carrying the tenant flag.
    pub fn command(&self, command: &str) -> String {
        match self.tenant {
            Tenant::Default => format!("nebe {command}"),
            Tenant::Sazka => format!("nebe {command} --sazka"),
        }
    }

    /// First preview port of `dev`; resizes get consecutive ports.
    pub fn dev_base_port(&self) -> u16 {
        match self.tenant {
            Tenant::Default => 1200,
            Tenant::Sazka => 1300,
        }
    }

    pub fn urls(&self) -> ServiceUrls {
        let client_host = match self.tenant {
            Tenant::Default => "client",
            Tenant::Sazka => "sazka",
        };

        match self.environment {
            Environment::Local => ServiceUrls {
                accounts: "http://localhost/api".into(),
                client: "http://localhost:8000".into(),
                devstack: "http://localhost:3000/api".into(),
                studio: "http://localhost:8060".into(),
                validator: "https://utilities.nebe.app/visual-processor/schema".into(),
                git_host: "git.nebe.app".into(),
                visual_client: "http://localhost:1236/visual-client.min.js".into(),
                visual_helper: "http://localhost:1235/".into(),
            },
            Environment::Staging => ServiceUrls {
                accounts: "https://accounts.staging.ddco.app/api".into(),
                client: format!("https://{client_host}.staging.nebe.app"),
                devstack: "https://devstack.staging.imagelance.com/api".into(),
                studio: "https://studio.staging.ddco.app".into(),
                validator: "https://utilities.nebe.app/visual-processor/schema".into(),
                git_host: "git.nebe.app".into(),
                visual_client: "https://cdn.nebe.app/store/serving/dist/visual-client.min.js"
                    .into(),
                visual_helper: "https://cdn.nebe.app/store/utils/dist/".into(),
            },
            Environment::Production => ServiceUrls {
                accounts: "https://accounts.ddco.app/api".into(),
                client: format!("https://{client_host}.nebe.app"),
                devstack: "https://devstack.imagelance.com/api".into(),
                studio: "https://studio.ddco.app".into(),
                validator: "https://utilities.nebe.app/visual-processor/schema".into(),
                git_host: "git.nebe.app".into(),
                visual_client: "https://cdn.nebe.app/store/serving/dist/visual-client.min.js"
                    .into(),
                visual_helper: "https://cdn.nebe.app/store/utils/dist/".into(),
            },
        }
    }
}

/// Base addresses of the remote services for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceUrls {
    pub accounts: String,
    /// Client web application; the CLI API lives under `/api/public/cli`.
    pub client: String,
    pub devstack: String,
    pub studio: String,
    pub validator: String,
    pub git_host: String,
    pub visual_client: String,
    pub visual_helper: String,
}

impl ServiceUrls {
    pub fn accounts_url(&self, path: &str) -> String {
        join(&self.accounts, path)
    }

    pub fn api_url(&self, path: &str) -> String {
        join(&format!("{}/api/public/cli", self.client), path)
    }

    pub fn devstack_url(&self, path: &str) -> String {
        join(&self.devstack, path)
    }

    pub fn studio_url(&self, path: &str) -> String {
        join(&self.studio, path)
    }

    /// Page where users choose which visuals sync locally.
    pub fn sync_settings_url(&self) -> String {
        join(&self.client, "visual/sync")
    }

    /// Authenticated HTTPS remote of a visual repository.
    pub fn git_remote(&self, username: &str, password: &str, repo: &str) -> String {
        format!(
            "https://{}:{}@{}/{}.git",
            urlencoding::encode(username),
            urlencoding::encode(password),
            self.git_host,
            trim_path(repo)
        )
    }
}

/// Strips whitespace and one leading and trailing slash.
pub fn trim_path(path: &str) -> &str {
    let path = path.trim();
    let path = path.strip_prefix('/').unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path)
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), trim_path(path))
}
