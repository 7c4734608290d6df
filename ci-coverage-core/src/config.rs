use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default API root of the public host.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Connection descriptors for every source the audit polls, in the order they
/// appear in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub jenkins: Vec<CiServerConfig>,
    #[serde(default)]
    pub github: Vec<PublicHostConfig>,
    #[serde(default)]
    pub stash: Vec<SelfHostedConfig>,
}

impl Configuration {
    pub fn trace_loaded(&self) {
        info!(
            ci_servers = self.jenkins.len(),
            public_hosts = self.github.len(),
            self_hosted_hosts = self.stash.len(),
            "Loaded Configuration"
        );
        for server in &self.jenkins {
            server.trace_loaded();
        }
        debug!(
            organizations = ?self.github.iter().map(|g| g.organization.as_str()).collect::<Vec<_>>(),
            prefixes = ?self.stash.iter().map(|s| s.prefix.as_str()).collect::<Vec<_>>(),
            "Configured repository sources"
        );
    }
}

/// A Jenkins-like CI server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CiServerConfig {
    /// Display name, also stamped on every job found on this server.
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CiServerConfig {
    pub fn trace_loaded(&self) {
        info!(
            name = %self.name,
            url = %self.url,
            authenticated = self.username().is_some(),
            "Loaded CI server"
        );
    }

    /// The username, if one is configured and non-empty.
    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }
}

/// An organization on a GitHub-style public host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicHostConfig {
    pub organization: String,
    /// API root; defaults to [`DEFAULT_GITHUB_API_URL`].
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl PublicHostConfig {
    pub fn api_url(&self) -> &str {
        non_empty(&self.url).unwrap_or(DEFAULT_GITHUB_API_URL)
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    /// Web root matching the API root: `https://github.com` for the public
    /// API, the host root for an Enterprise `.../api/v3` API, otherwise the
    /// API root with a leading `api.` host label dropped.
    pub fn web_url(&self) -> String {
        let api = self.api_url().trim_end_matches('/');
        if api == DEFAULT_GITHUB_API_URL {
            return "https://github.com".to_string();
        }
        match api.strip_suffix("/api/v3") {
            Some(root) => root.to_string(),
            None => api.replacen("://api.", "://", 1),
        }
    }

    /// Web page of the organization, used as the project URL of its repositories.
    pub fn organization_url(&self) -> String {
        format!("{}/{}", self.web_url(), self.organization)
    }
}

/// A Bitbucket Server/Stash-style self-hosted server, restricted to the
/// projects whose key starts with `prefix`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelfHostedConfig {
    #[serde(default)]
    pub prefix: String,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl SelfHostedConfig {
    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
