//! Loads the YAML configuration file into a [`Configuration`].
//!
//! The file has three optional sections, each a list of descriptors:
//!
//! ```yaml
//! jenkins:
//!   - name: main-ci
//!     url: https://ci.example.com
//!     username: bot
//!     password: secret
//! github:
//!   - organization: acme
//! stash:
//!   - prefix: TEAM
//!     url: https://stash.example.com
//!     username: bot
//!     password: secret
//! ```
//!
//! A missing or malformed file is an error; the caller aborts before any
//! network activity.

use anyhow::Result;
use ci_coverage_core::config::Configuration;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Configuration> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty document is a configuration with no sources.
    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty; no sources configured");
        return Ok(Configuration::default());
    }

    let config: Configuration = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Some(server) = config.jenkins.iter().find(|s| s.url.is_empty()) {
        error!(server = %server.name, "CI server without url");
        anyhow::bail!("CI server {:?} has no url", server.name);
    }
    if let Some(host) = config.stash.iter().find(|s| s.url.is_empty()) {
        error!(prefix = %host.prefix, "Self-hosted server without url");
        anyhow::bail!("Self-hosted server with prefix {:?} has no url", host.prefix);
    }

    config.trace_loaded();
    Ok(config)
}
