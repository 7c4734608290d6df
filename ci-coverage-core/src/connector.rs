//! HTTP implementation of [`Connector`], plus the request helpers the three
//! clients share.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::{CiServerConfig, PublicHostConfig, SelfHostedConfig};
use crate::contract::{CiClient, Connector, PublicHostClient, SelfHostedClient};
use crate::error::ClientError;
use crate::github::GithubClient;
use crate::jenkins::JenkinsClient;
use crate::stash::StashClient;

/// HTTP defaults applied to every client built by an [`HttpConnector`].
#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    /// Per-request timeout. `None` waits forever.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            user_agent: concat!("ci-coverage/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Builds reqwest-backed clients that share one connection pool.
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    pub fn new(options: &ConnectorOptions) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent(options.user_agent.as_str());
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Builder)?;
        info!(timeout = ?options.timeout, "Initialized HTTP connector");
        Ok(Self { http })
    }
}

impl Connector for HttpConnector {
    fn ci_client(&self, server: &CiServerConfig) -> Result<Box<dyn CiClient>, ClientError> {
        Ok(Box::new(JenkinsClient::new(
            self.http.clone(),
            &server.url,
            Credentials::from_parts(server.username(), server.password.as_deref()),
        )))
    }

    fn public_host_client(
        &self,
        host: &PublicHostConfig,
    ) -> Result<Box<dyn PublicHostClient>, ClientError> {
        Ok(Box::new(GithubClient::new(
            self.http.clone(),
            host.api_url(),
            Credentials::from_parts(host.username(), host.password.as_deref()),
        )))
    }

    fn self_hosted_client(
        &self,
        host: &SelfHostedConfig,
    ) -> Result<Box<dyn SelfHostedClient>, ClientError> {
        Ok(Box::new(StashClient::new(
            self.http.clone(),
            &host.url,
            Credentials::from_parts(host.username(), host.password.as_deref()),
        )))
    }
}

/// Basic-auth credentials, passed through untouched.
#[derive(Clone)]
pub(crate) struct Credentials {
    username: String,
    password: Option<String>,
}

impl Credentials {
    /// `None` unless a username is present.
    pub(crate) fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        username.map(|username| Self {
            username: username.to_string(),
            password: password.map(str::to_string),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Issues a GET and returns the response whatever its status.
pub(crate) async fn send_get(
    http: &reqwest::Client,
    url: &str,
    credentials: Option<&Credentials>,
) -> Result<reqwest::Response, ClientError> {
    let mut request = http.get(url);
    if let Some(creds) = credentials {
        request = request.basic_auth(&creds.username, creds.password.as_deref());
    }
    debug!(url = %url, authenticated = credentials.is_some(), "GET");
    request.send().await.map_err(|source| ClientError::Transport {
        url: url.to_string(),
        source,
    })
}

async fn get_success(
    http: &reqwest::Client,
    url: &str,
    credentials: Option<&Credentials>,
) -> Result<reqwest::Response, ClientError> {
    let response = send_get(http, url, credentials).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    credentials: Option<&Credentials>,
) -> Result<T, ClientError> {
    get_success(http, url, credentials)
        .await?
        .json::<T>()
        .await
        .map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
}

pub(crate) async fn get_text(
    http: &reqwest::Client,
    url: &str,
    credentials: Option<&Credentials>,
) -> Result<String, ClientError> {
    get_success(http, url, credentials)
        .await?
        .text()
        .await
        .map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
}
