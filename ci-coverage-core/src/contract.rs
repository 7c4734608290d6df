//! # contract: data model and client interfaces
//!
//! The audit talks to three kinds of services: Jenkins-like CI servers,
//! GitHub-style public hosts and Bitbucket Server/Stash-style self-hosted
//! hosts. Each is reached through a small async trait so the pipeline can be
//! driven by the real HTTP clients or by `mockall` mocks in tests.
//!
//! A [`Connector`] turns a configuration descriptor into a client. The
//! pipeline asks for clients lazily, one source at a time, which lets tests
//! assert that a source was never contacted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::config::{CiServerConfig, PublicHostConfig, SelfHostedConfig};
use crate::error::ClientError;

/// One CI job and the source-control URL its build configuration points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub ci_server: String,
    pub name: String,
    pub url: String,
    pub scm_url: String,
}

/// One repository and every URL form under which it can be cloned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitRepository {
    pub project: String,
    pub project_url: String,
    pub name: String,
    pub url: String,
    pub scm_urls: Vec<String>,
    /// Filled in by [`crate::correlate::attach_jobs`].
    pub jobs: Vec<Job>,
}

impl GitRepository {
    pub fn is_orphan(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// A job as listed by the CI server, before its configuration is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobSummary {
    pub name: String,
    pub url: String,
}

/// Repository payload of the public host API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicRepository {
    pub name: String,
    /// Canonical API URL, e.g. `https://api.github.com/repos/acme/widget`.
    pub url: String,
    pub ssh_url: String,
    pub clone_url: String,
}

/// Repository payload of the self-hosted server API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelfHostedRepository {
    pub name: String,
    pub project: SelfHostedProject,
    #[serde(default)]
    pub links: SelfHostedLinks,
}

impl SelfHostedRepository {
    /// The SSH clone link, if the server advertises one.
    pub fn ssh_url(&self) -> Option<&str> {
        self.links
            .clone
            .iter()
            .find(|link| link.name == "ssh")
            .map(|link| link.href.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelfHostedProject {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SelfHostedLinks {
    #[serde(default)]
    pub clone: Vec<SelfHostedLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelfHostedLink {
    pub href: String,
    pub name: String,
}

/// Client for a single Jenkins-like CI server.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CiClient: Send + Sync {
    /// Reachability/credentials check. Returns the HTTP status code.
    async fn probe(&self) -> Result<u16, ClientError>;

    /// All jobs defined on the server.
    async fn list_jobs(&self) -> Result<Vec<JobSummary>, ClientError>;

    /// The raw XML build configuration of a job.
    async fn job_config(&self, job: &JobSummary) -> Result<String, ClientError>;
}

/// Client for a GitHub-style public host.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PublicHostClient: Send + Sync {
    /// Every repository owned by `organization`. An empty vector means the
    /// organization has no repositories; failures are always `Err`.
    async fn list_repositories(
        &self,
        organization: &str,
    ) -> Result<Vec<PublicRepository>, ClientError>;
}

/// Client for a Bitbucket Server/Stash-style self-hosted host.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SelfHostedClient: Send + Sync {
    /// Every repository on the server, across all projects.
    async fn list_repositories(&self) -> Result<Vec<SelfHostedRepository>, ClientError>;
}

/// Builds clients from configuration descriptors.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Connector: Send + Sync {
    fn ci_client(&self, server: &CiServerConfig) -> Result<Box<dyn CiClient>, ClientError>;

    fn public_host_client(
        &self,
        host: &PublicHostConfig,
    ) -> Result<Box<dyn PublicHostClient>, ClientError>;

    fn self_hosted_client(
        &self,
        host: &SelfHostedConfig,
    ) -> Result<Box<dyn SelfHostedClient>, ClientError>;
}
