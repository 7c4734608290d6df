//! High-level pipeline: list jobs → list repositories → sort → correlate.
//!
//! Sources are polled strictly one after another: every CI server, then every
//! public host, then every self-hosted host. Phase boundaries are reported as
//! [`Progress`] events to a caller-supplied callback; the detail goes through
//! `tracing`.
//!
//! # Error handling
//! - A CI server that cannot be reached, rejects the probe, or cannot list its
//!   jobs aborts the audit before any repository source is contacted.
//! - A self-hosted listing failure aborts the audit.
//! - A public host listing failure is logged and recorded in
//!   [`AuditReport::failures`]; its repositories are simply missing.
//! - Per-job failures are handled inside [`jenkins::collect_jobs`].

use std::fmt;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Configuration;
use crate::contract::{Connector, GitRepository, Job};
use crate::correlate::{attach_jobs, sort_repositories};
use crate::error::AuditError;
use crate::{github, jenkins, stash};

/// Outcome of a complete audit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Sorted by project and name, each carrying the jobs that build it.
    pub repositories: Vec<GitRepository>,
    /// Public host sources whose listing failed.
    pub failures: Vec<SourceFailure>,
}

impl AuditReport {
    pub fn orphans(&self) -> impl Iterator<Item = &GitRepository> {
        self.repositories.iter().filter(|r| r.is_orphan())
    }
}

/// A repository source that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub url: String,
    pub error: String,
}

/// Start and end of each fetch phase, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    LoadingJobs { server: String },
    LoadedJobs { server: String, jobs: usize },
    LoadingPublicRepos { organization: String },
    LoadedPublicRepos { organization: String, repos: usize },
    PublicReposFailed { organization: String, error: String },
    LoadingSelfHostedRepos { url: String },
    LoadedSelfHostedRepos { prefix: String, url: String, repos: usize },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::LoadingJobs { server } => write!(f, "Loading jobs from {server}..."),
            Progress::LoadedJobs { server, jobs } => {
                write!(f, "Finished loading jobs from {server} ({jobs} jobs)")
            }
            Progress::LoadingPublicRepos { organization } => {
                write!(f, "Loading repos from {organization}...")
            }
            Progress::LoadedPublicRepos { organization, repos } => {
                write!(f, "Finished loading repos from {organization} ({repos} repos)")
            }
            Progress::PublicReposFailed { organization, error } => {
                write!(f, "Failed to load repos from {organization}: {error}")
            }
            Progress::LoadingSelfHostedRepos { url } => write!(f, "Loading repos from {url}..."),
            Progress::LoadedSelfHostedRepos { prefix, url, repos } => write!(
                f,
                "Finished loading repos with project prefixed with {prefix}, from {url} ({repos} repos)"
            ),
        }
    }
}

pub async fn audit(
    config: &Configuration,
    connector: &dyn Connector,
    on_progress: &mut (dyn FnMut(&Progress) + Send),
) -> Result<AuditReport, AuditError> {
    info!("Starting audit");
    let mut all_jobs: Vec<Job> = Vec::new();
    let mut all_repos: Vec<GitRepository> = Vec::new();
    let mut failures = Vec::new();

    for server in &config.jenkins {
        on_progress(&Progress::LoadingJobs {
            server: server.name.clone(),
        });
        let client = connector
            .ci_client(server)
            .map_err(|source| AuditError::CiConnection {
                server: server.name.clone(),
                source,
            })?;
        let jobs = jenkins::collect_jobs(server, client.as_ref()).await?;
        on_progress(&Progress::LoadedJobs {
            server: server.name.clone(),
            jobs: jobs.len(),
        });
        all_jobs.extend(jobs);
    }

    for host in &config.github {
        on_progress(&Progress::LoadingPublicRepos {
            organization: host.organization.clone(),
        });
        let listed = match connector.public_host_client(host) {
            Ok(client) => github::collect_repositories(host, client.as_ref()).await,
            Err(e) => Err(e),
        };
        match listed {
            Ok(repos) => {
                on_progress(&Progress::LoadedPublicRepos {
                    organization: host.organization.clone(),
                    repos: repos.len(),
                });
                all_repos.extend(repos);
            }
            Err(e) => {
                warn!(organization = %host.organization, error = %e, "Listing public repositories failed; continuing without them");
                on_progress(&Progress::PublicReposFailed {
                    organization: host.organization.clone(),
                    error: e.to_string(),
                });
                failures.push(SourceFailure {
                    source: host.organization.clone(),
                    url: host.api_url().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    for host in &config.stash {
        on_progress(&Progress::LoadingSelfHostedRepos {
            url: host.url.clone(),
        });
        let listed = match connector.self_hosted_client(host) {
            Ok(client) => stash::collect_repositories(host, client.as_ref()).await,
            Err(e) => Err(e),
        };
        let repos = listed.map_err(|source| {
            error!(url = %host.url, error = %source, "Listing self-hosted repositories failed");
            AuditError::SelfHostedListing {
                url: host.url.clone(),
                source,
            }
        })?;
        on_progress(&Progress::LoadedSelfHostedRepos {
            prefix: host.prefix.clone(),
            url: host.url.clone(),
            repos: repos.len(),
        });
        all_repos.extend(repos);
    }

    sort_repositories(&mut all_repos);
    attach_jobs(&mut all_repos, &all_jobs);

    let report = AuditReport {
        repositories: all_repos,
        failures,
    };
    info!(
        jobs = all_jobs.len(),
        repositories = report.repositories.len(),
        orphans = report.orphans().count(),
        failed_sources = report.failures.len(),
        "Audit complete"
    );
    Ok(report)
}
