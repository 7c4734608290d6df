//! CI job lister for Jenkins-like servers.
//!
//! A server is probed first; a non-200 answer aborts the whole audit since
//! every result for that server would be meaningless. Individual jobs whose
//! `config.xml` cannot be fetched, parsed, or has no git remote are skipped.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::CiServerConfig;
use crate::connector::{get_json, get_text, send_get, Credentials};
use crate::contract::{CiClient, Job, JobSummary};
use crate::error::{AuditError, ClientError};

/// Element path of the git remote inside a job's `config.xml`, below any `scm` node.
const SCM_URL_PATH: [&str; 3] = [
    "userRemoteConfigs",
    "hudson.plugins.git.UserRemoteConfig",
    "url",
];

pub struct JenkinsClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl JenkinsClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: &str,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }
}

#[derive(Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<JobSummary>,
}

#[async_trait]
impl CiClient for JenkinsClient {
    async fn probe(&self) -> Result<u16, ClientError> {
        let url = format!("{}/api/json", self.base_url);
        let response = send_get(&self.http, &url, self.credentials.as_ref()).await?;
        Ok(response.status().as_u16())
    }

    async fn list_jobs(&self) -> Result<Vec<JobSummary>, ClientError> {
        let url = format!("{}/api/json?tree=jobs[name,url]", self.base_url);
        let list: JobList = get_json(&self.http, &url, self.credentials.as_ref()).await?;
        Ok(list.jobs)
    }

    async fn job_config(&self, job: &JobSummary) -> Result<String, ClientError> {
        let url = format!("{}/config.xml", job.url.trim_end_matches('/'));
        get_text(&self.http, &url, self.credentials.as_ref()).await
    }
}

/// Lists every job on `server` that has a git remote configured.
pub async fn collect_jobs(
    server: &CiServerConfig,
    client: &dyn CiClient,
) -> Result<Vec<Job>, AuditError> {
    let status = client.probe().await.map_err(|source| {
        error!(server = %server.name, error = %source, "CI server unreachable");
        AuditError::CiConnection {
            server: server.name.clone(),
            source,
        }
    })?;
    if status != 200 {
        error!(server = %server.name, url = %server.url, status, "CI server rejected probe");
        return Err(AuditError::CiProbe {
            url: server.url.clone(),
            status,
        });
    }
    info!(server = %server.name, "Polled CI server");

    let summaries = client.list_jobs().await.map_err(|source| {
        error!(server = %server.name, error = %source, "Failed to list jobs");
        AuditError::CiJobListing {
            server: server.name.clone(),
            source,
        }
    })?;
    info!(server = %server.name, jobs = summaries.len(), "Listed jobs");

    let mut jobs = Vec::with_capacity(summaries.len());
    for summary in &summaries {
        let config = match client.job_config(summary).await {
            Ok(config) => config,
            Err(e) => {
                warn!(server = %server.name, job = %summary.name, error = %e, "Skipping job: config not available");
                continue;
            }
        };
        match extract_scm_url(&config) {
            Ok(Some(scm_url)) => jobs.push(Job {
                ci_server: server.name.clone(),
                name: summary.name.clone(),
                url: summary.url.clone(),
                scm_url,
            }),
            Ok(None) => {
                info!(server = %server.name, job = %summary.name, "Skipping job: no git remote configured");
            }
            Err(e) => {
                warn!(server = %server.name, job = %summary.name, error = %e, "Skipping job: config is not valid XML");
            }
        }
    }
    Ok(jobs)
}

/// Returns the first git remote URL found under an `scm` element of a job
/// configuration, or `None` when the job has no such remote.
pub fn extract_scm_url(config_xml: &str) -> Result<Option<String>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(config_xml)?;

    for scm in doc.descendants().filter(|n| n.has_tag_name("scm")) {
        let mut level = vec![scm];
        for tag in SCM_URL_PATH {
            level = level
                .iter()
                .flat_map(|node| node.children())
                .filter(|child| child.has_tag_name(tag))
                .collect();
        }
        if let Some(url) = level.first() {
            return Ok(Some(url.text().unwrap_or_default().to_string()));
        }
    }
    Ok(None)
}
