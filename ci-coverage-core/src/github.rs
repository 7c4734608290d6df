//! Repository lister for GitHub-style public hosts.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::PublicHostConfig;
use crate::connector::{get_json, Credentials};
use crate::contract::{GitRepository, PublicHostClient, PublicRepository};
use crate::error::ClientError;

const PAGE_SIZE: usize = 100;

pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    credentials: Option<Credentials>,
}

impl GithubClient {
    pub(crate) fn new(
        http: reqwest::Client,
        api_url: &str,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }
}

#[async_trait]
impl PublicHostClient for GithubClient {
    async fn list_repositories(
        &self,
        organization: &str,
    ) -> Result<Vec<PublicRepository>, ClientError> {
        let mut repositories = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}/users/{}/repos?per_page={}&page={}",
                self.api_url, organization, PAGE_SIZE, page
            );
            let batch: Vec<PublicRepository> =
                get_json(&self.http, &url, self.credentials.as_ref()).await?;
            let full = batch.len() == PAGE_SIZE;
            debug!(organization, page, count = batch.len(), "Fetched repository page");
            repositories.extend(batch);
            if !full {
                break;
            }
            page += 1;
        }
        Ok(repositories)
    }
}

/// Lists the repositories of one organization. Listing failures are returned
/// to the caller untouched; it decides whether they abort the run.
pub async fn collect_repositories(
    host: &PublicHostConfig,
    client: &dyn PublicHostClient,
) -> Result<Vec<GitRepository>, ClientError> {
    let listed = client.list_repositories(&host.organization).await?;
    info!(organization = %host.organization, repositories = listed.len(), "Listed public repositories");

    let project_url = host.organization_url();
    Ok(listed
        .into_iter()
        .map(|repo| GitRepository {
            project: host.organization.clone(),
            project_url: project_url.clone(),
            url: browse_url(host, &repo.url),
            scm_urls: vec![repo.ssh_url, repo.clone_url],
            name: repo.name,
            jobs: Vec::new(),
        })
        .collect())
}

/// Derives the web page of a repository from its API URL. On a host with a
/// configured API root, `<api root>/repos/` is swapped for the host's web
/// root; otherwise the `api.` host prefix and the `repos/` segment are dropped.
pub fn browse_url(host: &PublicHostConfig, repo_api_url: &str) -> String {
    if host.url.as_deref().is_some_and(|u| !u.is_empty()) {
        let repos_root = format!("{}/repos/", host.api_url().trim_end_matches('/'));
        if let Some(path) = repo_api_url.strip_prefix(&repos_root) {
            return format!("{}/{}", host.web_url(), path);
        }
    }
    repo_api_url.replace("api.", "").replace("repos/", "")
}
