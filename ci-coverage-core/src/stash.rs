//! Repository lister for Bitbucket Server/Stash-style self-hosted hosts.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::SelfHostedConfig;
use crate::connector::{get_json, Credentials};
use crate::contract::{GitRepository, SelfHostedClient, SelfHostedRepository};
use crate::error::ClientError;

const PAGE_SIZE: u32 = 100;

pub struct StashClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

impl StashClient {
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
#[serde(rename_all = "camelCase")]
struct Page {
    #[serde(default)]
    values: Vec<SelfHostedRepository>,
    #[serde(default = "last_page")]
    is_last_page: bool,
    next_page_start: Option<u32>,
}

fn last_page() -> bool {
    true
}

#[async_trait]
impl SelfHostedClient for StashClient {
    async fn list_repositories(&self) -> Result<Vec<SelfHostedRepository>, ClientError> {
        let mut repositories = Vec::new();
        let mut start = 0;
        loop {
            let url = format!(
                "{}/rest/api/1.0/repos?start={}&limit={}",
                self.base_url, start, PAGE_SIZE
            );
            let page: Page = get_json(&self.http, &url, self.credentials.as_ref()).await?;
            debug!(start, count = page.values.len(), "Fetched repository page");
            repositories.extend(page.values);
            match page.next_page_start {
                Some(next) if !page.is_last_page => start = next,
                _ => break,
            }
        }
        Ok(repositories)
    }
}

/// Lists the repositories of every project whose key starts with the
/// configured prefix. The match is a plain, case-sensitive string prefix.
pub async fn collect_repositories(
    host: &SelfHostedConfig,
    client: &dyn SelfHostedClient,
) -> Result<Vec<GitRepository>, ClientError> {
    let listed = client.list_repositories().await?;
    let total = listed.len();

    let repositories: Vec<GitRepository> = listed
        .into_iter()
        .filter(|repo| repo.project.key.starts_with(&host.prefix))
        .map(|repo| {
            let scm_urls = match repo.ssh_url() {
                Some(ssh) => vec![ssh.to_string()],
                None => {
                    warn!(project = %repo.project.key, repo = %repo.name, "Repository has no SSH clone link");
                    Vec::new()
                }
            };
            GitRepository {
                project_url: format!("{}/projects/{}", host.url, repo.project.key),
                url: format!(
                    "{}/projects/{}/repos/{}/browse",
                    host.url, repo.project.key, repo.name
                ),
                project: repo.project.key,
                name: repo.name,
                scm_urls,
                jobs: Vec::new(),
            }
        })
        .collect();

    info!(
        url = %host.url,
        prefix = %host.prefix,
        listed = total,
        kept = repositories.len(),
        "Listed self-hosted repositories"
    );
    Ok(repositories)
}
