//! Joins jobs to repositories by source-control URL.
//!
//! Matching is exact, case-sensitive string equality. `git@host:org/foo.git`
//! and `https://host/org/foo.git` are different URLs here, so a job configured
//! with another URL form than the ones recorded for its repository leaves that
//! repository an orphan.

use crate::contract::{GitRepository, Job};

/// Sorts by the concatenation of project key and repository name.
pub fn sort_repositories(repositories: &mut [GitRepository]) {
    repositories.sort_by_cached_key(|repo| format!("{}{}", repo.project, repo.name));
}

/// Appends to each repository every job whose `scm_url` equals one of its
/// `scm_urls`, in the order of `jobs`.
pub fn attach_jobs(repositories: &mut [GitRepository], jobs: &[Job]) {
    for repo in repositories.iter_mut() {
        for job in jobs {
            for scm_url in &repo.scm_urls {
                if job.scm_url == *scm_url {
                    repo.jobs.push(job.clone());
                }
            }
        }
    }
}
