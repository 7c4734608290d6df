//! Text and HTML rendering of an [`AuditReport`].

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info};

use crate::audit::AuditReport;
use crate::config::Configuration;
use crate::contract::GitRepository;
use crate::error::AuditError;

/// Where and under which title the HTML report is written.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub title: String,
    pub output_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "GitXJenkins report".to_string(),
            output_path: PathBuf::from("output.html"),
        }
    }
}

/// One configured source, listed at the top of the HTML report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub label: String,
    pub url: String,
}

/// CI servers first, then public hosts, then self-hosted hosts.
pub fn config_sources(config: &Configuration) -> Vec<ConfigSource> {
    let ci = config.jenkins.iter().map(|server| ConfigSource {
        label: match server.username() {
            Some(user) => format!("{} @ {}", user, server.name),
            None => server.name.clone(),
        },
        url: server.url.clone(),
    });
    let public = config.github.iter().map(|host| ConfigSource {
        label: host.organization.clone(),
        url: host.organization_url(),
    });
    let self_hosted = config.stash.iter().map(|host| ConfigSource {
        label: host.prefix.clone(),
        url: host.url.clone(),
    });
    ci.chain(public).chain(self_hosted).collect()
}

/// One line of the text report, without the trailing newline.
pub fn describe(repo: &GitRepository) -> String {
    if repo.is_orphan() {
        return format!("{}/{} is an orphan repo", repo.project, repo.name);
    }
    let jobs = repo
        .jobs
        .iter()
        .map(|job| format!("{} at {}", job.name, job.url))
        .collect::<Vec<_>>()
        .join(" and ");
    format!("{}/{} is built by {}", repo.project, repo.name, jobs)
}

pub fn render_text(repositories: &[GitRepository]) -> String {
    let mut out = String::new();
    for repo in repositories {
        out.push_str(&describe(repo));
        out.push('\n');
    }
    out
}

pub fn render_html(
    title: &str,
    generated_at: &DateTime<Utc>,
    sources: &[ConfigSource],
    report: &AuditReport,
) -> String {
    let mut source_rows = String::new();
    for source in sources {
        source_rows.push_str(&format!(
            "<tr><td>{}</td><td><a href=\"{url}\">{url}</a></td></tr>\n",
            escape_html(&source.label),
            url = escape_html(&source.url),
        ));
    }
    if source_rows.is_empty() {
        source_rows.push_str("<tr><td><strong>no rows</strong></td></tr>\n");
    }

    let mut repo_rows = String::new();
    for repo in &report.repositories {
        let jobs = repo
            .jobs
            .iter()
            .map(|job| {
                format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html(&job.url),
                    escape_html(&job.name)
                )
            })
            .collect::<Vec<_>>()
            .join(" || ");
        repo_rows.push_str(&format!(
            "<tr class=\"{}\"><td><a href=\"{}\">{}</a></td><td><a href=\"{}\">{}</a></td><td>{}</td></tr>\n",
            if repo.is_orphan() { "warning" } else { "success" },
            escape_html(&repo.project_url),
            escape_html(&repo.project),
            escape_html(&repo.url),
            escape_html(&repo.name),
            jobs,
        ));
    }
    if repo_rows.is_empty() {
        repo_rows.push_str("<tr><td><strong>no rows</strong></td></tr>\n");
    }

    let mut warnings = String::new();
    if !report.failures.is_empty() {
        warnings.push_str("<h2>Warnings</h2>\n<ul>\n");
        for failure in &report.failures {
            warnings.push_str(&format!(
                "<li>Could not list repositories of <strong>{}</strong> ({}): {}</li>\n",
                escape_html(&failure.source),
                escape_html(&failure.url),
                escape_html(&failure.error),
            ));
        }
        warnings.push_str("</ul>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<link rel="stylesheet" href="https://maxcdn.bootstrapcdn.com/bootstrap/3.3.6/css/bootstrap.min.css">
<link rel="stylesheet" href="https://cdn.datatables.net/1.10.10/css/dataTables.bootstrap.min.css">
<script src="https://code.jquery.com/jquery-1.12.0.min.js"></script>
<script src="https://cdn.datatables.net/1.10.10/js/jquery.dataTables.min.js"></script>
<script src="https://cdn.datatables.net/1.10.10/js/dataTables.bootstrap.min.js"></script>
<script>
$(document).ready(function () {{
    $('#repositoriesTable').DataTable({{"iDisplayLength": 25}});
}});
</script>
</head>
<body>
<h1>Git Repositories table</h1>
<div class="container-fluid">
<p>The current report was generated on {date} with the following information :</p>
<div class="row"><div class="col-xs-12 col-md-8">
<table class="table"><tbody>
{source_rows}</tbody></table>
</div></div>
{warnings}<p>The below table is showing what are the CI jobs existing for each Git repository.</p>
<table id="repositoriesTable" class="table table-hover">
<thead><tr><th>Project</th><th>Name</th><th>Jobs</th></tr></thead>
<tbody>
{repo_rows}</tbody>
</table>
</div>
</body>
</html>
"#,
        title = escape_html(title),
        date = generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Renders the HTML report and overwrites `report_config.output_path` with it.
pub fn write_html(
    report_config: &ReportConfig,
    config: &Configuration,
    report: &AuditReport,
    generated_at: DateTime<Utc>,
) -> Result<(), AuditError> {
    let html = render_html(
        &report_config.title,
        &generated_at,
        &config_sources(config),
        report,
    );
    let path = &report_config.output_path;
    fs::write(path, html).map_err(|source| {
        error!(path = %path.display(), error = %source, "Failed to write HTML report");
        AuditError::ReportWrite {
            path: path.clone(),
            source,
        }
    })?;
    info!(path = %path.display(), "Wrote HTML report");
    Ok(())
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
