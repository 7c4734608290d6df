use ci_coverage_core::audit::{audit, Progress};
use ci_coverage_core::config::{CiServerConfig, Configuration, PublicHostConfig, SelfHostedConfig};
use ci_coverage_core::contract::{
    CiClient, JobSummary, MockCiClient, MockConnector, MockPublicHostClient, MockSelfHostedClient,
    PublicHostClient, PublicRepository, SelfHostedClient, SelfHostedLink, SelfHostedLinks,
    SelfHostedProject, SelfHostedRepository,
};
use ci_coverage_core::error::{AuditError, ClientError};
use ci_coverage_core::report::render_text;

fn job_config(scm_url: &str) -> String {
    format!(
        "<project><scm class=\"hudson.plugins.git.GitSCM\"><userRemoteConfigs>\
         <hudson.plugins.git.UserRemoteConfig><url>{scm_url}</url></hudson.plugins.git.UserRemoteConfig>\
         </userRemoteConfigs></scm></project>"
    )
}

fn ignore_progress(_: &Progress) {}

fn ci_server() -> CiServerConfig {
    CiServerConfig {
        name: "main-ci".into(),
        url: "https://ci.example.com".into(),
        username: Some("bot".into()),
        password: Some("secret".into()),
    }
}

fn stash_repo(project: &str, name: &str) -> SelfHostedRepository {
    SelfHostedRepository {
        name: name.into(),
        project: SelfHostedProject { key: project.into() },
        links: SelfHostedLinks {
            clone: vec![
                SelfHostedLink {
                    href: format!("https://stash.example.com/scm/{}/{}.git", project.to_lowercase(), name),
                    name: "http".into(),
                },
                SelfHostedLink {
                    href: format!("ssh://git@stash.example.com:7999/{}/{}.git", project.to_lowercase(), name),
                    name: "ssh".into(),
                },
            ],
        },
    }
}

/// A CI client serving one job per `(name, scm_url)` pair.
fn ci_client_with_jobs(jobs: &'static [(&'static str, &'static str)]) -> MockCiClient {
    let mut ci = MockCiClient::new();
    ci.expect_probe().times(1).returning(|| Ok(200));
    ci.expect_list_jobs().times(1).returning(move || {
        Ok(jobs
            .iter()
            .map(|(name, _)| JobSummary {
                name: name.to_string(),
                url: format!("https://ci.example.com/job/{name}/"),
            })
            .collect())
    });
    ci.expect_job_config().returning(move |job| {
        let (_, scm_url) = jobs
            .iter()
            .find(|(name, _)| *name == job.name)
            .expect("job was listed");
        Ok(job_config(scm_url))
    });
    ci
}

#[tokio::test]
async fn test_audit_attaches_jobs_and_reports_orphans() {
    let config = Configuration {
        jenkins: vec![ci_server()],
        stash: vec![SelfHostedConfig {
            prefix: "ORG".into(),
            url: "https://stash.example.com".into(),
            ..Default::default()
        }],
        ..Default::default()
    };

    let ci = ci_client_with_jobs(&[("build-foo", "ssh://git@stash.example.com:7999/org/foo.git")]);
    let mut stash = MockSelfHostedClient::new();
    stash
        .expect_list_repositories()
        .times(1)
        .returning(|| Ok(vec![stash_repo("ORG", "foo"), stash_repo("ORG", "bar")]));

    let mut connector = MockConnector::new();
    connector
        .expect_ci_client()
        .times(1)
        .return_once(move |_| Ok(Box::new(ci) as Box<dyn CiClient>));
    connector
        .expect_self_hosted_client()
        .times(1)
        .return_once(move |_| Ok(Box::new(stash) as Box<dyn SelfHostedClient>));

    let report = audit(&config, &connector, &mut ignore_progress).await.expect("audit should succeed");

    assert_eq!(
        render_text(&report.repositories),
        "ORG/bar is an orphan repo\n\
         ORG/foo is built by build-foo at https://ci.example.com/job/build-foo/\n"
    );
    assert_eq!(report.orphans().count(), 1);
    assert_eq!(
        report.repositories[1].url,
        "https://stash.example.com/projects/ORG/repos/foo/browse"
    );
}

#[tokio::test]
async fn test_probe_failure_aborts_before_any_repository_listing() {
    let config = Configuration {
        jenkins: vec![ci_server()],
        github: vec![PublicHostConfig {
            organization: "acme".into(),
            ..Default::default()
        }],
        stash: vec![SelfHostedConfig {
            prefix: "TEAM".into(),
            url: "https://stash.example.com".into(),
            ..Default::default()
        }],
    };

    let mut ci = MockCiClient::new();
    ci.expect_probe().times(1).returning(|| Ok(401));
    ci.expect_list_jobs().never();
    ci.expect_job_config().never();

    let mut connector = MockConnector::new();
    connector
        .expect_ci_client()
        .times(1)
        .return_once(move |_| Ok(Box::new(ci) as Box<dyn CiClient>));
    connector.expect_public_host_client().never();
    connector.expect_self_hosted_client().never();

    let err = audit(&config, &connector, &mut ignore_progress).await.unwrap_err();
    match err {
        AuditError::CiProbe { status, url } => {
            assert_eq!(status, 401);
            assert_eq!(url, "https://ci.example.com");
        }
        other => panic!("expected a probe failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_ci_server_is_fatal() {
    let config = Configuration {
        jenkins: vec![ci_server()],
        ..Default::default()
    };
    let mut ci = MockCiClient::new();
    ci.expect_probe().times(1).returning(|| {
        Err(ClientError::Status {
            url: "https://ci.example.com/api/json".into(),
            status: 502,
        })
    });
    let mut connector = MockConnector::new();
    connector
        .expect_ci_client()
        .return_once(move |_| Ok(Box::new(ci) as Box<dyn CiClient>));

    let err = audit(&config, &connector, &mut ignore_progress).await.unwrap_err();
    assert!(matches!(err, AuditError::CiConnection { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_public_host_failure_is_recorded_and_run_continues() {
    let config = Configuration {
        github: vec![
            PublicHostConfig {
                organization: "broken".into(),
                ..Default::default()
            },
            PublicHostConfig {
                organization: "acme".into(),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let mut broken = MockPublicHostClient::new();
    broken.expect_list_repositories().times(1).returning(|_| {
        Err(ClientError::Status {
            url: "https://api.github.com/users/broken/repos?per_page=100&page=1".into(),
            status: 404,
        })
    });
    let mut acme = MockPublicHostClient::new();
    acme.expect_list_repositories()
        .withf(|org| org.to_string() == "acme")
        .times(1)
        .returning(|_| {
            Ok(vec![PublicRepository {
                name: "widget".into(),
                url: "https://api.github.com/repos/acme/widget".into(),
                ssh_url: "git@github.com:acme/widget.git".into(),
                clone_url: "https://github.com/acme/widget.git".into(),
            }])
        });

    let mut clients = vec![acme, broken];
    let mut connector = MockConnector::new();
    connector
        .expect_public_host_client()
        .times(2)
        .returning(move |_| {
            let client = clients.pop().expect("one client per host");
            Ok(Box::new(client) as Box<dyn PublicHostClient>)
        });

    let report = audit(&config, &connector, &mut ignore_progress).await.expect("public host failures are not fatal");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "broken");
    assert_eq!(report.repositories.len(), 1);
    assert_eq!(report.repositories[0].url, "https://github.com/acme/widget");
    assert!(report.repositories[0].is_orphan());
}

#[tokio::test]
async fn test_self_hosted_failure_is_fatal() {
    let config = Configuration {
        stash: vec![SelfHostedConfig {
            prefix: "TEAM".into(),
            url: "https://stash.example.com".into(),
            ..Default::default()
        }],
        ..Default::default()
    };
    let mut stash = MockSelfHostedClient::new();
    stash.expect_list_repositories().returning(|| {
        Err(ClientError::Status {
            url: "https://stash.example.com/rest/api/1.0/repos?start=0&limit=100".into(),
            status: 401,
        })
    });
    let mut connector = MockConnector::new();
    connector
        .expect_self_hosted_client()
        .return_once(move |_| Ok(Box::new(stash) as Box<dyn SelfHostedClient>));

    let err = audit(&config, &connector, &mut ignore_progress).await.unwrap_err();
    assert!(matches!(err, AuditError::SelfHostedListing { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_audit_is_deterministic_across_runs() {
    async fn run_once() -> String {
        let config = Configuration {
            jenkins: vec![ci_server()],
            stash: vec![SelfHostedConfig {
                prefix: "".into(),
                url: "https://stash.example.com".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let ci = ci_client_with_jobs(&[
            ("build-b", "ssh://git@stash.example.com:7999/b/x.git"),
            ("build-a-1", "ssh://git@stash.example.com:7999/a/y.git"),
            ("build-a-2", "ssh://git@stash.example.com:7999/a/y.git"),
        ]);
        let mut stash = MockSelfHostedClient::new();
        stash.expect_list_repositories().returning(|| {
            Ok(vec![stash_repo("B", "x"), stash_repo("A", "y"), stash_repo("A", "x")])
        });
        let mut connector = MockConnector::new();
        connector
            .expect_ci_client()
            .return_once(move |_| Ok(Box::new(ci) as Box<dyn CiClient>));
        connector
            .expect_self_hosted_client()
            .return_once(move |_| Ok(Box::new(stash) as Box<dyn SelfHostedClient>));
        let report = audit(&config, &connector, &mut ignore_progress).await.expect("audit should succeed");
        render_text(&report.repositories)
    }

    let first = run_once().await;
    let second = run_once().await;
    assert_eq!(first, second);
    assert_eq!(
        first,
        "A/x is an orphan repo\n\
         A/y is built by build-a-1 at https://ci.example.com/job/build-a-1/ and build-a-2 at https://ci.example.com/job/build-a-2/\n\
         B/x is built by build-b at https://ci.example.com/job/build-b/\n"
    );
}

#[tokio::test]
async fn test_audit_reports_progress_for_each_phase_in_order() {
    let config = Configuration {
        jenkins: vec![ci_server()],
        github: vec![PublicHostConfig {
            organization: "broken".into(),
            ..Default::default()
        }],
        stash: vec![SelfHostedConfig {
            prefix: "TEAM".into(),
            url: "https://stash.example.com".into(),
            ..Default::default()
        }],
    };

    let ci = ci_client_with_jobs(&[("build-foo", "ssh://git@stash.example.com:7999/team/foo.git")]);
    let mut github = MockPublicHostClient::new();
    github.expect_list_repositories().returning(|_| {
        Err(ClientError::Status {
            url: "https://api.github.com/users/broken/repos?per_page=100&page=1".into(),
            status: 404,
        })
    });
    let mut stash = MockSelfHostedClient::new();
    stash
        .expect_list_repositories()
        .returning(|| Ok(vec![stash_repo("TEAM", "foo"), stash_repo("OTHER", "bar")]));

    let mut connector = MockConnector::new();
    connector
        .expect_ci_client()
        .return_once(move |_| Ok(Box::new(ci) as Box<dyn CiClient>));
    connector
        .expect_public_host_client()
        .return_once(move |_| Ok(Box::new(github) as Box<dyn PublicHostClient>));
    connector
        .expect_self_hosted_client()
        .return_once(move |_| Ok(Box::new(stash) as Box<dyn SelfHostedClient>));

    let mut events: Vec<Progress> = Vec::new();
    let mut record = |event: &Progress| events.push(event.clone());
    audit(&config, &connector, &mut record).await.expect("audit should succeed");

    let lines: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "Loading jobs from main-ci...".to_string(),
            "Finished loading jobs from main-ci (1 jobs)".to_string(),
            "Loading repos from broken...".to_string(),
            "Failed to load repos from broken: https://api.github.com/users/broken/repos?per_page=100&page=1 replied with status 404".to_string(),
            "Loading repos from https://stash.example.com...".to_string(),
            "Finished loading repos with project prefixed with TEAM, from https://stash.example.com (1 repos)".to_string(),
        ]
    );
}
