//! Error types shared by the clients and the audit pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// A single failed call against a CI server or a source host.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} replied with status {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not build HTTP client: {0}")]
    Builder(#[source] reqwest::Error),
}

/// Fatal errors: any of these aborts the run before a report is written.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("could not connect to CI server {server}: {source}")]
    CiConnection {
        server: String,
        #[source]
        source: ClientError,
    },
    #[error("CI server replied with status {status}; check your credentials for {url}")]
    CiProbe { url: String, status: u16 },
    #[error("could not list jobs on CI server {server}: {source}")]
    CiJobListing {
        server: String,
        #[source]
        source: ClientError,
    },
    #[error("could not list repositories from {url}: {source}")]
    SelfHostedListing {
        url: String,
        #[source]
        source: ClientError,
    },
    #[error("could not write report to {}: {source}", .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
