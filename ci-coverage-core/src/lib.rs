#![doc = "ci-coverage-core: core logic library for ci-coverage."]

//! This crate holds the data model, the client contracts and their HTTP
//! implementations, and the audit pipeline that correlates CI jobs with the
//! git repositories they build.
//!
//! # Usage
//! Build a [`config::Configuration`], pick a [`contract::Connector`]
//! (usually [`connector::HttpConnector`]) and call [`audit::audit`]. Render the
//! result with the [`report`] module.

pub mod audit;
pub mod config;
pub mod connector;
pub mod contract;
pub mod correlate;
pub mod error;
pub mod github;
pub mod jenkins;
pub mod report;
pub mod stash;
