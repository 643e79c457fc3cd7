// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Version reporting and the `--check` update probe.
//!
//! `--check` asks the GitHub REST API for the latest release tag and
//! compares it with the built-in version. The CLI maps the result to exit
//! codes: 0 up-to-date, 1 update available, 2 on any error.

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::constants::RELEASE_REPO;

/// The crate version baked in at build time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Outcome of the release check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The running build matches the latest release
    UpToDate,
    /// A newer release exists; carries its tag
    UpdateAvailable(String),
}

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

/// Compare the running version against the latest GitHub release.
///
/// `api_base` is the API root, normally `https://api.github.com`;
/// parameterized so tests can point it at a mock server.
///
/// # Errors
///
/// Returns an error on network failure, a non-success HTTP status or an
/// unparsable response body.
pub async fn check_latest(api_base: &str) -> Result<UpdateStatus> {
    let url = format!("{api_base}/repos/{RELEASE_REPO}/releases/latest");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(format!("columbus/{VERSION}"))
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .context("release query failed")?;

    let status = response.status();
    if !status.is_success() {
        bail!("release query returned {status}");
    }

    let release: LatestRelease = response
        .json()
        .await
        .context("failed to decode release response")?;

    if release.tag_name.trim_start_matches('v') == VERSION {
        Ok(UpdateStatus::UpToDate)
    } else {
        Ok(UpdateStatus::UpdateAvailable(release.tag_name))
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod version_tests;
