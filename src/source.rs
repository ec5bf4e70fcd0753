//! Fetching the ICS feed from disk or over HTTP.

use anyhow::{Context, Result};
use tracing::debug;

/// Read the feed at `location`: an http(s) or webcal URL, or a local path (`~` is expanded).
pub async fn load_feed(location: &str) -> Result<String> {
    if let Some(rest) = location.strip_prefix("webcal://") {
        return fetch(&format!("https://{rest}")).await;
    }
    if location.starts_with("http://") || location.starts_with("https://") {
        return fetch(location).await;
    }

    let path = shellexpand::tilde(location).into_owned();
    debug!(path = %path, "reading feed from disk");
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read ICS file {path}"))
}

async fn fetch(url: &str) -> Result<String> {
    debug!(url, "downloading feed");

    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to download ICS feed from {url}"))?
        .error_for_status()
        .with_context(|| format!("ICS feed request to {url} failed"))?;

    response
        .text()
        .await
        .with_context(|| format!("Failed to read ICS feed body from {url}"))
}
