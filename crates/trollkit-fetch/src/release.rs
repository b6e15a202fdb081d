//! Release listing lookup and version derivation.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{FetchError, FetchResult};

/// One entry of a release listing, as returned by the GitHub releases API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseRecord {
    /// Tag the release was published under.
    pub tag_name: String,
    /// Downloadable assets attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// Downloadable asset attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    /// Direct download URL of the asset.
    pub browser_download_url: String,
}

/// The release selected for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    /// Tag of the selected release.
    pub tag: String,
    /// URL of the first asset of the selected release.
    pub asset_url: String,
    /// Tag with the marker suffix removed.
    pub version: String,
}

/// Strip `suffix` from `tag`, returning the embedded version.
///
/// Returns `None` when the tag does not end with the suffix or nothing is left
/// once it is removed.
#[must_use]
pub fn derive_version<'a>(tag: &'a str, suffix: &str) -> Option<&'a str> {
    tag.strip_suffix(suffix).filter(|version| !version.is_empty())
}

/// Pick the first release, in listing order, whose tag carries `suffix`.
///
/// Matching releases without assets are skipped.
#[must_use]
pub fn select_release(releases: &[ReleaseRecord], suffix: &str) -> Option<ReleaseDescriptor> {
    releases.iter().find_map(|release| {
        let version = derive_version(&release.tag_name, suffix)?;
        let Some(asset) = release.assets.first() else {
            debug!(tag = %release.tag_name, "matching release has no assets; skipping");
            return None;
        };
        Some(ReleaseDescriptor {
            tag: release.tag_name.clone(),
            asset_url: asset.browser_download_url.clone(),
            version: version.to_string(),
        })
    })
}

/// Query `listing_url` and select the newest release tagged with `suffix`.
///
/// `Ok(None)` means the listing was fetched but nothing matched.
///
/// # Errors
///
/// Returns an error when the request fails, the server answers with a
/// non-success status, or the body is not a release listing.
pub async fn resolve_release(
    client: &Client,
    listing_url: &str,
    suffix: &str,
) -> FetchResult<Option<ReleaseDescriptor>> {
    let response = client
        .get(listing_url)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .map_err(|source| FetchError::http("releases.send", listing_url, source))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            operation: "releases.status",
            url: listing_url.to_string(),
            status: status.as_u16(),
        });
    }

    let releases = response
        .json::<Vec<ReleaseRecord>>()
        .await
        .map_err(|source| FetchError::http("releases.decode", listing_url, source))?;
    debug!(count = releases.len(), "fetched release listing");

    let selected = select_release(&releases, suffix);
    if let Some(release) = &selected {
        info!(tag = %release.tag, version = %release.version, "resolved release");
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use serde_json::json;

    fn record(tag: &str, assets: &[&str]) -> ReleaseRecord {
        ReleaseRecord {
            tag_name: tag.to_string(),
            assets: assets
                .iter()
                .map(|url| ReleaseAsset {
                    browser_download_url: (*url).to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn derive_version_strips_suffix() {
        assert_eq!(derive_version("1.21.0-server", "-server"), Some("1.21.0"));
        assert_eq!(derive_version("1.21.0-client", "-server"), None);
        assert_eq!(derive_version("-server", "-server"), None);
    }

    #[test]
    fn select_release_returns_first_match() {
        let releases = vec![
            record("1.21.2-client", &["https://example.com/client.zip"]),
            record("1.21.1-server", &["https://example.com/a.zip", "https://example.com/b.zip"]),
            record("1.21.0-server", &["https://example.com/old.zip"]),
        ];
        let selected = select_release(&releases, "-server").expect("match expected");
        assert_eq!(selected.tag, "1.21.1-server");
        assert_eq!(selected.asset_url, "https://example.com/a.zip");
        assert_eq!(selected.version, "1.21.1");
    }

    #[test]
    fn select_release_without_match_is_absent() {
        let releases = vec![record("1.21.2-client", &["https://example.com/client.zip"])];
        assert!(select_release(&releases, "-server").is_none());
        assert!(select_release(&[], "-server").is_none());
    }

    #[test]
    fn select_release_skips_matches_without_assets() {
        let releases = vec![
            record("1.21.3-server", &[]),
            record("1.21.2-server", &["https://example.com/ok.zip"]),
        ];
        let selected = select_release(&releases, "-server").expect("match expected");
        assert_eq!(selected.tag, "1.21.2-server");
    }

    #[tokio::test]
    async fn resolve_release_reads_listing() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/releases");
            then.status(200).json_body(json!([
                {"tag_name": "1.21.0-server", "assets": [
                    {"browser_download_url": "https://example.com/data.zip", "name": "data.zip"}
                ], "draft": false}
            ]));
        });

        let client = Client::new();
        let release = resolve_release(&client, &server.url("/releases"), "-server").await?;
        mock.assert();
        let release = release.expect("release expected");
        assert_eq!(release.version, "1.21.0");
        assert_eq!(release.asset_url, "https://example.com/data.zip");
        Ok(())
    }

    #[tokio::test]
    async fn resolve_release_surfaces_status() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/releases");
            then.status(403);
        });

        let err = resolve_release(&Client::new(), &server.url("/releases"), "-server")
            .await
            .expect_err("403 must fail");
        assert_eq!(err.status(), Some(403));
        Ok(())
    }
}
