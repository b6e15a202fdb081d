//! Resolve a release from a listing and download the asset it points at.

use std::time::Duration;

use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use trollkit_fetch::{DownloadTask, Downloader, build_client, resolve_release};

#[tokio::test]
async fn resolved_asset_can_be_downloaded() -> Result<()> {
    let server = MockServer::start_async().await;
    let asset_url = server.url("/assets/bedrock-runtime-data-windows-x64.zip");
    let listing = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/LiteLDev/bedrock-runtime-data/releases")
            .header("user-agent", "trollkit-it");
        then.status(200).json_body(json!([
            {"tag_name": "1.21.51.02-client", "assets": []},
            {"tag_name": "1.21.50.10-server", "assets": [{"browser_download_url": asset_url}]}
        ]));
    });
    let asset = server.mock(|when, then| {
        when.method(GET)
            .path("/assets/bedrock-runtime-data-windows-x64.zip")
            .header("user-agent", "trollkit-it");
        then.status(200).body(b"PK\x05\x06archive-bytes");
    });

    let client = build_client("trollkit-it", Duration::from_secs(5))?;
    let release = resolve_release(
        &client,
        &server.url("/repos/LiteLDev/bedrock-runtime-data/releases"),
        "-server",
    )
    .await?
    .expect("a server release is listed");
    assert_eq!(release.version, "1.21.50.10");

    let temp = tempfile::tempdir()?;
    let destination = temp.path().join("bedrock-runtime-data-windows-x64.zip");
    let report = Downloader::new(client)
        .download(&DownloadTask::new(release.asset_url, &destination))
        .await?;

    listing.assert();
    asset.assert();
    assert_eq!(report.bytes_downloaded, 17);
    assert!(destination.is_file());
    Ok(())
}
