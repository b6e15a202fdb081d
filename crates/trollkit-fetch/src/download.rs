//! Streaming artifact downloads.
//!
//! # Design
//! - Stream the body chunk by chunk to disk; never buffer the whole payload.
//!   Chunks are whatever size the transport delivers, not a fixed block size;
//!   one progress event follows each chunk.
//! - Check the status before creating the destination so a rejected request
//!   leaves nothing behind, and delete partial files when the stream breaks.
//! - Publish progress as events; rendering belongs to the caller.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use trollkit_events::{Event, EventBus};

use crate::error::{FetchError, FetchResult};

/// A single artifact to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Source URL.
    pub url: String,
    /// Destination file, overwritten if present.
    pub destination: PathBuf,
}

impl DownloadTask {
    /// Construct a task for `url` written to `destination`.
    #[must_use]
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
        }
    }
}

/// Outcome of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// File written.
    pub destination: PathBuf,
    /// Bytes received and written.
    pub bytes_downloaded: u64,
    /// Size announced by the server, trusted as-is.
    pub bytes_total: Option<u64>,
    /// Wall-clock time spent streaming the body.
    pub elapsed: Duration,
}

/// Streams remote files to disk and reports progress on an optional event bus.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    events: Option<EventBus>,
}

impl Downloader {
    /// Construct a downloader around a configured client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self {
            client,
            events: None,
        }
    }

    /// Publish download lifecycle and progress events on `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Fetch `task.url` into `task.destination`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Status`] for non-success responses (no file is
    /// created), [`FetchError::Http`] when the transfer fails, and
    /// [`FetchError::Io`] when the destination cannot be written. A partially
    /// written file is removed before the error is returned.
    pub async fn download(&self, task: &DownloadTask) -> FetchResult<DownloadReport> {
        let response = self
            .client
            .get(&task.url)
            .send()
            .await
            .map_err(|source| FetchError::http("download.send", &task.url, source))?;

        let status = response.status();
        if !status.is_success() {
            error!(
                url = %task.url,
                status = status.as_u16(),
                "download rejected by server"
            );
            return Err(FetchError::Status {
                operation: "download.status",
                url: task.url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes_total = response.content_length();
        info!(
            url = %task.url,
            destination = %task.destination.display(),
            bytes_total = ?bytes_total,
            "downloading"
        );
        self.publish(Event::DownloadStarted {
            url: task.url.clone(),
            destination: display_name(&task.destination),
            bytes_total,
        });

        let started = Instant::now();
        let mut file = File::create(&task.destination)
            .await
            .map_err(|source| FetchError::io("download.create", &task.destination, source))?;

        let streamed = self
            .stream_body(response, &mut file, task, bytes_total, started)
            .await;
        drop(file);

        let bytes_downloaded = match streamed {
            Ok(bytes) => bytes,
            Err(err) => {
                if let Err(remove_err) = fs::remove_file(&task.destination).await {
                    warn!(
                        error = %remove_err,
                        destination = %task.destination.display(),
                        "failed to remove partial download"
                    );
                }
                return Err(err);
            }
        };

        let elapsed = started.elapsed();
        if bytes_total.is_some_and(|total| total != bytes_downloaded) {
            warn!(
                destination = %task.destination.display(),
                bytes_downloaded,
                bytes_total = ?bytes_total,
                "received size differs from announced size"
            );
        }
        self.publish(Event::DownloadCompleted {
            destination: display_name(&task.destination),
            bytes_downloaded,
            elapsed_ms: millis(elapsed),
        });
        info!(
            destination = %task.destination.display(),
            bytes_downloaded,
            elapsed_ms = millis(elapsed),
            "downloaded"
        );

        Ok(DownloadReport {
            destination: task.destination.clone(),
            bytes_downloaded,
            bytes_total,
            elapsed,
        })
    }

    async fn stream_body(
        &self,
        response: reqwest::Response,
        file: &mut File,
        task: &DownloadTask,
        bytes_total: Option<u64>,
        started: Instant,
    ) -> FetchResult<u64> {
        let destination = display_name(&task.destination);
        let mut stream = response.bytes_stream();
        let mut bytes_downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|source| FetchError::http("download.read_chunk", &task.url, source))?;
            file.write_all(&chunk)
                .await
                .map_err(|source| FetchError::io("download.write", &task.destination, source))?;
            bytes_downloaded =
                bytes_downloaded.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
            self.publish(Event::DownloadProgress {
                destination: destination.clone(),
                bytes_downloaded,
                bytes_total,
                elapsed_ms: millis(started.elapsed()),
            });
        }

        file.flush()
            .await
            .map_err(|source| FetchError::io("download.flush", &task.destination, source))?;
        Ok(bytes_downloaded)
    }

    fn publish(&self, event: Event) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;

    fn downloader() -> Result<Downloader> {
        Ok(Downloader::new(crate::build_client(
            "trollkit-test",
            Duration::from_secs(5),
        )?))
    }

    #[tokio::test]
    async fn download_writes_body_and_reports_size() -> Result<()> {
        let server = MockServer::start_async().await;
        let body = vec![7_u8; 10_000];
        let mock = server.mock(|when, then| {
            when.method(GET).path("/Troll.exe");
            then.status(200).body(body.clone());
        });

        let temp = tempfile::tempdir()?;
        let destination = temp.path().join("Troll.exe");
        let report = downloader()?
            .download(&DownloadTask::new(server.url("/Troll.exe"), &destination))
            .await?;

        mock.assert();
        assert_eq!(report.bytes_downloaded, 10_000);
        assert_eq!(report.bytes_total, Some(10_000));
        assert_eq!(std::fs::read(&destination)?, body);
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_leaves_no_file() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/PreLoader.dll");
            then.status(404);
        });

        let temp = tempfile::tempdir()?;
        let destination = temp.path().join("PreLoader.dll");
        let err = downloader()?
            .download(&DownloadTask::new(server.url("/PreLoader.dll"), &destination))
            .await
            .expect_err("404 must fail");

        assert_eq!(err.status(), Some(404));
        assert!(!destination.exists());
        Ok(())
    }

    #[tokio::test]
    async fn progress_events_are_published_per_chunk() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/data.zip");
            then.status(200).body(vec![1_u8; 4_096]);
        });

        let events = EventBus::with_capacity(256);
        let mut stream = events.subscribe();
        let temp = tempfile::tempdir()?;
        let task = DownloadTask::new(server.url("/data.zip"), temp.path().join("data.zip"));
        downloader()?.with_events(events.clone()).download(&task).await?;
        drop(events);

        let mut kinds = Vec::new();
        let mut last_progress = None;
        while let Some(envelope) = stream.next().await {
            if let Event::DownloadProgress {
                bytes_downloaded, ..
            } = &envelope.event
            {
                last_progress = Some(*bytes_downloaded);
            }
            kinds.push(envelope.event.kind());
        }

        assert_eq!(kinds.first(), Some(&"download_started"));
        assert_eq!(kinds.last(), Some(&"download_completed"));
        assert!(kinds.contains(&"download_progress"));
        assert_eq!(last_progress, Some(4_096));
        Ok(())
    }
}
