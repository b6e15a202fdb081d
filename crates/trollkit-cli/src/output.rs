//! Progress rendering for pipeline events.
//!
//! Step transitions and download progress go to stdout, the latter on a single
//! rewritten line; logs stay on stderr.

use std::io::{self, Write};
use std::time::Duration;

use trollkit_app::StepKind;
use trollkit_events::{Event, EventStream};

const BAR_WIDTH: u64 = 50;
const MIB: f64 = 1024.0 * 1024.0;
const KIB: f64 = 1024.0;

/// Format one progress line: a 50-column bar, MiB so far and in total, and
/// the average rate in KiB/s.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn render_progress_line(
    bytes_downloaded: u64,
    bytes_total: Option<u64>,
    elapsed: Duration,
) -> String {
    let filled = match bytes_total {
        Some(total) if total > 0 => {
            (u128::from(bytes_downloaded) * u128::from(BAR_WIDTH) / u128::from(total))
                .min(u128::from(BAR_WIDTH))
        }
        _ => 0,
    };
    let filled = usize::try_from(filled).unwrap_or(0);
    let width = usize::try_from(BAR_WIDTH).unwrap_or(0);
    let bar = format!("{}{}", "=".repeat(filled), " ".repeat(width - filled));

    let downloaded = bytes_downloaded as f64 / MIB;
    let total = bytes_total.map_or_else(|| "?".to_string(), |total| format!("{:.2}", total as f64 / MIB));
    let seconds = elapsed.as_secs_f64();
    let rate = if seconds > 0.0 {
        bytes_downloaded as f64 / KIB / seconds
    } else {
        0.0
    };
    format!("[{bar}] {downloaded:.2}/{total} MiB ({rate:.2} KiB/s)")
}

/// Operator-facing line for a step transition; unknown steps keep their identifier.
pub(crate) fn render_step_line(step: &str, failure: Option<&str>) -> String {
    let label = StepKind::from_name(step).map_or_else(
        || step.to_string(),
        |kind| kind.label().to_string(),
    );
    failure.map_or_else(
        || format!("==> {label}"),
        |message| format!("==> {label} failed: {message}"),
    )
}

/// Consume events until the run ends, drawing step transitions and download progress.
pub(crate) async fn render_events(mut stream: EventStream, show_progress: bool) {
    let mut line_open = false;
    while let Some(envelope) = stream.next().await {
        match envelope.event {
            Event::StepStarted { step } if show_progress => {
                close_line(&mut line_open);
                println!("{}", render_step_line(&step, None));
            }
            Event::StepFailed { step, message } if show_progress => {
                close_line(&mut line_open);
                println!("{}", render_step_line(&step, Some(&message)));
            }
            Event::DownloadProgress {
                bytes_downloaded,
                bytes_total,
                elapsed_ms,
                ..
            } if show_progress => {
                let line = render_progress_line(
                    bytes_downloaded,
                    bytes_total,
                    Duration::from_millis(elapsed_ms),
                );
                let mut stdout = io::stdout().lock();
                let _ = write!(stdout, "\r{line}");
                let _ = stdout.flush();
                line_open = true;
            }
            Event::DownloadCompleted { .. } => close_line(&mut line_open),
            event if event.is_terminal() => break,
            _ => {}
        }
    }
    close_line(&mut line_open);
}

fn close_line(line_open: &mut bool) {
    if *line_open {
        println!();
        *line_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trollkit_events::EventBus;
    use uuid::Uuid;

    #[test]
    fn half_complete_download_fills_half_the_bar() {
        let line = render_progress_line(2 * 1024 * 1024, Some(4 * 1024 * 1024), Duration::from_secs(2));
        assert_eq!(
            line,
            format!("[{}{}] 2.00/4.00 MiB (1024.00 KiB/s)", "=".repeat(25), " ".repeat(25))
        );
    }

    #[test]
    fn unknown_total_leaves_bar_empty() {
        let line = render_progress_line(1024, None, Duration::ZERO);
        assert_eq!(line, format!("[{}] 0.00/? MiB (0.00 KiB/s)", " ".repeat(50)));
    }

    #[test]
    fn overshoot_is_clamped() {
        let line = render_progress_line(10_000, Some(100), Duration::from_secs(1));
        assert!(line.starts_with(&format!("[{}]", "=".repeat(50))));
    }

    #[test]
    fn known_steps_render_their_label() {
        assert_eq!(render_step_line("clone_source", None), "==> Cloning the repository");
        assert_eq!(
            render_step_line("download_preloader", Some("network operation failed")),
            "==> Downloading preloader failed: network operation failed"
        );
    }

    #[test]
    fn unknown_steps_render_their_identifier() {
        assert_eq!(render_step_line("custom_step", None), "==> custom_step");
    }

    #[tokio::test]
    async fn renderer_stops_at_terminal_event() {
        let bus = EventBus::with_capacity(16);
        let stream = bus.subscribe();
        bus.publish(Event::StepStarted {
            step: "preflight".into(),
        });
        bus.publish(Event::RunFailed {
            run_id: Uuid::nil(),
            message: "boom".into(),
        });
        // The bus is still alive; only the terminal event can end the loop.
        tokio::time::timeout(Duration::from_secs(5), render_events(stream, false))
            .await
            .expect("renderer must stop on the terminal event");
    }
}
