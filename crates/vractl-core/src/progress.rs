//! Request polling for asynchronous catalog requests
//!
//! Catalog provisioning requests are processed by the platform in the
//! background. After submitting one, [`wait_for_request`] refreshes the
//! request until it completes, printing a status line whenever the status
//! changes and a `.` while it stays the same. The whole loop runs under a
//! single deadline.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::error::{CoreError, Result};
use crate::params::Violation;

/// Default time to wait for a request to complete
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(600);

/// Default pause between two refreshes
pub const DEFAULT_REFRESH_RATE: Duration = Duration::from_secs(2);

/// A remote request whose state can be re-fetched
#[async_trait]
pub trait RequestHandle: Send {
    /// Re-fetch the request state from the platform
    async fn refresh(&mut self) -> Result<()>;

    /// Whether the last fetched state is terminal
    fn is_completed(&self) -> bool;

    /// Status from the last fetch, if the platform reported one
    fn status(&self) -> Option<&str>;
}

/// Timing for one poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub wait_time: Duration,
    pub refresh_rate: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            wait_time: DEFAULT_WAIT_TIME,
            refresh_rate: DEFAULT_REFRESH_RATE,
        }
    }
}

impl PollSettings {
    pub fn from_secs(wait_time: u64, refresh_rate: u64) -> Self {
        Self {
            wait_time: Duration::from_secs(wait_time),
            refresh_rate: Duration::from_secs(refresh_rate),
        }
    }

    /// Both durations must be non-zero
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        if self.wait_time.is_zero() {
            violations.push(Violation::NotPositive {
                name: "wait_time".to_string(),
            });
        }
        if self.refresh_rate.is_zero() {
            violations.push(Violation::NotPositive {
                name: "refresh_rate".to_string(),
            });
        }
        violations
    }
}

/// What a status observation means for the progress display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Same status as the last one reported
    Unchanged,
    /// A status that has not been reported yet
    Changed(String),
}

/// Remembers the last reported status so repeated statuses collapse into dots
#[derive(Debug, Default)]
pub struct StatusTracker {
    // None until the first status has been reported, so even an empty
    // status produces a full line on the first iteration
    last_status: Option<String>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status most recently reported to the user
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    /// Record a status observation
    ///
    /// An absent status is treated as the empty string.
    pub fn observe(&mut self, status: Option<&str>) -> ProgressUpdate {
        let status = status.unwrap_or_default();
        if self.last_status.as_deref() == Some(status) {
            ProgressUpdate::Unchanged
        } else {
            self.last_status = Some(status.to_string());
            ProgressUpdate::Changed(status.to_string())
        }
    }

    /// Record a status observation and write the matching progress output
    pub fn report<W: Write + ?Sized>(&mut self, status: Option<&str>, out: &mut W) -> Result<()> {
        match self.observe(status) {
            ProgressUpdate::Unchanged => write!(out, ".")?,
            ProgressUpdate::Changed(status) => {
                debug!("Request status changed to '{}'", status);
                write!(out, "\n{}", status_line(&status))?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Full progress line for a status
///
/// An empty status is shown as `unknown`; the tracker still compares the raw value.
pub fn status_line(status: &str) -> String {
    let shown = if status.is_empty() { "unknown" } else { status };
    format!("Current request status: {}.", shown)
}

/// Block until `handle` completes or `settings.wait_time` elapses
///
/// Each iteration refreshes the handle, returns once it reports completion,
/// and otherwise reports the current status and sleeps for
/// `settings.refresh_rate`. Refresh errors abort the loop unchanged. The
/// deadline covers the whole loop, including a refresh or sleep that is in
/// flight when it expires.
pub async fn wait_for_request<H, W>(
    handle: &mut H,
    settings: &PollSettings,
    out: &mut W,
) -> Result<()>
where
    H: RequestHandle + ?Sized,
    W: Write + ?Sized,
{
    write!(out, "Waiting for request to complete.")?;
    out.flush()?;

    let poll = poll_until_complete(handle, settings, out);
    match tokio::time::timeout(settings.wait_time, poll).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Request did not complete within {}s",
                settings.wait_time.as_secs()
            );
            Err(CoreError::RequestTimeout(settings.wait_time))
        }
    }
}

async fn poll_until_complete<H, W>(
    handle: &mut H,
    settings: &PollSettings,
    out: &mut W,
) -> Result<()>
where
    H: RequestHandle + ?Sized,
    W: Write + ?Sized,
{
    let mut tracker = StatusTracker::new();
    let mut refreshes: u32 = 0;

    loop {
        handle.refresh().await?;
        refreshes += 1;
        trace!(
            "Refresh {}: status={:?} completed={}",
            refreshes,
            handle.status(),
            handle.is_completed()
        );

        if handle.is_completed() {
            debug!("Request completed after {} refreshes", refreshes);
            writeln!(out)?;
            out.flush()?;
            return Ok(());
        }

        tracker.report(handle.status(), out)?;
        tokio::time::sleep(settings.refresh_rate).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    /// Handle that replays a fixed list of statuses, repeating the last one
    struct ScriptedHandle {
        script: Vec<Option<&'static str>>,
        terminal: &'static [&'static str],
        fail_on: Option<usize>,
        refreshes: usize,
        current: Option<&'static str>,
    }

    impl ScriptedHandle {
        fn new(script: Vec<Option<&'static str>>, terminal: &'static [&'static str]) -> Self {
            Self {
                script,
                terminal,
                fail_on: None,
                refreshes: 0,
                current: None,
            }
        }
    }

    #[async_trait]
    impl RequestHandle for ScriptedHandle {
        async fn refresh(&mut self) -> Result<()> {
            self.refreshes += 1;
            if self.fail_on == Some(self.refreshes) {
                return Err(CoreError::Api {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                });
            }
            let idx = (self.refreshes - 1).min(self.script.len() - 1);
            self.current = self.script[idx];
            Ok(())
        }

        fn is_completed(&self) -> bool {
            self.current.is_some_and(|s| self.terminal.contains(&s))
        }

        fn status(&self) -> Option<&str> {
            self.current
        }
    }

    const BANNER: &str = "Waiting for request to complete.";

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_tracker_first_observation_always_changes() {
        let mut tracker = StatusTracker::new();
        assert_eq!(tracker.last_status(), None);
        assert_eq!(
            tracker.observe(Some("")),
            ProgressUpdate::Changed(String::new())
        );
        assert_eq!(tracker.last_status(), Some(""));
        assert_eq!(tracker.observe(None), ProgressUpdate::Unchanged);
    }

    #[test]
    fn test_tracker_updates_only_on_change() {
        let mut tracker = StatusTracker::new();
        let mut out = Vec::new();
        tracker.report(Some("queued"), &mut out).unwrap();
        tracker.report(Some("queued"), &mut out).unwrap();
        tracker.report(Some("building"), &mut out).unwrap();
        assert_eq!(tracker.last_status(), Some("building"));
        assert_eq!(
            output(out),
            "\nCurrent request status: queued..\nCurrent request status: building."
        );
    }

    #[test]
    fn test_status_line_for_empty_status() {
        assert_eq!(status_line(""), "Current request status: unknown.");
        assert_eq!(
            status_line("IN_PROGRESS"),
            "Current request status: IN_PROGRESS."
        );
    }

    #[test]
    fn test_poll_settings_defaults_and_validation() {
        let settings = PollSettings::default();
        assert_eq!(settings.wait_time, Duration::from_secs(600));
        assert_eq!(settings.refresh_rate, Duration::from_secs(2));
        assert!(settings.validate().is_empty());
        assert_eq!(PollSettings::from_secs(0, 0).validate().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_progress() {
        let mut handle = ScriptedHandle::new(
            vec![Some("in progress"), Some("in progress"), Some("successful")],
            &["successful"],
        );
        let mut out = Vec::new();
        let start = Instant::now();

        wait_for_request(&mut handle, &PollSettings::from_secs(600, 2), &mut out)
            .await
            .unwrap();

        assert_eq!(handle.refreshes, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
        assert_eq!(
            output(out),
            format!("{BANNER}\nCurrent request status: in progress..\n")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_count_matches_statuses_seen() {
        let mut script = vec![Some("in progress"); 7];
        script.push(Some("completed"));
        let mut handle = ScriptedHandle::new(script, &["completed"]);
        let mut out = Vec::new();

        wait_for_request(&mut handle, &PollSettings::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(handle.refreshes, 8);
        assert!(output(out).ends_with(".\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_completed_on_first_refresh() {
        let mut handle = ScriptedHandle::new(vec![Some("completed")], &["completed"]);
        let mut out = Vec::new();
        let start = Instant::now();

        wait_for_request(&mut handle, &PollSettings::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(handle.refreshes, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        let text = output(out);
        assert_eq!(text, format!("{BANNER}\n"));
        assert!(!text.contains("Current request status"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_line_per_distinct_status() {
        let mut handle = ScriptedHandle::new(
            vec![Some("queued"), Some("building"), Some("completed")],
            &["completed"],
        );
        let mut out = Vec::new();

        wait_for_request(&mut handle, &PollSettings::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(
            output(out),
            format!(
                "{BANNER}\nCurrent request status: queued.\nCurrent request status: building.\n"
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_status_times_out_with_dots() {
        let mut handle = ScriptedHandle::new(vec![Some("in progress")], &["completed"]);
        let mut out = Vec::new();

        // refreshes at t=0,2,4,6,8; deadline at t=9
        let err = wait_for_request(&mut handle, &PollSettings::from_secs(9, 2), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::RequestTimeout(d) if d == Duration::from_secs(9)));
        assert_eq!(handle.refreshes, 5);
        let text = output(out);
        assert_eq!(text.matches("Current request status").count(), 1);
        assert_eq!(
            text,
            format!("{BANNER}\nCurrent request status: in progress.....")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_covers_sleep() {
        let mut handle = ScriptedHandle::new(vec![Some("in progress")], &["completed"]);
        let mut out = Vec::new();
        let start = Instant::now();

        let err = wait_for_request(&mut handle, &PollSettings::from_secs(1, 2), &mut out)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(handle.refreshes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_error_propagates() {
        let mut handle = ScriptedHandle::new(vec![Some("in progress")], &["completed"]);
        handle.fail_on = Some(2);
        let mut out = Vec::new();

        let err = wait_for_request(&mut handle, &PollSettings::default(), &mut out)
            .await
            .unwrap_err();

        assert!(err.is_server_error());
        assert!(!err.is_timeout());
        assert_eq!(handle.refreshes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_initial_status_is_reported() {
        let mut handle = ScriptedHandle::new(
            vec![None, Some(""), Some("queued"), Some("completed")],
            &["completed"],
        );
        let mut out = Vec::new();

        wait_for_request(&mut handle, &PollSettings::default(), &mut out)
            .await
            .unwrap();

        assert_eq!(
            output(out),
            format!(
                "{BANNER}\nCurrent request status: unknown..\nCurrent request status: queued.\n"
            )
        );
    }

    /// Handle whose refresh never returns within the test deadline
    struct StalledHandle {
        refreshes: usize,
    }

    #[async_trait]
    impl RequestHandle for StalledHandle {
        async fn refresh(&mut self) -> Result<()> {
            self.refreshes += 1;
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }

        fn is_completed(&self) -> bool {
            false
        }

        fn status(&self) -> Option<&str> {
            None
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_abandons_refresh_in_flight() {
        let mut handle = StalledHandle { refreshes: 0 };
        let mut out = Vec::new();
        let start = Instant::now();

        let err = wait_for_request(&mut handle, &PollSettings::from_secs(1, 2), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::RequestTimeout(d) if d == Duration::from_secs(1)));
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(handle.refreshes, 1);
        assert_eq!(output(out), BANNER);
    }
}
