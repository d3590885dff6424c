//! Browser manager for coordinating headless browser sessions.
//!
//! Every browser interaction is one short-lived Node process running an
//! inline Playwright script. The manager bounds how many run at once and
//! applies the navigation and process timeouts.

use crate::capture::{CaptureError, CaptureKind};
use crate::page::PageModel;
use crate::progress::{log_progress, ProgressCallback};
use crate::{Result, SdumpError, Viewport};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use url::Url;

use super::playwright::{
    ensure_node_available, ensure_playwright_available, map_playwright_error,
    map_playwright_status_error, map_spawn_error, mock_path, ScriptError, ScriptResult,
    CAPTURE_SCRIPT, MOCK_CAPTURE_ENV, MOCK_PAGE_ENV, PAGE_MODEL_SCRIPT,
};
use super::screenshot::{save_capture, RawCapture, SavedScreenshot, ScreenshotTarget};

/// Default timeout for page navigation.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for waiting for network idle state.
pub const DEFAULT_NETWORK_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for the entire Playwright process.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(45);

/// Default wait after resizing for a full-page capture.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Default wait after scrolling to the top for a full-page capture.
pub const DEFAULT_SCROLL_SETTLE: Duration = Duration::from_millis(100);

/// Configuration options for browser sessions.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// The Node.js command to use (default: "node").
    pub node_command: String,
    pub viewport: Viewport,
    pub headless: bool,
    pub navigation_timeout: Duration,
    pub network_idle_timeout: Duration,
    /// Timeout for the entire Playwright process.
    pub process_timeout: Duration,
    pub scroll_settle: Duration,
    pub settle_delay: Duration,
    /// Maximum number of concurrent browser sessions.
    pub max_concurrent_sessions: usize,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            node_command: "node".to_string(),
            viewport: Viewport::default(),
            headless: true,
            navigation_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            network_idle_timeout: DEFAULT_NETWORK_IDLE_TIMEOUT,
            process_timeout: DEFAULT_PROCESS_TIMEOUT,
            scroll_settle: DEFAULT_SCROLL_SETTLE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_concurrent_sessions: 1,
        }
    }
}

/// Manages concurrent browser sessions with semaphore-based limiting.
#[derive(Clone)]
pub struct BrowserManager {
    options: BrowserOptions,
    semaphore: Arc<Semaphore>,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for BrowserManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserManager")
            .field("options", &self.options)
            .field("available_sessions", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}

impl BrowserManager {
    pub fn new(options: BrowserOptions) -> Self {
        let permits = options.max_concurrent_sessions.max(1);
        Self {
            options,
            semaphore: Arc::new(Semaphore::new(permits)),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    /// Load `url` and serialize it into a [`PageModel`].
    ///
    /// `inspect` selects the element recorded as the inspected one.
    pub async fn capture_page(&self, url: &Url, inspect: Option<&str>) -> Result<PageModel> {
        if let Some(path) = mock_path(MOCK_PAGE_ENV) {
            log_progress(&self.progress, &format!("Using mock page model {}", path));
            let raw = std::fs::read_to_string(&path)?;
            return Ok(PageModel::from_json(&raw)?);
        }

        log_progress(
            &self.progress,
            &format!(
                "Launching headless browser for {} ({}, nav {}s, idle {}s)…",
                url,
                self.options.viewport,
                self.options.navigation_timeout.as_secs(),
                self.options.network_idle_timeout.as_secs()
            ),
        );

        let mut args = self.common_args(url);
        args.push(inspect.unwrap_or_default().to_string());
        let stdout = self.run_script(PAGE_MODEL_SCRIPT, args).await?;

        #[derive(serde::Deserialize)]
        struct PageOutput {
            page: Option<PageModel>,
        }
        let output: PageOutput = serde_json::from_str(&stdout).map_err(|e| {
            SdumpError::Config(format!(
                "Failed to parse Playwright output: {} - raw: {}",
                e,
                truncate(&stdout, 200)
            ))
        })?;
        let page = output.page.ok_or_else(|| {
            SdumpError::Config("Playwright returned ok status but no page model".to_string())
        })?;
        log_progress(
            &self.progress,
            &format!("Serialized {} elements", page.elements.len()),
        );
        page.normalized().map_err(|e| {
            SdumpError::Config(format!("Playwright returned an invalid page model: {}", e))
        })
    }

    /// Capture `target` on `url` and save it as a PNG in `output_dir`.
    pub async fn screenshot(
        &self,
        url: &Url,
        target: &ScreenshotTarget,
        output_dir: &Path,
    ) -> Result<SavedScreenshot> {
        let selector = match target.kind {
            CaptureKind::Element => Some(
                target
                    .selector
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(CaptureError::NoElementSelected)?,
            ),
            _ => None,
        };

        let (raw, scratch) = match mock_path(MOCK_CAPTURE_ENV) {
            Some(path) => {
                log_progress(&self.progress, &format!("Using mock capture {}", path));
                let raw: RawCapture = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
                (raw, None)
            }
            None => {
                let scratch = scratch_path();
                let mut args = self.common_args(url);
                args.extend([
                    target.kind.to_string(),
                    selector.unwrap_or_default().to_string(),
                    scratch.to_string_lossy().into_owned(),
                    self.options.scroll_settle.as_millis().to_string(),
                    self.options.settle_delay.as_millis().to_string(),
                ]);
                log_progress(
                    &self.progress,
                    &format!("Capturing {} screenshot of {}…", target.kind, url),
                );
                let stdout = self.run_script(CAPTURE_SCRIPT, args).await;
                let raw = stdout.and_then(|out| {
                    serde_json::from_str::<RawCapture>(&out).map_err(|e| {
                        SdumpError::Config(format!(
                            "Failed to parse Playwright output: {} - raw: {}",
                            e,
                            truncate(&out, 200)
                        ))
                    })
                });
                match raw {
                    Ok(raw) => (raw, Some(scratch)),
                    Err(err) => {
                        let _ = std::fs::remove_file(&scratch);
                        return Err(err);
                    }
                }
            }
        };

        let saved = save_capture(&raw, output_dir, chrono::Local::now().naive_local());
        if let Some(scratch) = scratch {
            let _ = std::fs::remove_file(scratch);
        }
        let saved = saved?;
        log_progress(
            &self.progress,
            &format!(
                "Saved {}x{} screenshot to {}",
                saved.width,
                saved.height,
                saved.path.display()
            ),
        );
        Ok(saved)
    }

    fn common_args(&self, url: &Url) -> Vec<String> {
        let opts = &self.options;
        vec![
            url.to_string(),
            opts.viewport.width.to_string(),
            opts.viewport.height.to_string(),
            opts.viewport.device_scale_factor.to_string(),
            opts.navigation_timeout.as_millis().to_string(),
            opts.network_idle_timeout.as_millis().to_string(),
            if opts.headless { "1" } else { "0" }.to_string(),
        ]
    }

    /// Run `script` under `node -e` and return its stdout once it reported
    /// `status: ok`.
    async fn run_script(&self, script: &str, args: Vec<String>) -> Result<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SdumpError::Config("Browser manager unavailable".to_string()))?;

        // Fail fast if Node is missing to avoid spawning Playwright unnecessarily.
        ensure_node_available(&self.options.node_command).await?;
        ensure_playwright_available(&self.options.node_command).await?;

        let mut cmd = Command::new(&self.options.node_command);
        cmd.arg("-e")
            .arg(script)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|err| map_spawn_error(err, &self.options.node_command))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut out) = stdout_pipe {
                let _ = out.read_to_end(&mut buf).await;
            }
            buf
        });

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut err) = stderr_pipe {
                let _ = err.read_to_end(&mut buf).await;
            }
            buf
        });

        let status = match timeout(self.options.process_timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(err)) => return Err(SdumpError::Io(err)),
            Err(_) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                log_progress(
                    &self.progress,
                    "Playwright timed out; process killed after exceeding timeout.",
                );
                return Err(SdumpError::Config(format!(
                    "Playwright timed out after {:?}",
                    self.options.process_timeout
                )));
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(map_playwright_error(status.to_string(), &stderr));
        }

        let stdout = String::from_utf8_lossy(&stdout).trim().to_string();
        match serde_json::from_str::<ScriptResult>(&stdout) {
            Ok(payload) if payload.status == "ok" => {}
            Ok(payload) => {
                if let Ok(err) = serde_json::from_str::<ScriptError>(&stdout) {
                    return Err(map_playwright_status_error(&err.status, err.message));
                }
                let detail = payload
                    .message
                    .as_deref()
                    .unwrap_or("no additional details");
                return Err(SdumpError::Config(format!(
                    "Playwright returned non-ok status {}: {}",
                    payload.status, detail
                )));
            }
            Err(_) => {
                return Err(SdumpError::Config(format!(
                    "Unexpected Playwright output: {}",
                    truncate(&stdout, 200)
                )));
            }
        }

        log_progress(
            &self.progress,
            &format!("Browser finished in {:.1}s", start.elapsed().as_secs_f32()),
        );
        Ok(stdout)
    }
}

fn scratch_path() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("sdump-{}-{nanos}.png", std::process::id()))
}

fn truncate(text: &str, max: usize) -> String {
    let mut out: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_options_default_values() {
        let opts = BrowserOptions::default();
        assert_eq!(opts.node_command, "node");
        assert!(opts.headless);
        assert_eq!(opts.max_concurrent_sessions, 1);
        assert_eq!(opts.viewport, Viewport::new(1440, 900));
        assert_eq!(opts.navigation_timeout, DEFAULT_NAVIGATION_TIMEOUT);
        assert_eq!(opts.network_idle_timeout, DEFAULT_NETWORK_IDLE_TIMEOUT);
        assert_eq!(opts.process_timeout, DEFAULT_PROCESS_TIMEOUT);
        assert_eq!(opts.settle_delay, Duration::from_millis(300));
        assert_eq!(opts.scroll_settle, Duration::from_millis(100));
    }

    #[test]
    fn semaphore_never_zero() {
        let manager = BrowserManager::new(BrowserOptions {
            max_concurrent_sessions: 0,
            ..BrowserOptions::default()
        });

        assert_eq!(manager.semaphore.available_permits(), 1);
    }

    #[test]
    fn common_args_follow_script_argv_order() {
        let manager = BrowserManager::new(BrowserOptions {
            viewport: "390x844@3".parse().unwrap(),
            headless: false,
            ..BrowserOptions::default()
        });
        let url = Url::parse("https://example.com/a").unwrap();
        assert_eq!(
            manager.common_args(&url),
            vec!["https://example.com/a", "390", "844", "3", "30000", "10000", "0"]
        );
    }

    #[test]
    fn truncate_marks_cut_output() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[tokio::test]
    async fn element_capture_without_selector_fails_before_launch() {
        let manager = BrowserManager::new(BrowserOptions {
            node_command: "definitely-not-a-binary".to_string(),
            ..BrowserOptions::default()
        });
        let url = Url::parse("https://example.com").unwrap();
        let target = ScreenshotTarget {
            kind: CaptureKind::Element,
            selector: None,
        };
        let err = manager
            .screenshot(&url, &target, Path::new("unused"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SdumpError::Capture(CaptureError::NoElementSelected)
        ));
    }

    #[tokio::test]
    async fn missing_node_is_reported() {
        let manager = BrowserManager::new(BrowserOptions {
            node_command: "definitely-not-a-binary".to_string(),
            ..BrowserOptions::default()
        });
        let result = manager.run_script("process.exit(0)", Vec::new()).await;
        assert!(result.is_err());
    }
}
