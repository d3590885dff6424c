use std::sync::Arc;

pub type ProgressCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub(crate) fn log_progress(progress: &Option<ProgressCallback>, message: &str) {
    if let Some(cb) = progress {
        cb(message);
    }
}

/// Callback that writes `[sdump] <message>` lines to stderr.
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|msg: &str| eprintln!("[sdump] {msg}"))
}
