use std::path::{Path, PathBuf};
use std::time::Duration;

use sdump_lib::config::MAX_SETTLE_DELAY;
use sdump_lib::{BrowserOptions, Config, ExtractionMode, SdumpError, Viewport};

/// Checks if a flag was present in the command-line arguments.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}

/// Load config from a TOML file, central config, or return defaults.
/// Priority: explicit path > ~/.config/sdump/config.toml > defaults
pub fn load_config(path: Option<&Path>) -> Result<Config, SdumpError> {
    let cfg = Config::load(path).map_err(|e| {
        let loc = path
            .map(|p| p.display().to_string())
            .or_else(|| Config::central_config_path().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "defaults".to_string());
        SdumpError::Config(format!("Failed to read config {}: {}", loc, e))
    })?;

    cfg.validate().map_err(|e| {
        let prefix = path
            .map(|p| format!("Invalid config ({}): {}", p.display(), e))
            .unwrap_or_else(|| format!("Invalid config: {}", e));
        SdumpError::Config(prefix)
    })?;
    Ok(cfg)
}

/// Browser settings after merging CLI args and config file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBrowserSettings {
    pub viewport: Viewport,
    pub nav_timeout: Duration,
    pub network_idle_timeout: Duration,
    pub process_timeout: Duration,
    pub scroll_settle: Duration,
    pub settle_delay: Duration,
}

impl ResolvedBrowserSettings {
    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            viewport: self.viewport,
            navigation_timeout: self.nav_timeout,
            network_idle_timeout: self.network_idle_timeout,
            process_timeout: self.process_timeout,
            scroll_settle: self.scroll_settle,
            settle_delay: self.settle_delay,
            ..BrowserOptions::default()
        }
    }
}

/// CLI values that may override the config file.
#[derive(Debug, Clone, Copy)]
pub struct BrowserFlags {
    pub viewport: Viewport,
    pub nav_timeout: Option<u64>,
    pub network_idle_timeout: Option<u64>,
    pub process_timeout: Option<u64>,
    pub settle_delay_ms: Option<u64>,
}

/// Merge browser flags with config, preferring CLI when flags are present.
pub fn resolve_browser_settings(
    raw_args: &[String],
    flags: BrowserFlags,
    config: &Config,
) -> Result<ResolvedBrowserSettings, SdumpError> {
    let pick = |flag: &str, cli: Option<u64>, cfg: Duration| match cli {
        Some(secs) if flag_present(raw_args, flag) => Duration::from_secs(secs),
        _ => cfg,
    };

    let settle_delay = flags
        .settle_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(config.capture.settle_delay);
    if settle_delay > MAX_SETTLE_DELAY {
        return Err(SdumpError::Config(format!(
            "--settle-delay of {}ms exceeds the {}ms settle limit",
            settle_delay.as_millis(),
            MAX_SETTLE_DELAY.as_millis()
        )));
    }

    let resolved = ResolvedBrowserSettings {
        viewport: if flag_present(raw_args, "--viewport") {
            flags.viewport
        } else {
            config.viewport.into()
        },
        nav_timeout: pick("--nav-timeout", flags.nav_timeout, config.timeouts.navigation),
        network_idle_timeout: pick(
            "--network-idle-timeout",
            flags.network_idle_timeout,
            config.timeouts.network_idle,
        ),
        process_timeout: pick(
            "--process-timeout",
            flags.process_timeout,
            config.timeouts.process,
        ),
        scroll_settle: config.capture.scroll_settle,
        settle_delay,
    };

    for (flag, value) in [
        ("--nav-timeout", resolved.nav_timeout),
        ("--network-idle-timeout", resolved.network_idle_timeout),
        ("--process-timeout", resolved.process_timeout),
    ] {
        if value.is_zero() {
            return Err(SdumpError::Config(format!("{flag} must be greater than zero")));
        }
    }
    Ok(resolved)
}

/// Extraction switches after merging CLI args and config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedExtractSwitches {
    pub mode: ExtractionMode,
    pub children: bool,
    pub pseudo: bool,
    pub use_inspected: bool,
}

pub fn resolve_extract_switches(
    mode: Option<ExtractionMode>,
    no_children: bool,
    no_pseudo: bool,
    no_use_inspected: bool,
    config: &Config,
) -> ResolvedExtractSwitches {
    ResolvedExtractSwitches {
        mode: mode.unwrap_or(config.extraction.mode),
        children: config.extraction.children && !no_children,
        pseudo: config.extraction.pseudo && !no_pseudo,
        use_inspected: config.extraction.use_inspected && !no_use_inspected,
    }
}

pub fn resolve_output_dir(cli: Option<PathBuf>, config: &Config) -> PathBuf {
    cli.unwrap_or_else(|| config.capture.output_dir.clone())
}

/// Format effective config as a single-line string.
pub fn format_effective_config(
    settings: &ResolvedBrowserSettings,
    config_source: Option<&Path>,
) -> String {
    let source = config_source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    format!(
        "Effective config [{source}]: viewport={}, timeouts: nav={}s, network-idle={}s, process={}s, capture: scroll-settle={}ms, settle={}ms",
        settings.viewport,
        settings.nav_timeout.as_secs(),
        settings.network_idle_timeout.as_secs(),
        settings.process_timeout.as_secs(),
        settings.scroll_settle.as_millis(),
        settings.settle_delay.as_millis(),
    )
}
