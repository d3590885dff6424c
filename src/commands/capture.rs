use std::path::PathBuf;
use std::process::ExitCode;

use sdump_lib::resource::parse_url;
use sdump_lib::{
    stderr_progress, BrowserManager, CaptureOutput, ScreenshotTarget, SdumpError, SdumpOutput,
};

use crate::cli::CaptureArgs;
use crate::formatting::{render_error, write_output};
use crate::settings::{
    format_effective_config, load_config, resolve_browser_settings, resolve_output_dir,
    BrowserFlags,
};

/// Run the capture command.
pub async fn run_capture(
    raw_args: &[String],
    config_path: Option<PathBuf>,
    verbose: bool,
    args: CaptureArgs,
) -> ExitCode {
    let format = args.format;
    let output = args.output.clone();

    let config = match load_config(config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format, output),
    };
    let settings = match resolve_browser_settings(
        raw_args,
        BrowserFlags {
            viewport: args.viewport,
            nav_timeout: None,
            network_idle_timeout: None,
            process_timeout: None,
            settle_delay_ms: args.settle_delay,
        },
        &config,
    ) {
        Ok(settings) => settings,
        Err(err) => return render_error(err, format, output),
    };
    let output_dir = resolve_output_dir(args.output_dir.clone(), &config);
    if verbose {
        eprintln!("{}", format_effective_config(&settings, config_path.as_deref()));
    }

    let url = match parse_url(&args.url) {
        Ok(url) => url,
        Err(err) => return render_error(SdumpError::Config(err.to_string()), format, output),
    };
    let target = ScreenshotTarget {
        kind: args.target.into(),
        selector: args.selector.clone(),
    };
    if verbose {
        eprintln!(
            "Capturing {} of {} into {}\u{2026}",
            target.kind,
            url,
            output_dir.display()
        );
    }

    let progress = verbose.then(stderr_progress);
    let manager = BrowserManager::new(settings.browser_options()).with_progress(progress);
    let screenshot = match manager.screenshot(&url, &target, &output_dir).await {
        Ok(shot) => shot,
        Err(err) => return render_error(err, format, output),
    };
    if verbose {
        eprintln!(
            "Saved {}x{} screenshot to {}",
            screenshot.width,
            screenshot.height,
            screenshot.path.display()
        );
    }

    let body = SdumpOutput::Capture(CaptureOutput {
        url: url.to_string(),
        screenshot,
    });
    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(SdumpError::Config(err.to_string()), format, output);
    }
    ExitCode::SUCCESS
}
