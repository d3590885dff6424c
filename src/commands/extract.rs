use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sdump_lib::host::StyleHost;
use sdump_lib::{
    extract, parse_resource, stderr_progress, BrowserManager, ExtractError, ExtractionRequest,
    ExtractionResponse, HtmlExport, PageModel, ParsedResource, SdumpError, SdumpOutput,
};

use crate::cli::ExtractArgs;
use crate::formatting::{exit_code_for_extraction, render_error, write_output};
use crate::settings::{
    format_effective_config, load_config, resolve_browser_settings, resolve_extract_switches,
    BrowserFlags,
};

/// Run the extract command.
pub async fn run_extract(
    raw_args: &[String],
    config_path: Option<PathBuf>,
    verbose: bool,
    args: ExtractArgs,
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
            nav_timeout: Some(args.nav_timeout),
            network_idle_timeout: Some(args.network_idle_timeout),
            process_timeout: Some(args.process_timeout),
            settle_delay_ms: None,
        },
        &config,
    ) {
        Ok(settings) => settings,
        Err(err) => return render_error(err, format, output),
    };
    let switches = resolve_extract_switches(
        args.mode.map(Into::into),
        args.no_children,
        args.no_pseudo,
        args.no_use_inspected,
        &config,
    );
    if verbose {
        eprintln!("{}", format_effective_config(&settings, config_path.as_deref()));
    }

    let resource = match parse_resource(&args.input) {
        Ok(res) => res,
        Err(err) => return render_error(SdumpError::Config(err.to_string()), format, output),
    };
    if verbose {
        eprintln!("Loading page ({:?})\u{2026}", resource.kind());
    }

    let page = match &resource {
        ParsedResource::Url(url) => {
            let progress = verbose.then(stderr_progress);
            let manager = BrowserManager::new(settings.browser_options()).with_progress(progress);
            manager.capture_page(url, args.inspect.as_deref()).await
        }
        ParsedResource::PageModel(path) => load_page_model(path),
    };
    let page = match page {
        Ok(page) => page,
        Err(err) => return render_error(err, format, output),
    };

    // Page models carry their own inspected element; --inspect replaces it.
    let inspected = match (&resource, args.inspect.as_deref()) {
        (ParsedResource::PageModel(_), Some(selector)) => match page.query_selector(selector) {
            Ok(found) => found,
            Err(err) => {
                return render_error(ExtractError::from(err).into(), format, output);
            }
        },
        _ => page.inspected_element(),
    };

    let request = ExtractionRequest {
        selector: args.selector.clone(),
        use_inspected: switches.use_inspected,
        mode: switches.mode,
        children: switches.children,
        pseudo: switches.pseudo,
        html: args.html || args.html_output.is_some(),
    };
    if verbose {
        eprintln!(
            "Extracting (mode {}, children {}, pseudo {})\u{2026}",
            request.mode, request.children, request.pseudo
        );
    }

    let response = match extract(&page, &request, inspected) {
        Ok(mut result) => {
            if let Some(path) = args.html_output.as_deref() {
                let html = result.html.take().unwrap_or_default();
                match write_html(path, &html) {
                    Ok(export) => {
                        if verbose {
                            eprintln!(
                                "Wrote {} bytes of markup to {}",
                                export.bytes,
                                export.path.display()
                            );
                        }
                    }
                    Err(err) => return render_error(SdumpError::Io(err), format, output),
                }
                if args.html {
                    result.html = Some(html);
                }
            }
            if verbose {
                eprintln!(
                    "Extracted {} nodes in {} ms",
                    result.stats.node_count, result.stats.duration_ms
                );
            }
            ExtractionResponse::from(result)
        }
        Err(ExtractError::NoRootElement) => ExtractionResponse::Failure {
            error: ExtractError::NoRootElement.to_string(),
        },
        Err(err) => return render_error(err.into(), format, output),
    };

    let code = exit_code_for_extraction(&response);
    let body = SdumpOutput::Extract(response);
    if let Err(err) = write_output(&body, format, output.clone()) {
        return render_error(SdumpError::Config(err.to_string()), format, output);
    }
    code
}

fn load_page_model(path: &Path) -> sdump_lib::Result<PageModel> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        SdumpError::Config(format!("Failed to read page model {}: {}", path.display(), e))
    })?;
    Ok(PageModel::from_json(&json)?)
}

fn write_html(path: &Path, html: &str) -> std::io::Result<HtmlExport> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(HtmlExport {
        path: path.to_path_buf(),
        bytes: html.len(),
    })
}
