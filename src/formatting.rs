use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sdump_lib::cascade::{ElementSnapshot, ExtractionResponse, ExtractionResult, WinnerMeta};
use sdump_lib::{ErrorOutput, SdumpError, SdumpOutput};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(
    body: &SdumpOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: SdumpError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let payload = SdumpOutput::Error(ErrorOutput::from(err.to_payload()));

    match format {
        OutputFormat::Json => {
            let content = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"unknown\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Exit code 2 is for fatal errors; a missing root element uses 1.
    ExitCode::from(2)
}

/// Write JSON output to file or stdout.
fn write_json_output(
    body: &SdumpOutput,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Write pretty output to file or stdout.
fn write_pretty_output(body: &SdumpOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        println!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content = serde_json::to_string_pretty(body)
        .unwrap_or_else(|_| "{\"error\":\"unknown\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &SdumpOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        SdumpOutput::Extract(ExtractionResponse::Success(result)) => {
            format_extraction(&mut buf, result, colorize);
        }
        SdumpOutput::Extract(ExtractionResponse::Failure { error }) => {
            writeln!(buf, "{} {}", color("[NOT FOUND]", "33", colorize), error).ok();
        }
        SdumpOutput::Capture(out) => {
            let shot = &out.screenshot;
            writeln!(
                buf,
                "{} {} capture of {}",
                color("[SAVED]", "32", colorize),
                shot.kind,
                out.url
            )
            .ok();
            writeln!(buf, "File: {}", shot.path.display()).ok();
            writeln!(buf, "Size: {}x{}", shot.width, shot.height).ok();
            if let Some(bounds) = &shot.bounds {
                writeln!(
                    buf,
                    "Element bounds: {}x{} at ({}, {})",
                    bounds.width, bounds.height, bounds.x, bounds.y
                )
                .ok();
            }
        }
        SdumpOutput::Error(err) => {
            let category = format!("{:?}", err.category).to_ascii_lowercase();
            writeln!(
                buf,
                "{} {} ({})",
                color("[ERROR]", "31", colorize),
                err.error,
                category
            )
            .ok();
            if let Some(hint) = &err.remediation {
                writeln!(buf, "Hint: {hint}").ok();
            }
        }
    }
    buf.trim_end().to_string()
}

fn format_extraction(buf: &mut String, result: &ExtractionResult, colorize: bool) {
    let target = match result.target.selector.as_deref() {
        Some(selector) => format!("{:?} `{}`", result.target.source, selector),
        None => format!("{:?}", result.target.source),
    };
    writeln!(
        buf,
        "{} {} nodes in {} ms (mode {}, root via {})",
        color("[EXTRACT]", "32", colorize),
        result.stats.node_count,
        result.stats.duration_ms,
        result.mode,
        target.to_ascii_lowercase()
    )
    .ok();

    for node in &result.nodes {
        format_node(buf, node, colorize);
    }

    if let Some(html) = &result.html {
        writeln!(buf, "HTML: {} bytes", html.len()).ok();
    }
}

fn format_node(buf: &mut String, node: &ElementSnapshot, colorize: bool) {
    let mut header = color(&node.path, "36", colorize);
    if !node.text_preview.is_empty() {
        write!(header, " \"{}\"", node.text_preview).ok();
    }
    writeln!(buf, "{header}").ok();

    for (property, value) in &node.styles {
        let origin = node
            .sources
            .as_ref()
            .and_then(|sources| sources.get(property))
            .map(describe_winner)
            .unwrap_or_default();
        writeln!(buf, "  {property}: {value}{origin}").ok();
    }

    for (pseudo, styles) in &node.pseudo {
        writeln!(buf, "  {}", pseudo.as_str()).ok();
        for (property, value) in styles {
            writeln!(buf, "    {property}: {value}").ok();
        }
    }
}

fn describe_winner(meta: &WinnerMeta) -> String {
    let mut parts = Vec::new();
    match meta.selector.as_deref() {
        Some(selector) => parts.push(selector.to_string()),
        None => parts.push("inline".to_string()),
    }
    if let Some(specificity) = meta.specificity {
        parts.push(format!("specificity {specificity}"));
    }
    if meta.is_important {
        parts.push("!important".to_string());
    }
    format!("  <- {}", parts.join(", "))
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Determine exit code for an extraction response.
pub fn exit_code_for_extraction(response: &ExtractionResponse) -> ExitCode {
    if response.is_failure() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
