use clap::{Args, Parser, Subcommand, ValueEnum};
use sdump_lib::capture::CaptureKind;
use sdump_lib::{ExtractionMode, Viewport};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sdump")]
#[command(
    version,
    about = "Style Dumper - Explain which CSS rules style an element and export them",
    long_about = "Style Dumper (sdump)\n\nModes:\n- extract: dump the styles of an element (and its subtree) from a URL or a captured page model; `--mode rules` keeps only rule-set properties and names the winning rule for each.\n- capture: save a screenshot of the viewport, one element, or the full page.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) with viewport/timeouts/extraction/capture defaults; CLI flags override config"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract element styles and their winning rules
    Extract(ExtractArgs),

    /// Capture a screenshot of a page or element
    Capture(CaptureArgs),
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[arg(long, help = "Page URL or a page model JSON written by a previous capture")]
    pub input: String,

    #[arg(long, help = "CSS selector of the root element (no fallback when it matches nothing)")]
    pub selector: Option<String>,

    #[arg(
        long,
        value_name = "SELECTOR",
        help = "Element to treat as inspected; used as root when --selector is absent"
    )]
    pub inspect: Option<String>,

    #[arg(long, help = "Ignore the inspected element and fall back to <body>")]
    pub no_use_inspected: bool,

    #[arg(long, value_enum, help = "Style set to export (default: all)")]
    pub mode: Option<ModeArg>,

    #[arg(long, help = "Only export the root element")]
    pub no_children: bool,

    #[arg(long, help = "Skip ::before/::after styles")]
    pub no_pseudo: bool,

    #[arg(long, help = "Include the root's markup with styles inlined")]
    pub html: bool,

    #[arg(
        long,
        value_name = "PATH",
        help = "Write the styled markup to this file (implies --html)"
    )]
    pub html_output: Option<PathBuf>,

    #[arg(
        long,
        default_value = "1440x900",
        help = "Viewport dimensions (WIDTHxHEIGHT or WIDTHxHEIGHT@SCALE)"
    )]
    pub viewport: Viewport,

    #[arg(
        long,
        default_value = "30",
        help = "Navigation timeout (seconds) for URL rendering"
    )]
    pub nav_timeout: u64,

    #[arg(
        long,
        default_value = "10",
        help = "Network idle timeout (seconds) for URL rendering"
    )]
    pub network_idle_timeout: u64,

    #[arg(
        long,
        default_value = "45",
        help = "Process timeout (seconds) for Playwright invocation"
    )]
    pub process_timeout: u64,

    #[arg(long, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, short, help = "Output file path (stdout if omitted)")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    #[arg(long, help = "Page URL to capture")]
    pub url: String,

    #[arg(long, value_enum, default_value = "visible", help = "What to capture")]
    pub target: TargetArg,

    #[arg(long, help = "CSS selector of the element (required for --target element)")]
    pub selector: Option<String>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory for the PNG (created if missing; default from config or .)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        default_value = "1440x900",
        help = "Viewport dimensions (WIDTHxHEIGHT or WIDTHxHEIGHT@SCALE)"
    )]
    pub viewport: Viewport,

    #[arg(
        long,
        value_name = "MS",
        help = "Wait after resizing before a full-page capture (milliseconds, max 10000)"
    )]
    pub settle_delay: Option<u64>,

    #[arg(long, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, short, help = "Output file path (stdout if omitted)")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    All,
    Rules,
}

impl From<ModeArg> for ExtractionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::All => ExtractionMode::All,
            ModeArg::Rules => ExtractionMode::Rules,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TargetArg {
    Visible,
    Element,
    FullPage,
}

impl From<TargetArg> for CaptureKind {
    fn from(target: TargetArg) -> Self {
        match target {
            TargetArg::Visible => CaptureKind::Visible,
            TargetArg::Element => CaptureKind::Element,
            TargetArg::FullPage => CaptureKind::FullPage,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
