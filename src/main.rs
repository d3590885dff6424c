mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use cli::Commands;
use commands::{run_capture, run_extract};

#[tokio::main]
async fn main() -> ExitCode {
    run().await
}

async fn run() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let args = cli::parse();

    match args.command {
        Commands::Extract(extract) => {
            run_extract(&raw_args, args.config, args.verbose, extract).await
        }
        Commands::Capture(capture) => {
            run_capture(&raw_args, args.config, args.verbose, capture).await
        }
    }
}
