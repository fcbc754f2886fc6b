//! flowdraw CLI: render every workspace of a flow to html, json, or images.
//!
//! Usage:
//!   flowdraw <INPUT> [OUTPUT_DIR] [OPTIONS]
//!
//! INPUT is a `.json` flow file or a directory that is scanned recursively.

use std::path::PathBuf;

use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(
    name = "flowdraw",
    about = "Render flow workspaces to html, json, or image files",
    version,
    author
)]
struct Cli {
    /// Flow file, or directory to scan for flow files
    input: PathBuf,

    /// Directory for the exported artifacts
    output_dir: Option<PathBuf>,

    /// Output format: html|json|img
    #[arg(short, long)]
    format: Option<String>,

    /// Directory with additional node type descriptors
    #[arg(short, long)]
    nodes: Option<PathBuf>,

    /// Write the html or json document to standard output
    #[arg(short, long)]
    stdout: bool,

    /// Render workspaces in declaration order instead of reverse
    #[arg(long)]
    declaration_order: bool,

    /// Minimum wait between import and the first render (milliseconds)
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Upper bound for rendering a single workspace (seconds)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = flowdraw_common::config::AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    flowdraw_common::logging::init_logging(&logging);

    let args = commands::draw::DrawArgs {
        input: cli.input,
        output_dir: cli.output_dir,
        format: cli.format,
        nodes: cli.nodes,
        stdout: cli.stdout,
        declaration_order: cli.declaration_order,
        settle_ms: cli.settle_ms,
        timeout_secs: cli.timeout_secs,
    };
    commands::draw::run(args, &config).await
}
