use anyhow::{Context, Result};
use clap::Parser;
use patito_shell::config::{log_filter, ToolConfig};
use patito_shell::console::Console;
use patito_shell::host;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Editor shell for the Patito toolchain", long_about = None)]
struct Cli {
    /// .patito file to open at startup
    file: Option<PathBuf>,

    /// Speak the framed JSON host protocol on stdin/stdout
    #[arg(long)]
    host: bool,

    #[command(flatten)]
    tools: ToolConfig,

    /// Append diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_ref())?;

    let pipeline = Arc::new(cli.tools.pipeline());
    info!(staging = %pipeline.staging_dir().display(), host = cli.host, "starting");

    if cli.host {
        host::run_host_mode(pipeline).context("host protocol failed")?;
        return Ok(());
    }

    let mut console = Console::new(pipeline, io::stdout());
    if let Some(file) = cli.file {
        console.open(file)?;
    }
    eprintln!("Patito shell. Type 'help' for commands.");
    console.run(io::stdin().lock())?;
    Ok(())
}

fn init_logging(verbose: u8, log_file: Option<&PathBuf>) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(verbose, rust_log.as_deref());

    match log_file {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}
