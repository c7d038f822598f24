use crate::pipeline::{bundled_dirs, BuildPipeline, ToolPaths};
use crate::process::SystemRunner;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Where to find the toolchain and where to stage sources.
#[derive(Args, Debug, Clone, Default)]
pub struct ToolConfig {
    /// Path to the Patito compiler executable
    #[arg(long, value_name = "PATH", env = "PATITO_COMPILER")]
    pub compiler: Option<PathBuf>,

    /// Path to the Patito virtual machine executable
    #[arg(long, value_name = "PATH", env = "PATITO_VM")]
    pub vm: Option<PathBuf>,

    /// Extra directory to search for patito-compiler / patito-vm
    #[arg(
        long = "tools-dir",
        value_name = "DIR",
        env = "PATITO_TOOLS_DIR",
        action = clap::ArgAction::Append
    )]
    pub tools_dirs: Vec<PathBuf>,

    /// Directory for temporary build files (defaults to the system temp dir)
    #[arg(long, value_name = "DIR", env = "PATITO_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,
}

impl ToolConfig {
    /// Configured directories first, then the ones bundled with the shell.
    pub fn tool_paths(&self) -> ToolPaths {
        let mut paths = ToolPaths::new();
        if let Some(compiler) = &self.compiler {
            paths = paths.with_compiler(compiler);
        }
        if let Some(vm) = &self.vm {
            paths = paths.with_vm(vm);
        }
        for dir in self.tools_dirs.iter().cloned().chain(bundled_dirs()) {
            paths = paths.with_search_dir(dir);
        }
        paths
    }

    pub fn pipeline(&self) -> BuildPipeline {
        let runner = Arc::new(SystemRunner::new());
        let pipeline = BuildPipeline::new(runner, Arc::new(self.tool_paths()));
        match &self.staging_dir {
            Some(dir) => pipeline.with_staging_dir(dir),
            None => pipeline,
        }
    }
}

/// A valid `RUST_LOG` directive wins; otherwise `-v` counts pick the level.
pub fn log_filter(verbose: u8, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    EnvFilter::new(match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    })
}
