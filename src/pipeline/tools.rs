use super::error::{BuildError, Tool};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Finds the compiler and virtual machine executables.
pub trait ToolLocator: Send + Sync {
    fn locate(&self, tool: Tool) -> Result<PathBuf, BuildError>;
}

/// Explicit tool paths with a list of directories to fall back on.
#[derive(Debug, Clone, Default)]
pub struct ToolPaths {
    compiler: Option<PathBuf>,
    vm: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl ToolPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compiler(mut self, path: impl Into<PathBuf>) -> Self {
        self.compiler = Some(path.into());
        self
    }

    pub fn with_vm(mut self, path: impl Into<PathBuf>) -> Self {
        self.vm = Some(path.into());
        self
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    fn explicit(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Compiler => self.compiler.as_deref(),
            Tool::VirtualMachine => self.vm.as_deref(),
        }
    }
}

impl ToolLocator for ToolPaths {
    fn locate(&self, tool: Tool) -> Result<PathBuf, BuildError> {
        if let Some(path) = self.explicit(tool) {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return Err(BuildError::ToolNotFound {
                tool,
                detail: format!("{} does not exist", path.display()),
            });
        }

        let name = tool.file_name();
        for dir in &self.search_dirs {
            let candidate = dir.join(&name);
            debug!(%tool, candidate = %candidate.display(), "probing");
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        let detail = if self.search_dirs.is_empty() {
            format!("no path configured for {}", name)
        } else {
            let dirs: Vec<String> = self
                .search_dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect();
            format!("looked for {} in {}", name, dirs.join(", "))
        };
        Err(BuildError::ToolNotFound { tool, detail })
    }
}

/// Directories next to the running executable where bundled tools live.
pub fn bundled_dirs() -> Vec<PathBuf> {
    let Ok(exe) = std::env::current_exe() else {
        return Vec::new();
    };
    match exe.parent() {
        Some(dir) => vec![dir.to_path_buf(), dir.join("tools")],
        None => Vec::new(),
    }
}
