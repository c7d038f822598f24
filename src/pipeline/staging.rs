use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SOURCE_EXTENSION: &str = "patito";
pub const ARTIFACT_EXTENSION: &str = "patitoc";

/// Artifact path the compiler writes for a given source file.
pub fn artifact_path(source: &Path) -> PathBuf {
    source.with_extension(ARTIFACT_EXTENSION)
}

/// Temporary source file for one build run.
///
/// The staged source and its derived artifact are removed when this value is
/// dropped. Removal errors are ignored.
#[derive(Debug)]
pub struct StagedSource {
    source: PathBuf,
    artifact: PathBuf,
}

impl StagedSource {
    /// Write `text` to a fresh, uniquely named file under `dir`.
    pub fn create(dir: &Path, text: &str) -> io::Result<Self> {
        let source = dir.join(format!("patito-{}.{}", Uuid::new_v4(), SOURCE_EXTENSION));

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&source)?;

        let staged = Self {
            artifact: artifact_path(&source),
            source,
        };
        // from here on a failed write still removes the partial file
        file.write_all(text.as_bytes())?;
        file.flush()?;

        Ok(staged)
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    pub fn file_name(&self) -> String {
        display_name(&self.source)
    }

    pub fn artifact_name(&self) -> String {
        display_name(&self.artifact)
    }
}

impl Drop for StagedSource {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.source);
        let _ = fs::remove_file(&self.artifact);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
