use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A user edit applied to the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace the whole text.
    ReplaceAll(String),
    /// Add text as new line(s) at the end.
    Append(String),
    /// Insert a line before the 0-based `line` (`line == len` appends).
    InsertLine { line: usize, text: String },
    /// Remove the 0-based line.
    DeleteLine(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("line {} is out of range (buffer has {len} lines)", .line + 1)]
    LineOutOfRange { line: usize, len: usize },

    #[error("buffer has no associated file; use save-as")]
    NoAssociatedPath,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Editable source text and the file it belongs to, if any.
#[derive(Debug, Clone, Default)]
pub struct SourceBuffer {
    text: String,
    path: Option<PathBuf>,
    modified: bool,
}

impl SourceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Forget the current file and start over with an empty buffer.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Replace the buffer with the contents of `path`.
    ///
    /// The buffer is left untouched if the file cannot be read as UTF-8.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), BufferError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| BufferError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = text.len(), "loaded file");

        self.text = text;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Write the buffer to its associated file.
    pub fn save(&mut self) -> Result<PathBuf, BufferError> {
        let path = self.path.clone().ok_or(BufferError::NoAssociatedPath)?;
        self.write_to(&path)?;
        Ok(path)
    }

    /// Write the buffer to `path` and make it the associated file.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<PathBuf, BufferError> {
        let path = path.into();
        self.write_to(&path)?;
        self.path = Some(path.clone());
        Ok(path)
    }

    fn write_to(&mut self, path: &Path) -> Result<(), BufferError> {
        fs::write(path, self.text.as_bytes()).map_err(|source| BufferError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = self.text.len(), "saved file");
        self.modified = false;
        Ok(())
    }

    pub fn apply(&mut self, edit: Edit) -> Result<(), BufferError> {
        let next = match edit {
            Edit::ReplaceAll(text) => text,
            Edit::Append(text) => {
                let mut next = self.text.clone();
                if !next.is_empty() && !next.ends_with('\n') {
                    next.push('\n');
                }
                next.push_str(&text);
                next.push('\n');
                next
            }
            Edit::InsertLine { line, text } => {
                let mut lines = self.lines();
                if line > lines.len() {
                    return Err(BufferError::LineOutOfRange {
                        line,
                        len: lines.len(),
                    });
                }
                lines.insert(line, text);
                join_lines(&lines)
            }
            Edit::DeleteLine(line) => {
                let mut lines = self.lines();
                if line >= lines.len() {
                    return Err(BufferError::LineOutOfRange {
                        line,
                        len: lines.len(),
                    });
                }
                lines.remove(line);
                join_lines(&lines)
            }
        };

        self.text = next;
        self.modified = true;
        Ok(())
    }

    fn lines(&self) -> Vec<String> {
        self.text.lines().map(str::to_owned).collect()
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    if !lines.is_empty() {
        text.push('\n');
    }
    text
}
