/// Destination for build progress text.
pub trait OutputSink {
    fn clear(&mut self);
    fn append(&mut self, text: &str);
}

/// Append-only list of status lines shown to the user.
///
/// Lines are only ever removed all at once, by [`OutputLog::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLog {
    lines: Vec<String>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Append `text`, one entry per line. An empty string adds one empty line.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            self.lines.push(String::new());
            return;
        }
        self.lines.extend(text.lines().map(str::to_owned));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl OutputSink for OutputLog {
    fn clear(&mut self) {
        OutputLog::clear(self);
    }

    fn append(&mut self, text: &str) {
        OutputLog::append(self, text);
    }
}
