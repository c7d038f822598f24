//! Interactive line console: the toolbar of the editor as typed commands.

use crate::buffer::Edit;
use crate::pipeline::BuildPipeline;
use crate::shell::{Reaction, Session, ShellEvent};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, warn};

const HELP: &str = "\
Commands:
  new                    start an empty buffer
  open <path>            load a .patito file
  save [path]            write the buffer (to path, if given)
  show                   print the buffer with line numbers
  append <text>          add a line at the end
  insert <line> <text>   insert a line before <line> (1-based)
  delete <line>          remove a line (1-based)
  compile                compile the buffer
  run                    compile and run the buffer
  log                    print the output of the last build
  help                   show this text
  quit                   leave";

pub struct Console<W: Write> {
    session: Session,
    out: W,
    tx: Sender<ShellEvent>,
    rx: Receiver<ShellEvent>,
}

impl<W: Write> Console<W> {
    pub fn new(pipeline: Arc<BuildPipeline>, out: W) -> Self {
        let (tx, rx) = channel();
        Self {
            session: Session::new(pipeline),
            out,
            tx,
            rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn open(&mut self, path: PathBuf) -> io::Result<()> {
        let display = path.display().to_string();
        match self.dispatch(ShellEvent::LoadFile(path)) {
            Some(_) => {
                let lines = self.session.state().buffer().line_count();
                writeln!(self.out, "Opened {} ({} lines)", display, lines)
            }
            None => Ok(()),
        }
    }

    /// Read commands until `quit` or end of input.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> io::Result<()> {
        loop {
            eprint!("> ");
            io::stderr().flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (cmd, rest) = match line.split_once(char::is_whitespace) {
                Some((cmd, rest)) => (cmd, rest.trim()),
                None => (line, ""),
            };
            debug!(cmd, "console command");

            match cmd {
                "q" | "quit" | "exit" => break,
                "help" | "?" => writeln!(self.out, "{}", HELP)?,
                "new" => {
                    if self.dispatch(ShellEvent::NewFile).is_some() {
                        writeln!(self.out, "New file.")?;
                    }
                }
                "open" => match single_path(rest) {
                    Some(path) => self.open(path)?,
                    None => writeln!(self.out, "usage: open <path>")?,
                },
                "save" => {
                    let event = if rest.is_empty() {
                        ShellEvent::Save
                    } else {
                        match single_path(rest) {
                            Some(path) => ShellEvent::SaveAs(path),
                            None => {
                                writeln!(self.out, "usage: save [path]")?;
                                continue;
                            }
                        }
                    };
                    if let Some(Reaction::Saved(path)) = self.dispatch(event) {
                        writeln!(self.out, "Saved {}", path.display())?;
                    }
                }
                "show" => self.show()?,
                "append" => {
                    self.dispatch(ShellEvent::Edit(Edit::Append(rest.to_string())));
                }
                "insert" => {
                    let parsed = rest
                        .split_once(char::is_whitespace)
                        .and_then(|(n, text)| Some((line_index(n)?, text)));
                    match parsed {
                        Some((line, text)) => {
                            self.dispatch(ShellEvent::Edit(Edit::InsertLine {
                                line,
                                text: text.to_string(),
                            }));
                        }
                        None => writeln!(self.out, "usage: insert <line> <text>")?,
                    }
                }
                "delete" => match line_index(rest) {
                    Some(line) => {
                        self.dispatch(ShellEvent::Edit(Edit::DeleteLine(line)));
                    }
                    None => writeln!(self.out, "usage: delete <line>")?,
                },
                "compile" => self.build(false)?,
                "run" => self.build(true)?,
                "log" => {
                    for line in self.session.state().output().lines() {
                        writeln!(self.out, "{}", line)?;
                    }
                }
                _ => writeln!(self.out, "Unknown command: {} (try 'help')", cmd)?,
            }
        }

        Ok(())
    }

    fn show(&mut self) -> io::Result<()> {
        let buffer = self.session.state().buffer();
        let name = buffer
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<untitled>".to_string());
        let marker = if buffer.is_modified() { " [modified]" } else { "" };
        writeln!(self.out, "--- {}{}", name, marker)?;
        for (i, line) in buffer.text().lines().enumerate() {
            writeln!(self.out, "{:>4} | {}", i + 1, line)?;
        }
        Ok(())
    }

    /// Start a build and stream its output until it finishes.
    fn build(&mut self, run_after_compile: bool) -> io::Result<()> {
        let Some(Reaction::BuildStarted { build, .. }) =
            self.dispatch(ShellEvent::StartBuild { run_after_compile })
        else {
            return Ok(());
        };

        loop {
            let event = match self.rx.recv() {
                Ok(event) => event,
                Err(_) => {
                    warn!(%build, "build channel closed before the build finished");
                    return Ok(());
                }
            };

            match self.dispatch(event) {
                Some(Reaction::OutputAppended { lines, .. }) => {
                    for line in lines {
                        writeln!(self.out, "{}", line)?;
                    }
                }
                Some(Reaction::BuildFinished { build: done, summary }) if done == build => {
                    let status = if summary.success { "succeeded" } else { "failed" };
                    writeln!(self.out, "[build {} {}]", build, status)?;
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    /// Apply an event, printing any error. Returns the reaction on success.
    fn dispatch(&mut self, event: ShellEvent) -> Option<Reaction> {
        let tx = self.tx.clone();
        let emit = move |event| {
            let _ = tx.send(event);
        };
        match self.session.dispatch(event, emit) {
            Ok(reaction) => Some(reaction),
            Err(e) => {
                let _ = writeln!(self.out, "error: {}", e);
                None
            }
        }
    }
}

/// Parse one path argument, honouring shell-style quotes.
fn single_path(rest: &str) -> Option<PathBuf> {
    let mut parts = shlex::split(rest)?;
    if parts.len() != 1 {
        return None;
    }
    parts.pop().map(PathBuf::from)
}

/// 1-based line number typed by the user to a 0-based index.
fn line_index(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok()?.checked_sub(1)
}
