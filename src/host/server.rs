use super::protocol::{read_message, write_message, HostMessage, HostMessageContent, ProtocolError};
use crate::buffer::Edit;
use crate::pipeline::BuildPipeline;
use crate::shell::{Reaction, Session, ShellError, ShellEvent};
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Everything the server thread reacts to, in arrival order.
enum HostInput {
    Message(HostMessage),
    Shell(ShellEvent),
    Closed,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Result of one request handler: response body or failure message.
type Handled = Result<Option<Value>, String>;

pub struct HostServer<W: Write> {
    seq: u64,
    writer: W,
    session: Session,
    tx: Sender<HostInput>,
    rx: Receiver<HostInput>,
}

impl<W: Write> HostServer<W> {
    pub fn new(pipeline: Arc<BuildPipeline>, writer: W) -> Self {
        let (tx, rx) = channel();
        Self {
            seq: 0,
            writer,
            session: Session::new(pipeline),
            tx,
            rx,
        }
    }

    /// Serve requests from `reader` until `disconnect` or end of input.
    ///
    /// A build still running when input ends, or when the client can no
    /// longer be written to, is allowed to finish before returning so its
    /// staged files are removed.
    pub fn serve<R>(mut self, reader: R) -> Result<(), ProtocolError>
    where
        R: BufRead + Send + 'static,
    {
        spawn_reader(reader, self.tx.clone());

        let mut closing = false;
        let mut failure: Option<ProtocolError> = None;
        while let Ok(input) = self.rx.recv() {
            let handled = match input {
                HostInput::Message(msg) if failure.is_none() => {
                    self.handle_message(msg).map(|flow| flow == Flow::Stop)
                }
                HostInput::Message(_) => Ok(false),
                HostInput::Shell(event) => self.handle_shell_event(event).map(|_| false),
                HostInput::Closed => {
                    debug!("input closed");
                    Ok(true)
                }
            };

            match handled {
                Ok(stop) => closing |= stop,
                Err(e) => {
                    if failure.is_none() {
                        warn!(error = %e, "host output failed");
                        failure = Some(e);
                    }
                    closing = true;
                }
            }

            if closing && !self.session.is_building() {
                break;
            }
        }

        info!("host session ended");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn send_response(
        &mut self,
        request_seq: u64,
        command: &str,
        result: Handled,
    ) -> Result<(), ProtocolError> {
        let (success, message, body) = match result {
            Ok(body) => (true, None, body),
            Err(message) => (false, Some(message), None),
        };
        let msg = HostMessage {
            seq: self.next_seq(),
            content: HostMessageContent::Response {
                request_seq,
                success,
                command: command.to_string(),
                message,
                body,
            },
        };
        write_message(&mut self.writer, &msg)
    }

    fn send_event(&mut self, event: &str, body: Option<Value>) -> Result<(), ProtocolError> {
        let msg = HostMessage {
            seq: self.next_seq(),
            content: HostMessageContent::Event {
                event: event.to_string(),
                body,
            },
        };
        write_message(&mut self.writer, &msg)
    }

    fn handle_message(&mut self, msg: HostMessage) -> Result<Flow, ProtocolError> {
        let HostMessageContent::Request { command, arguments } = msg.content else {
            debug!(seq = msg.seq, "ignoring non-request message");
            return Ok(Flow::Continue);
        };
        debug!(seq = msg.seq, %command, "request");

        let result = match command.as_str() {
            "initialize" => {
                self.send_response(
                    msg.seq,
                    &command,
                    Ok(Some(json!({
                        "supportsCompile": true,
                        "supportsRun": true,
                        "supportsCancel": false,
                    }))),
                )?;
                self.send_event("initialized", None)?;
                return Ok(Flow::Continue);
            }
            "newFile" => self.apply(ShellEvent::NewFile).map(|_| None),
            "openFile" => self.handle_open(arguments.as_ref()),
            "saveFile" => self.handle_save(arguments.as_ref()),
            "getText" => Ok(Some(self.text_body())),
            "setText" => match string_arg(arguments.as_ref(), "text") {
                Ok(text) => self.apply(ShellEvent::Edit(Edit::ReplaceAll(text))).map(|_| None),
                Err(e) => Err(e),
            },
            "compile" => return self.handle_build(msg.seq, &command, false),
            "run" => return self.handle_build(msg.seq, &command, true),
            "getOutput" => {
                let state = self.session.state();
                Ok(Some(json!({
                    "lines": state.output().lines(),
                    "building": state.build_in_flight().map(|b| b.0),
                })))
            }
            "disconnect" => {
                self.send_response(msg.seq, &command, Ok(None))?;
                return Ok(Flow::Stop);
            }
            other => {
                warn!(command = other, "unhandled host command");
                Err(format!("unknown command '{}'", other))
            }
        };

        self.send_response(msg.seq, &command, result)?;
        Ok(Flow::Continue)
    }

    fn handle_open(&mut self, arguments: Option<&Value>) -> Handled {
        let path = PathBuf::from(string_arg(arguments, "path")?);
        self.apply(ShellEvent::LoadFile(path))?;
        Ok(Some(self.text_body()))
    }

    fn handle_save(&mut self, arguments: Option<&Value>) -> Handled {
        let event = match optional_string_arg(arguments, "path") {
            Some(path) => ShellEvent::SaveAs(PathBuf::from(path)),
            None => ShellEvent::Save,
        };
        match self.apply(event)? {
            Reaction::Saved(path) => Ok(Some(json!({ "path": path.display().to_string() }))),
            _ => Ok(None),
        }
    }

    fn handle_build(
        &mut self,
        seq: u64,
        command: &str,
        run_after_compile: bool,
    ) -> Result<Flow, ProtocolError> {
        let tx = self.tx.clone();
        let emit = move |event| {
            let _ = tx.send(HostInput::Shell(event));
        };

        match self
            .session
            .dispatch(ShellEvent::StartBuild { run_after_compile }, emit)
        {
            Ok(Reaction::BuildStarted { build, .. }) => {
                self.send_response(seq, command, Ok(Some(json!({ "build": build.0 }))))?;
                self.send_event(
                    "buildStarted",
                    Some(json!({ "build": build.0, "run": run_after_compile })),
                )?;
            }
            Ok(_) => self.send_response(seq, command, Ok(None))?,
            Err(e) => self.send_response(seq, command, Err(e.to_string()))?,
        }
        Ok(Flow::Continue)
    }

    fn handle_shell_event(&mut self, event: ShellEvent) -> Result<(), ProtocolError> {
        match self.session.dispatch(event, |_| {}) {
            Ok(Reaction::OutputCleared { build }) => {
                self.send_event("outputCleared", Some(json!({ "build": build.0 })))
            }
            Ok(Reaction::OutputAppended { build, lines }) => {
                self.send_event("output", Some(json!({ "build": build.0, "lines": lines })))
            }
            Ok(Reaction::BuildFinished { build, summary }) => self.send_event(
                "buildFinished",
                Some(json!({
                    "build": build.0,
                    "success": summary.success,
                    "message": summary.message,
                })),
            ),
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "failed to apply build event");
                Ok(())
            }
        }
    }

    fn apply(&mut self, event: ShellEvent) -> Result<Reaction, String> {
        self.session
            .dispatch(event, |_| {})
            .map_err(|e: ShellError| e.to_string())
    }

    fn text_body(&self) -> Value {
        let buffer = self.session.state().buffer();
        json!({
            "text": buffer.text(),
            "path": buffer.path().map(|p| p.display().to_string()),
            "modified": buffer.is_modified(),
        })
    }
}

/// Tells the server that input is over, however the reader thread exits.
struct CloseOnDrop(Sender<HostInput>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        let _ = self.0.send(HostInput::Closed);
    }
}

fn spawn_reader<R>(mut reader: R, tx: Sender<HostInput>)
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let guard = CloseOnDrop(tx);
        loop {
            match read_message(&mut reader) {
                Ok(Some(msg)) => {
                    if guard.0.send(HostInput::Message(msg)).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(ProtocolError::Io(e)) => {
                    warn!(error = %e, "host input failed");
                    break;
                }
                Err(e) => warn!(error = %e, "skipping bad frame"),
            }
        }
    });
}

fn string_arg(arguments: Option<&Value>, key: &str) -> Result<String, String> {
    optional_string_arg(arguments, key).ok_or_else(|| format!("missing argument '{}'", key))
}

fn optional_string_arg(arguments: Option<&Value>, key: &str) -> Option<String> {
    arguments
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
}
