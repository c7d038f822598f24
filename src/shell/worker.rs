use super::state::{BuildId, ShellEvent};
use crate::output::OutputSink;
use crate::pipeline::{BuildPipeline, BuildRequest};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Forwards pipeline output as shell events tagged with the build id.
struct EventSink<'a, F> {
    build: BuildId,
    emit: &'a F,
}

impl<F> OutputSink for EventSink<'_, F>
where
    F: Fn(ShellEvent),
{
    fn clear(&mut self) {
        (self.emit)(ShellEvent::ClearOutput { build: self.build });
    }

    fn append(&mut self, text: &str) {
        (self.emit)(ShellEvent::AppendOutput {
            build: self.build,
            text: text.to_string(),
        });
    }
}

/// Run one build on a background thread.
///
/// Progress and the final `BuildFinished` event are handed to `emit`; the
/// caller applies them on the thread that owns the shell state.
pub fn spawn_build<F>(
    pipeline: Arc<BuildPipeline>,
    build: BuildId,
    request: BuildRequest,
    emit: F,
) -> JoinHandle<()>
where
    F: Fn(ShellEvent) + Send + 'static,
{
    thread::spawn(move || {
        debug!(%build, "build thread started");
        let mut sink = EventSink { build, emit: &emit };
        let outcome = pipeline.execute(&request, &mut sink);
        emit(ShellEvent::BuildFinished { build, outcome });
        debug!(%build, "build thread exiting");
    })
}
