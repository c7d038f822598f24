//! Event-driven shell state shared by the console and host front ends.

mod state;
mod worker;

pub use state::{BuildId, BuildSummary, Reaction, ShellError, ShellEvent, ShellState};
pub use worker::spawn_build;

use crate::pipeline::BuildPipeline;
use std::sync::Arc;

/// Shell state plus the pipeline its builds run on.
pub struct Session {
    state: ShellState,
    pipeline: Arc<BuildPipeline>,
}

impl Session {
    pub fn new(pipeline: Arc<BuildPipeline>) -> Self {
        Self {
            state: ShellState::new(),
            pipeline,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn is_building(&self) -> bool {
        self.state.build_in_flight().is_some()
    }

    /// Apply `event`; an accepted build request is started in the background
    /// and reports back through `emit`.
    pub fn dispatch<F>(&mut self, event: ShellEvent, emit: F) -> Result<Reaction, ShellError>
    where
        F: Fn(ShellEvent) + Send + 'static,
    {
        let reaction = self.state.apply(event)?;
        if let Reaction::BuildStarted { build, request } = &reaction {
            spawn_build(self.pipeline.clone(), *build, request.clone(), emit);
        }
        Ok(reaction)
    }
}
