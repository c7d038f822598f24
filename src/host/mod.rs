//! Headless protocol for an external editor surface.
//!
//! Frames are `Content-Length: N\r\n\r\n<json>` on stdin/stdout, so all
//! diagnostics must go to stderr or the log file.

mod protocol;
mod server;

use crate::pipeline::BuildPipeline;
use std::io::{self, BufReader};
use std::sync::Arc;
use tracing::info;

pub use protocol::{read_message, write_message, HostMessage, HostMessageContent, ProtocolError};
pub use server::HostServer;

pub fn run_host_mode(pipeline: Arc<BuildPipeline>) -> Result<(), ProtocolError> {
    info!("host mode starting");
    let server = HostServer::new(pipeline, io::stdout());
    server.serve(BufReader::new(io::stdin()))
}
