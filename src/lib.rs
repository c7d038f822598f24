pub mod buffer;
pub mod config;
pub mod console;
pub mod host;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod shell;
