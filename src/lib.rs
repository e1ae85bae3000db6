//! tagscan
//!
//! # What this is
//! An embedded worker service that a host process starts to read audio tags
//! from files the host has already opened. The host writes batches of file
//! handle ids into a named pipe ("12,14,17"); we answer with one line per
//! audio file, then a `~` line when the batch is done. A request ending in
//! `~` ("12,14~") means "answer this batch, then shut down".
//!
//! # Entry points
//! - [`get_tag_info`] runs the service until the host asks it to stop and
//!   reports setup failures as a string (empty string = clean shutdown)
//! - [`get_cover_art`] is a one-off, synchronous cover art lookup
//! - [`serve`] runs the same protocol over any [`Transport`]
//!
//! # Concurrency model
//! - A small fixed pool of worker threads drains a shared queue per batch.
//! - The dispatcher waits for every worker before it writes the terminator,
//!   so nothing from batch k+1 can land before batch k's `~`.

pub mod config;
pub mod core;
pub mod error;

use std::sync::Arc;

use tracing::{error, info};

use crate::core::pool::NUM_WORKERS;

pub use crate::config::ServiceConfig;
pub use crate::core::dispatch::{Dispatcher, Request};
pub use crate::core::handles::{HandleSource, PathTable, ProcessHandles};
pub use crate::core::tags::Inspector;
pub use crate::core::transport::{NamedPipe, StdioTransport, Transport};
pub use crate::core::types::{FileTask, TagFields, TagRecord};
pub use crate::error::{Result, ServiceError};

/// Run the batch protocol over `transport` with handles from `handles`
/// until the host asks us to stop. Every worker is joined before this returns.
pub fn serve<T: Transport>(transport: T, handles: Arc<dyn HandleSource>) -> Result<()> {
    let inspector = Inspector::new(handles);
    let mut dispatcher = Dispatcher::new(transport, NUM_WORKERS, Arc::new(inspector))?;
    dispatcher.run()
}

/// Prepare the named pipe and serve the host's own file handles.
///
/// The pipe is checked (and created if missing) before any worker starts,
/// so a setup failure leaves nothing running.
pub fn run_service(config: &ServiceConfig) -> Result<()> {
    let pipe = NamedPipe::prepare(&config.pipe_path)?;
    info!(pipe = %pipe.path().display(), workers = NUM_WORKERS, "tag service starting");
    serve(pipe, Arc::new(ProcessHandles))
}

/// Host entry call.
///
/// `args` is the host's `key=value` argument string (see [`ServiceConfig`]).
/// Returns an empty string after a clean shutdown, otherwise a description of
/// what went wrong.
pub fn get_tag_info(args: &str) -> String {
    match ServiceConfig::from_arg_string(args).and_then(|config| run_service(&config)) {
        Ok(()) => String::new(),
        Err(e) => {
            error!(error = %e, "tag service failed");
            e.to_string()
        }
    }
}

/// Raw bytes of the first embedded picture in the host file `fd`, or empty.
pub fn get_cover_art(fd: i32) -> Vec<u8> {
    crate::core::tags::read_cover_art(&ProcessHandles, FileTask(fd))
}
