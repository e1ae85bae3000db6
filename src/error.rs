//! Error types for tagscan
//!
//! Only setup and infrastructure failures live here. Per-file decode
//! problems never become a `ServiceError`; the inspector absorbs them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// No `pipe=` entry in the argument string
    #[error("no named pipe path given (expected a `pipe=<path>` line)")]
    MissingChannelPath,

    /// The pipe exists but we may not read/write it
    #[error("can't access named pipe {}: {source}", .path.display())]
    ChannelAccess { path: PathBuf, source: io::Error },

    /// The pipe was missing and mkfifo failed
    #[error("can't create named pipe {}: {source}", .path.display())]
    ChannelCreate { path: PathBuf, source: io::Error },

    /// Reading a request or opening a response stream failed mid-run
    #[error("channel I/O error: {0}")]
    ChannelIo(#[source] io::Error),

    /// Argument string or CLI value out of range / unparsable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// A worker thread exited while the dispatcher was waiting on it
    #[error("worker {0} stopped unexpectedly")]
    WorkerLost(usize),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
