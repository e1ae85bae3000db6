//! core/transport.rs
//! How requests reach us and how responses leave.
//!
//! The real host talks over a named pipe (FIFO) that both sides open and
//! close once per direction per request. The CLI can also run over
//! stdin/stdout for manual poking.

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, ServiceError};

/// A duplex, request/response channel to the host.
pub trait Transport {
    /// Block until the next request line arrives.
    ///
    /// `Ok(None)` means the host is gone for good; treat it like a shutdown.
    fn next_request(&mut self) -> Result<Option<String>>;

    /// Open the response stream for the batch about to run. Dropping the
    /// returned writer ends the batch from the host's point of view.
    fn open_response(&mut self) -> Result<Box<dyn Write + Send>>;
}

/// The host's named pipe.
#[derive(Debug, Clone)]
pub struct NamedPipe {
    path: PathBuf,
}

impl NamedPipe {
    /// Make sure the pipe exists and is usable, creating it if missing.
    ///
    /// Anything else wrong with the path (permissions, a dangling parent
    /// directory, ...) is a setup failure.
    pub fn prepare(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cpath = c_path(&path)?;

        // SAFETY: `cpath` is a valid NUL-terminated string for the duration of the call.
        if unsafe { libc::access(cpath.as_ptr(), libc::R_OK | libc::W_OK) } != 0 {
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::NotFound {
                return Err(ServiceError::ChannelAccess { path, source: err });
            }

            // SAFETY: as above; mode bits are a plain integer.
            if unsafe { libc::mkfifo(cpath.as_ptr(), 0o666) } != 0 {
                let err = io::Error::last_os_error();
                return Err(ServiceError::ChannelCreate { path, source: err });
            }
            info!(path = %path.display(), "created named pipe");
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn c_path(path: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;

    CString::new(path.as_os_str().as_bytes()).map_err(|_| ServiceError::ChannelAccess {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"),
    })
}

impl Transport for NamedPipe {
    fn next_request(&mut self) -> Result<Option<String>> {
        // Blocks until the host opens its write end.
        let reader = File::open(&self.path).map_err(ServiceError::ChannelIo)?;
        let mut line = String::new();
        BufReader::new(reader)
            .read_line(&mut line)
            .map_err(ServiceError::ChannelIo)?;
        debug!(bytes = line.len(), "request received");

        // An empty read is an empty batch, not a hang-up: the host reopens per request.
        Ok(Some(line))
    }

    fn open_response(&mut self) -> Result<Box<dyn Write + Send>> {
        // Blocks until the host opens its read end.
        let writer = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(ServiceError::ChannelIo)?;
        Ok(Box::new(writer))
    }
}

/// Requests on stdin, one per line; responses on stdout.
#[derive(Debug, Default)]
pub struct StdioTransport;

impl Transport for StdioTransport {
    fn next_request(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(ServiceError::ChannelIo)?;
        Ok((read > 0).then_some(line))
    }

    fn open_response(&mut self) -> Result<Box<dyn Write + Send>> {
        Ok(Box::new(io::stdout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::FileTypeExt;

    #[test]
    fn test_prepare_creates_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagpipe");

        let pipe = NamedPipe::prepare(&path).unwrap();
        assert_eq!(pipe.path(), path.as_path());
        assert!(std::fs::metadata(&path).unwrap().file_type().is_fifo());

        // second call finds the existing pipe
        NamedPipe::prepare(&path).unwrap();
    }

    #[test]
    fn test_prepare_fails_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("tagpipe");

        let err = NamedPipe::prepare(&path).unwrap_err();
        assert!(matches!(err, ServiceError::ChannelCreate { .. }));
        assert!(err.to_string().contains("can't create named pipe"));
    }

    #[test]
    fn test_prepare_rejects_nul_in_path() {
        let err = NamedPipe::prepare("bad\0path").unwrap_err();
        assert!(matches!(err, ServiceError::ChannelAccess { .. }));
    }
}
