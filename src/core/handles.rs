//! core/handles.rs
//! Turning a host file handle into something we can read.
//!
//! The host opens files and hands us descriptor numbers. We never close the
//! host's descriptor: every read goes through a fresh open (or a dup).

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;

use super::types::FileTask;

/// Where file handles come from.
///
/// The service uses [`ProcessHandles`]; tests and tools that work with plain
/// paths use [`PathTable`].
pub trait HandleSource: Send + Sync {
    /// Open the file behind `task` for reading, independent of the host's handle.
    fn open(&self, task: FileTask) -> io::Result<File>;

    /// Best-effort path of the file behind `task` (used for extension hints).
    fn resolve_path(&self, task: FileTask) -> Option<PathBuf>;
}

/// Descriptors shared with the host through this process's descriptor table.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessHandles;

impl ProcessHandles {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn proc_link(task: FileTask) -> PathBuf {
        PathBuf::from(format!("/proc/self/fd/{}", task.fd()))
    }
}

impl HandleSource for ProcessHandles {
    fn open(&self, task: FileTask) -> io::Result<File> {
        if task.fd() < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("negative file handle {task}"),
            ));
        }

        // A fresh open gets its own file offset, so concurrent readers of the
        // same descriptor (cover art vs. scan) never fight over seeks.
        #[cfg(any(target_os = "linux", target_os = "android"))]
        if let Ok(file) = File::open(Self::proc_link(task)) {
            return Ok(file);
        }

        dup_handle(task)
    }

    fn resolve_path(&self, task: FileTask) -> Option<PathBuf> {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            if task.fd() < 0 {
                return None;
            }
            std::fs::read_link(Self::proc_link(task)).ok()
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            let _ = task;
            None
        }
    }
}

#[cfg(unix)]
fn dup_handle(task: FileTask) -> io::Result<File> {
    use std::os::fd::FromRawFd;

    // SAFETY: dup() either fails or returns a new descriptor that nobody else owns.
    let fd = unsafe { libc::dup(task.fd()) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: `fd` was just created above and ownership moves into the File.
    Ok(unsafe { File::from_raw_fd(fd) })
}

#[cfg(not(unix))]
fn dup_handle(task: FileTask) -> io::Result<File> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("file handle {task} cannot be shared on this platform"),
    ))
}

/// Handle ids mapped to plain paths.
///
/// Useful when the "host" is a test or a CLI that has paths rather than
/// inherited descriptors.
#[derive(Debug, Default, Clone)]
pub struct PathTable {
    paths: HashMap<i32, PathBuf>,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: i32, path: impl Into<PathBuf>) {
        self.paths.insert(id, path.into());
    }

    pub fn with(mut self, id: i32, path: impl Into<PathBuf>) -> Self {
        self.insert(id, path);
        self
    }
}

impl HandleSource for PathTable {
    fn open(&self, task: FileTask) -> io::Result<File> {
        let path = self.paths.get(&task.fd()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("unknown file handle {task}"))
        })?;
        File::open(path)
    }

    fn resolve_path(&self, task: FileTask) -> Option<PathBuf> {
        self.paths.get(&task.fd()).cloned()
    }
}
