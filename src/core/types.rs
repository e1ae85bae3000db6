//! Core data types shared between the pool, the inspector and the dispatcher.
//!
//! Rule of thumb:
//! - These structs should be "boring bags of data"
//! - No channel code
//! - No thread code
//! - No tag parsing code
//!
//! 'TagRecord' represents ONE inspected file handle plus the metadata the host cares about.

use std::fmt;

/// One file handle supplied by the host.
///
/// The id is opaque to us: it is only meaningful inside the host's process
/// (which shares its descriptor table with ours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileTask(pub i32);

impl FileTask {
    pub fn fd(self) -> i32 {
        self.0
    }
}

impl fmt::Display for FileTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag fields read from a file that decoded successfully.
///
/// Text fields are empty strings when the tag does not carry them,
/// and `track` is 0 when there is no track number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFields {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub track: u32,

    /// Only present when the stream looks like it under-reports its duration
    /// (see the low-bitrate check in the inspector). Milliseconds.
    pub length_ms: Option<u64>,
}

/// Result for one inspected file handle.
///
/// - `fields: Some(..)` = full record
/// - `fields: None` = minimal record: "probably audio, tags unavailable"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub fd: FileTask,
    pub fields: Option<TagFields>,
}

impl TagRecord {
    pub fn full(fd: FileTask, fields: TagFields) -> Self {
        Self {
            fd,
            fields: Some(fields),
        }
    }

    pub fn minimal(fd: FileTask) -> Self {
        Self { fd, fields: None }
    }
}
