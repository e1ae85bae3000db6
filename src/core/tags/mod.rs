//! core/tags/mod.rs
//!
//! Tag reading for the scan service.
//! Public API:
//! - [`Inspector`] turns one file handle into at most one encoded record.
//! - [`encode_record`] formats a [`TagRecord`](super::types::TagRecord) as a response line.
//! - [`read_cover_art`] pulls the first embedded picture out of one file handle.

mod art;
mod encode;
mod read;
mod util;

pub use art::{Picture, TagContainer, read_cover_art};
pub use encode::{DELIMITER, FINISHED, encode_record};
pub use read::{Inspector, LOW_BITRATE_KBPS};
