//! core/tags/encode.rs
//! TagRecord -> one response line.
//!
//! Line format (no trailing newline; the response channel adds it):
//! `FD=12|*|ARTIST=a|*|ALBUM=b|*|TITLE=c|*|TRACK=1|*|LENGTH=1000`
//! or just `FD=12` for a minimal record.

use std::fmt::Write as _;

use super::super::types::TagRecord;
use super::util::clean_field;

/// Separates fields inside one record.
pub const DELIMITER: &str = "|*|";

/// Batch terminator on the response side, shutdown marker on the request side.
pub const FINISHED: &str = "~";

pub fn encode_record(record: &TagRecord) -> String {
    let mut line = format!("FD={}", record.fd);

    let Some(fields) = &record.fields else {
        return line;
    };

    // Writing into a String cannot fail.
    let _ = write!(
        line,
        "{DELIMITER}ARTIST={}{DELIMITER}ALBUM={}{DELIMITER}TITLE={}{DELIMITER}TRACK={}",
        clean_field(&fields.artist),
        clean_field(&fields.album),
        clean_field(&fields.title),
        fields.track,
    );

    if let Some(ms) = fields.length_ms {
        let _ = write!(line, "{DELIMITER}LENGTH={ms}");
    }

    line
}
