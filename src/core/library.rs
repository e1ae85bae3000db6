//! core/library.rs
//! Recognized audio file extensions.
//!
//! Only used as a heuristic when a file fails to decode: a handle whose path
//! ends in one of these still gets a minimal record.

use std::path::Path;

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "ogg", "flac", "mpc", "wv", "spx", "opus", "tta", // Xiph / misc lossless
    "m4a", "m4r", "m4b", "m4p", "mp4", "3g2", "m4v", // MP4 family
    "wma", "asf", // ASF
    "aif", "aiff", "afc", "aifc", // AIFF family
    "wav", "ape", // PCM / Monkey's Audio
    "mod", "s3m", "it", "xm", // trackers
];

/// Case-insensitive check against the allow-list. `ext` has no leading dot.
pub fn is_audio_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Does the file name at `path` end in a recognized audio extension?
///
/// Extension = everything after the last '.', so "song.tar.mp3" counts
/// and "mp3" (no dot) does not.
pub fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(is_audio_extension)
        .unwrap_or(false)
}
